//! Kill command - terminate a job running on this host.

use anyhow::Result;
use jobwarden_core::KillReport;

use super::{agent, print_json};
use crate::GlobalArgs;

pub async fn run(global: &GlobalArgs, job_id: &str) -> Result<()> {
    let agent = agent(global).await?;
    let result = agent.kill_job(job_id).await;

    if global.json {
        print_json(&KillReport::from(&result))?;
    } else if let Ok(outcome) = &result {
        println!("Job {}: {}", job_id.trim(), outcome);
    }

    result?;
    Ok(())
}
