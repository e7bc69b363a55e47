//! Status command - show the bindings the agent makes at startup.

use anyhow::Result;

use super::{agent, print_json};
use crate::GlobalArgs;

pub async fn run(global: &GlobalArgs) -> Result<()> {
    let agent = agent(global).await?;
    let status = agent.status();

    if global.json {
        return print_json(&status);
    }

    println!("{:<18} {}", "Hostname:", status.hostname);
    println!("{:<18} {:?}", "Process control:", status.process_control);
    println!("{:<18} {}", "Archival backend:", status.archival_backend);
    println!(
        "{:<18} {}",
        "Job records:",
        agent.job_records().path().display()
    );
    Ok(())
}
