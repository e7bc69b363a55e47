//! Archive command - upload a finished job's output directory.

use std::path::PathBuf;

use anyhow::Result;
use jobwarden_core::{ArchivalTarget, JobId, ObjectUri};

use super::{agent, print_json};
use crate::GlobalArgs;

pub async fn run(global: &GlobalArgs, job_id: &str, source: PathBuf, destination: &str) -> Result<()> {
    let job_id = JobId::parse(job_id)?;
    let destination = ObjectUri::parse(destination)?;
    let agent = agent(global).await?;

    let report = agent
        .archive(ArchivalTarget::new(job_id, source, destination.clone()))
        .await?;

    if global.json {
        return print_json(&report);
    }

    if report.skipped {
        println!("Archival is disabled; nothing was uploaded.");
    } else {
        println!(
            "Uploaded {} files ({} bytes) to {}",
            report.files_uploaded, report.bytes_uploaded, destination
        );
    }
    Ok(())
}
