//! Probe command - check whether a process is alive on this host.

use anyhow::Result;
use jobwarden_core::ProcessState;
use serde::Serialize;

use super::{agent, print_json};
use crate::GlobalArgs;

#[derive(Serialize)]
struct ProbeOutput {
    pid: i32,
    state: ProcessState,
}

pub async fn run(global: &GlobalArgs, pid: i32) -> Result<()> {
    let agent = agent(global).await?;
    let state = agent.probe(pid).await?;

    if global.json {
        return print_json(&ProbeOutput { pid, state });
    }

    match state {
        ProcessState::Alive => println!("Process {} is alive", pid),
        ProcessState::NotFound => println!("Process {} not found", pid),
    }
    Ok(())
}
