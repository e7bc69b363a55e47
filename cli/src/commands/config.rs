//! Config command - inspect and initialise the agent configuration.

use anyhow::{bail, Result};
use jobwarden_core::AgentConfig;

use super::{config_store, load_config, print_json};
use crate::GlobalArgs;

pub async fn show(global: &GlobalArgs) -> Result<()> {
    let store = config_store(global)?;
    let config = load_config(global).await?;

    if global.json {
        return print_json(&config.redacted());
    }

    let archival = &config.archival;
    println!("Config file: {}", store.config_path().display());
    println!();
    println!(
        "Hostname:          {}",
        config.hostname.as_deref().unwrap_or("(OS host name)")
    );
    println!("Job records:       {}", config.records_path()?.display());
    println!(
        "Process control:   {:?} ({}, timeout {}ms)",
        config.process.control, config.process.signal, config.process.command_timeout_ms
    );
    println!("Archival enabled:  {}", archival.enabled);
    println!(
        "Region:            {}",
        match (&archival.region.static_region, archival.region.auto) {
            (Some(region), _) => region.clone(),
            (None, true) => "auto".to_string(),
            (None, false) => "default".to_string(),
        }
    );
    println!("Credentials:       {:?}", archival.credentials.source);
    println!(
        "Endpoint:          {}",
        archival.endpoint.as_deref().unwrap_or("(AWS)")
    );
    println!(
        "Upload pool:       core {}, max {}, queue {}",
        archival.pool.core_pool_size, archival.pool.max_pool_size, archival.pool.queue_capacity
    );
    Ok(())
}

pub fn path(global: &GlobalArgs) -> Result<()> {
    println!("{}", config_store(global)?.config_path().display());
    Ok(())
}

pub async fn init(global: &GlobalArgs, force: bool) -> Result<()> {
    let store = config_store(global)?;
    if store.config_path().exists() && !force {
        bail!(
            "{} already exists (use --force to overwrite)",
            store.config_path().display()
        );
    }

    store.save(&AgentConfig::default()).await?;
    println!("Wrote {}", store.config_path().display());
    Ok(())
}
