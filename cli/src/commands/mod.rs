pub mod archive;
pub mod config;
pub mod kill;
pub mod probe;
pub mod status;

use anyhow::Result;
use jobwarden_core::adapters::JsonJobRecordStore;
use jobwarden_core::{Agent, AgentConfig, ConfigStore};

use crate::GlobalArgs;

/// The config store selected by `--config`.
pub fn config_store(global: &GlobalArgs) -> Result<ConfigStore> {
    Ok(match &global.config {
        Some(path) => ConfigStore::with_path(path.clone()),
        None => ConfigStore::new()?,
    })
}

/// Load the config and apply command-line overrides.
pub async fn load_config(global: &GlobalArgs) -> Result<AgentConfig> {
    let mut config = config_store(global)?.load().await?;
    if let Some(hostname) = &global.hostname {
        config.hostname = Some(hostname.clone());
    }
    if let Some(records) = &global.records {
        config.records_file = Some(records.clone());
    }
    Ok(config)
}

/// Start an agent reading job records from the configured records file.
pub async fn agent(global: &GlobalArgs) -> Result<Agent<JsonJobRecordStore>> {
    let config = load_config(global).await?;
    let records = JsonJobRecordStore::with_path(config.records_path()?);
    Ok(Agent::bootstrap(config, records).await?)
}

pub fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
