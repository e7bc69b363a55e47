//! JobWarden agent - wires configuration, adapters and services together.
//!
//! One `Agent` runs per execution host. It is built once at startup: the
//! process control mechanism and the archival backend are bound here and do
//! not change for the life of the agent.

use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use crate::adapters::archival::BoundArchivalBackend;
use crate::adapters::aws::{CredentialSource, EnvSource, RegionProvider};
use crate::adapters::process::ProcessControl;
use crate::application::{ArchivalBackendSelector, JobKillService};
use crate::config::{AgentConfig, ProcessControlKind};
use crate::domain::{ArchivalTarget, ArchiveReport, KillOutcome};
use crate::error::{Error, Result};
use crate::ports::{ArchivalBackend, JobRecordLookup, ProcessProbe, ProcessState};

/// Snapshot of what the agent bound at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentStatus {
    pub hostname: String,
    pub process_control: ProcessControlKind,
    pub archival_backend: &'static str,
}

/// The per-host supervision agent.
pub struct Agent<L> {
    config: AgentConfig,
    process: Arc<ProcessControl>,
    kill_service: JobKillService<L, ProcessControl, ProcessControl>,
    archival: BoundArchivalBackend,
}

impl<L: JobRecordLookup> Agent<L> {
    /// Build the agent from `config`, reading credentials and region from the
    /// process environment. Must be awaited within a Tokio runtime.
    pub async fn bootstrap(config: AgentConfig, lookup: L) -> Result<Self> {
        Self::bootstrap_with_env(config, lookup, EnvSource::process()).await
    }

    /// Like [`Agent::bootstrap`] with an explicit environment.
    pub async fn bootstrap_with_env(config: AgentConfig, lookup: L, env: EnvSource) -> Result<Self> {
        config.validate()?;

        let hostname = match &config.hostname {
            Some(name) => name.trim().to_string(),
            None => local_hostname()?,
        };

        let process = Arc::new(ProcessControl::from_settings(&config.process)?);
        let kill_service =
            JobKillService::new(hostname.clone(), lookup, Arc::clone(&process), Arc::clone(&process));

        // An invalid static region is fatal; every other archival problem
        // only downgrades to the no-op backend.
        let region = RegionProvider::from_settings(&config.archival.region, env.clone())?;
        let credentials = CredentialSource::from_settings(&config.archival.credentials, env);
        let archival = ArchivalBackendSelector::new(config.archival.clone(), region)
            .select(&credentials)
            .await;

        info!(
            hostname = %hostname,
            process_control = ?process.kind(),
            archival = archival.name(),
            "Agent started"
        );

        Ok(Self {
            config,
            process,
            kill_service,
            archival,
        })
    }

    /// Kill a job launched on this host.
    pub async fn kill_job(&self, job_id: &str) -> Result<KillOutcome> {
        self.kill_service.kill_job(job_id).await
    }

    /// Archive a finished job's output with the bound backend.
    pub async fn archive(&self, target: ArchivalTarget) -> Result<ArchiveReport> {
        self.archival.archive(target).await
    }

    /// Check whether `pid` is alive on this host.
    pub async fn probe(&self, pid: i32) -> Result<ProcessState> {
        if pid <= 0 {
            return Err(Error::Precondition(format!("{} is not a process id", pid)));
        }
        Ok(self.process.probe(pid).await?)
    }

    pub fn hostname(&self) -> &str {
        self.kill_service.hostname()
    }

    pub fn archival_backend(&self) -> &BoundArchivalBackend {
        &self.archival
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn job_records(&self) -> &L {
        self.kill_service.lookup()
    }

    pub fn status(&self) -> AgentStatus {
        AgentStatus {
            hostname: self.hostname().to_string(),
            process_control: self.process.kind(),
            archival_backend: self.archival.name(),
        }
    }
}

/// The OS host name.
#[cfg(unix)]
pub fn local_hostname() -> Result<String> {
    let name = nix::unistd::gethostname()
        .map_err(|e| Error::Config(format!("Could not determine host name: {}", e)))?;
    name.into_string()
        .map_err(|_| Error::Config("Host name is not valid UTF-8".to_string()))
}

/// The OS host name.
#[cfg(not(unix))]
pub fn local_hostname() -> Result<String> {
    std::env::var("COMPUTERNAME")
        .map_err(|_| Error::Config("Could not determine host name".to_string()))
}
