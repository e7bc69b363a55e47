//! Job termination use case.

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::domain::{JobId, KillOutcome};
use crate::error::{Error, Result};
use crate::ports::{JobRecordLookup, ProcessProbe, ProcessState, ProcessTerminator, Termination};

/// Terminates jobs that were launched on this host.
///
/// A kill request is checked in a fixed order, and each step can settle the
/// outcome without touching the OS:
/// 1. job id is well formed
/// 2. a record exists for it
/// 3. the record has no exit code yet
/// 4. the record names this host
/// 5. the record carries a usable pid
/// 6. the process is still alive
///
/// Only then is the terminator invoked, on a task of its own so that a
/// cancelled caller cannot leave a half-sent signal behind.
pub struct JobKillService<L, P, T> {
    hostname: String,
    lookup: L,
    probe: Arc<P>,
    terminator: Arc<T>,
}

impl<L, P, T> JobKillService<L, P, T>
where
    L: JobRecordLookup,
    P: ProcessProbe,
    T: ProcessTerminator + 'static,
{
    pub fn new(hostname: impl Into<String>, lookup: L, probe: Arc<P>, terminator: Arc<T>) -> Self {
        Self {
            hostname: hostname.into(),
            lookup,
            probe,
            terminator,
        }
    }

    /// The host name this service accepts jobs for.
    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    pub fn lookup(&self) -> &L {
        &self.lookup
    }

    /// Kill the job identified by `job_id`.
    pub async fn kill_job(&self, job_id: &str) -> Result<KillOutcome> {
        let job_id = JobId::parse(job_id)?;
        let record = self.lookup.job_record(&job_id).await?;

        if record.is_finished() {
            info!(
                job_id = %job_id,
                exit_code = record.exit_code,
                "Job already finished, nothing to kill"
            );
            return Ok(KillOutcome::AlreadyFinished);
        }

        if !record.is_owned_by(&self.hostname) {
            warn!(
                job_id = %job_id,
                owner = %record.hostname,
                host = %self.hostname,
                "Refusing to kill job owned by another host"
            );
            return Err(Error::NotOwnedByHost {
                job_id: job_id.to_string(),
                owner: record.hostname,
                host: self.hostname.clone(),
            });
        }

        let pid = match record.process_id {
            Some(pid) if pid > 1 => pid,
            Some(pid) => {
                warn!(job_id = %job_id, pid, "Job record carries an unusable process id");
                return Err(Error::Precondition(format!(
                    "job {} records process id {}, which cannot be signalled",
                    job_id, pid
                )));
            }
            None => {
                warn!(job_id = %job_id, "Running job has no process id");
                return Err(Error::MissingProcessId(job_id.to_string()));
            }
        };

        match self.probe.probe(pid).await {
            Ok(ProcessState::Alive) => {}
            Ok(ProcessState::NotFound) => {
                info!(job_id = %job_id, pid, "Process already exited before kill");
                return Ok(KillOutcome::RaceLostAlreadyFinished);
            }
            Err(e) => {
                error!(job_id = %job_id, pid, error = %e, "Process probe failed");
                return Err(e.into());
            }
        }

        let terminator = Arc::clone(&self.terminator);
        let termination = tokio::spawn(async move { terminator.terminate(pid).await })
            .await
            .map_err(|e| Error::Server(format!("terminate task for process {} failed: {}", pid, e)))?;

        match termination {
            Ok(Termination::Signalled) => {
                info!(job_id = %job_id, pid, "Job killed");
                Ok(KillOutcome::Killed)
            }
            Ok(Termination::AlreadyGone) => {
                info!(job_id = %job_id, pid, "Process exited while being killed");
                Ok(KillOutcome::RaceLostAlreadyFinished)
            }
            Err(e) => {
                error!(job_id = %job_id, pid, error = %e, "Failed to kill job");
                Err(e.into())
            }
        }
    }
}
