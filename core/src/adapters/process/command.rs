//! Process control through external commands.
//!
//! Uses the following system commands:
//! - `ps -p PID` to check if a process is running
//! - `kill -SIG PID` to deliver the termination signal

use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use std::time::Duration;

use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::config::{ProcessSettings, TerminationSignal};
use crate::error::ProcessError;
use crate::ports::{ProcessProbe, ProcessState, ProcessTerminator, Termination};

/// Shells out to `ps` and `kill`, bounding each invocation with a timeout.
#[derive(Debug, Clone)]
pub struct CommandProcessControl {
    ps_path: PathBuf,
    kill_path: PathBuf,
    signal: TerminationSignal,
    timeout: Duration,
}

impl CommandProcessControl {
    pub fn new(settings: &ProcessSettings) -> Self {
        Self {
            ps_path: settings.ps_path.clone(),
            kill_path: settings.kill_path.clone(),
            signal: settings.signal,
            timeout: settings.command_timeout(),
        }
    }

    /// Run `program args` to completion, or fail once the timeout elapses.
    ///
    /// The child is killed if the timeout fires.
    async fn run(
        &self,
        program: &Path,
        args: &[String],
        pid: i32,
        on_error: fn(i32, String) -> ProcessError,
    ) -> Result<Output, ProcessError> {
        let operation = format!("{} {}", program.display(), args.join(" "));
        debug!(pid = pid, command = %operation, "Running process command");

        let child = Command::new(program)
            .args(args)
            .env("LC_ALL", "C")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output();

        match timeout(self.timeout, child).await {
            Ok(Ok(output)) => Ok(output),
            Ok(Err(e)) => {
                warn!(pid = pid, command = %operation, error = %e, "Failed to run process command");
                Err(on_error(pid, format!("could not run `{}`: {}", operation, e)))
            }
            Err(_) => {
                warn!(pid = pid, command = %operation, "Process command timed out");
                Err(ProcessError::TimedOut {
                    pid,
                    operation,
                    timeout_ms: self.timeout.as_millis() as u64,
                })
            }
        }
    }
}

fn probe_failed(pid: i32, reason: String) -> ProcessError {
    ProcessError::ProbeFailed { pid, reason }
}

fn terminate_failed(pid: i32, reason: String) -> ProcessError {
    ProcessError::TerminateFailed { pid, reason }
}

impl ProcessProbe for CommandProcessControl {
    /// `ps -p` exits 0 when the process exists and exits non-zero with an
    /// empty stderr when it does not. Anything on stderr means `ps` itself
    /// failed, which is reported as a probe error rather than "not found".
    async fn probe(&self, pid: i32) -> Result<ProcessState, ProcessError> {
        let args = ["-p".to_string(), pid.to_string()];
        let output = self.run(&self.ps_path, &args, pid, probe_failed).await?;

        match output.status.code() {
            Some(0) => {
                debug!(pid = pid, "Process is alive");
                Ok(ProcessState::Alive)
            }
            Some(code) => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                if !stderr.trim().is_empty() {
                    warn!(pid = pid, exit_code = code, stderr = %stderr.trim(), "ps failed");
                    return Err(probe_failed(
                        pid,
                        format!("ps exited with {}: {}", code, stderr.trim()),
                    ));
                }
                debug!(pid = pid, exit_code = code, "Process not found");
                Ok(ProcessState::NotFound)
            }
            None => Err(probe_failed(
                pid,
                "ps was terminated by a signal".to_string(),
            )),
        }
    }
}

impl ProcessTerminator for CommandProcessControl {
    async fn terminate(&self, pid: i32) -> Result<Termination, ProcessError> {
        let args = [format!("-{}", self.signal.name()), pid.to_string()];
        let output = self.run(&self.kill_path, &args, pid, terminate_failed).await?;

        if output.status.success() {
            debug!(pid = pid, signal = %self.signal, "Signal sent successfully");
            return Ok(Termination::Signalled);
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        if stderr.contains("No such process") {
            debug!(pid = pid, "Process already exited before signal");
            return Ok(Termination::AlreadyGone);
        }

        Err(terminate_failed(
            pid,
            format!(
                "kill -{} {} exited with {}: {}",
                self.signal.name(),
                pid,
                output.status,
                stderr.trim()
            ),
        ))
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn control() -> CommandProcessControl {
        CommandProcessControl::new(&ProcessSettings::default())
    }

    #[tokio::test]
    async fn test_probe_current_process() {
        let state = control().probe(std::process::id() as i32).await.unwrap();
        assert_eq!(state, ProcessState::Alive);
    }

    #[tokio::test]
    async fn test_probe_exited_process() {
        let mut child = std::process::Command::new("true").spawn().unwrap();
        let pid = child.id() as i32;
        child.wait().unwrap();

        let state = control().probe(pid).await.unwrap();
        assert_eq!(state, ProcessState::NotFound);
    }

    #[tokio::test]
    async fn test_probe_missing_binary_is_an_error() {
        let settings = ProcessSettings {
            ps_path: PathBuf::from("/nonexistent/bin/ps"),
            ..ProcessSettings::default()
        };
        let control = CommandProcessControl::new(&settings);

        let err = control.probe(std::process::id() as i32).await.unwrap_err();
        assert!(matches!(err, ProcessError::ProbeFailed { .. }));
    }

    #[tokio::test]
    async fn test_failing_ps_is_an_error_not_missing() {
        // `ls -p <pid>` exits non-zero and complains on stderr.
        let settings = ProcessSettings {
            ps_path: PathBuf::from("ls"),
            ..ProcessSettings::default()
        };
        let control = CommandProcessControl::new(&settings);

        let err = control.probe(std::process::id() as i32).await.unwrap_err();
        assert!(matches!(err, ProcessError::ProbeFailed { .. }));
    }

    #[tokio::test]
    async fn test_commands_run_in_c_locale() {
        let args = ["-c".to_string(), "printf %s \"$LC_ALL\"".to_string()];
        let output = control()
            .run(Path::new("sh"), &args, 1, probe_failed)
            .await
            .unwrap();
        assert_eq!(String::from_utf8_lossy(&output.stdout), "C");
    }

    #[tokio::test]
    async fn test_slow_command_times_out() {
        let settings = ProcessSettings {
            command_timeout_ms: 50,
            ..ProcessSettings::default()
        };
        let control = CommandProcessControl::new(&settings);
        let args = ["-c".to_string(), "sleep 5".to_string()];

        let err = control
            .run(Path::new("sh"), &args, 1, probe_failed)
            .await
            .unwrap_err();
        assert!(matches!(err, ProcessError::TimedOut { timeout_ms: 50, .. }));
    }

    #[tokio::test]
    async fn test_terminate_running_child() {
        let mut child = std::process::Command::new("sleep").arg("30").spawn().unwrap();
        let pid = child.id() as i32;

        let result = control().terminate(pid).await.unwrap();
        assert_eq!(result, Termination::Signalled);

        let status = child.wait().unwrap();
        assert!(!status.success());
    }
}
