//! Process control through `kill(2)`.

use nix::errno::Errno;
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use tracing::{debug, warn};

use crate::config::{ProcessSettings, TerminationSignal};
use crate::error::ProcessError;
use crate::ports::{ProcessProbe, ProcessState, ProcessTerminator, Termination};

impl From<TerminationSignal> for Signal {
    fn from(signal: TerminationSignal) -> Self {
        match signal {
            TerminationSignal::Term => Signal::SIGTERM,
            TerminationSignal::Kill => Signal::SIGKILL,
            TerminationSignal::Int => Signal::SIGINT,
            TerminationSignal::Hup => Signal::SIGHUP,
            TerminationSignal::Quit => Signal::SIGQUIT,
        }
    }
}

/// Native process control. `kill(2)` never blocks, so no timeout is applied.
#[derive(Debug, Clone, Copy)]
pub struct SignalProcessControl {
    signal: TerminationSignal,
}

impl SignalProcessControl {
    pub fn new(settings: &ProcessSettings) -> Self {
        Self {
            signal: settings.signal,
        }
    }
}

impl ProcessProbe for SignalProcessControl {
    /// Signal 0 performs the existence and permission checks only.
    /// `EPERM` means the process exists but belongs to someone else.
    async fn probe(&self, pid: i32) -> Result<ProcessState, ProcessError> {
        match kill(Pid::from_raw(pid), None) {
            Ok(()) | Err(Errno::EPERM) => Ok(ProcessState::Alive),
            Err(Errno::ESRCH) => {
                debug!(pid = pid, "Process not found");
                Ok(ProcessState::NotFound)
            }
            Err(errno) => Err(ProcessError::ProbeFailed {
                pid,
                reason: errno.desc().to_string(),
            }),
        }
    }
}

impl ProcessTerminator for SignalProcessControl {
    async fn terminate(&self, pid: i32) -> Result<Termination, ProcessError> {
        match kill(Pid::from_raw(pid), Signal::from(self.signal)) {
            Ok(()) => {
                debug!(pid = pid, signal = %self.signal, "Signal sent successfully");
                Ok(Termination::Signalled)
            }
            Err(Errno::ESRCH) => {
                debug!(pid = pid, "Process already exited before signal");
                Ok(Termination::AlreadyGone)
            }
            Err(errno) => {
                warn!(pid = pid, signal = %self.signal, error = %errno, "Failed to send signal");
                Err(ProcessError::TerminateFailed {
                    pid,
                    reason: errno.desc().to_string(),
                })
            }
        }
    }
}
