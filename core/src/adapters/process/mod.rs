//! Process control adapters.
//!
//! Two mechanisms implement the probe and terminator ports:
//! - `command`: `ps -p` and `kill` as child processes (any Unix-like host)
//! - `signal`: `kill(2)` through `nix` (Unix only)

mod command;

#[cfg(unix)]
mod signal;

pub use command::CommandProcessControl;

#[cfg(unix)]
pub use signal::SignalProcessControl;

use crate::config::{ProcessControlKind, ProcessSettings};
use crate::error::{ProcessError, Result};
use crate::ports::{ProcessProbe, ProcessState, ProcessTerminator, Termination};

/// The process control mechanism bound at agent startup.
#[derive(Debug, Clone)]
pub enum ProcessControl {
    Command(CommandProcessControl),
    #[cfg(unix)]
    Signal(SignalProcessControl),
}

impl ProcessControl {
    pub fn from_settings(settings: &ProcessSettings) -> Result<Self> {
        match settings.control {
            ProcessControlKind::Command => Ok(Self::Command(CommandProcessControl::new(settings))),
            #[cfg(unix)]
            ProcessControlKind::Signal => Ok(Self::Signal(SignalProcessControl::new(settings))),
            #[cfg(not(unix))]
            ProcessControlKind::Signal => Err(crate::error::Error::Config(
                "process.control = \"signal\" is only supported on Unix".to_string(),
            )),
        }
    }

    pub fn kind(&self) -> ProcessControlKind {
        match self {
            Self::Command(_) => ProcessControlKind::Command,
            #[cfg(unix)]
            Self::Signal(_) => ProcessControlKind::Signal,
        }
    }
}

impl ProcessProbe for ProcessControl {
    async fn probe(&self, pid: i32) -> std::result::Result<ProcessState, ProcessError> {
        match self {
            Self::Command(inner) => inner.probe(pid).await,
            #[cfg(unix)]
            Self::Signal(inner) => inner.probe(pid).await,
        }
    }
}

impl ProcessTerminator for ProcessControl {
    async fn terminate(&self, pid: i32) -> std::result::Result<Termination, ProcessError> {
        match self {
            Self::Command(inner) => inner.terminate(pid).await,
            #[cfg(unix)]
            Self::Signal(inner) => inner.terminate(pid).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_settings_picks_mechanism() {
        let settings = ProcessSettings::default();
        let control = ProcessControl::from_settings(&settings).unwrap();
        assert_eq!(control.kind(), ProcessControlKind::Command);

        #[cfg(unix)]
        {
            let settings = ProcessSettings {
                control: ProcessControlKind::Signal,
                ..ProcessSettings::default()
            };
            let control = ProcessControl::from_settings(&settings).unwrap();
            assert_eq!(control.kind(), ProcessControlKind::Signal);
        }
    }
}
