//! Process probe and terminator ports (interfaces).

use serde::Serialize;

use crate::error::ProcessError;

/// What a liveness probe observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ProcessState {
    Alive,
    NotFound,
}

/// What a termination request observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Termination {
    /// The signal was delivered.
    Signalled,
    /// The process no longer existed when the signal was sent.
    AlreadyGone,
}

/// Port for checking whether a process exists.
///
/// Implementations must keep "the process is gone" (`Ok(NotFound)`) apart
/// from "the check itself failed" (`Err`), and must bound every call with a
/// timeout that surfaces as `Err`.
pub trait ProcessProbe: Send + Sync {
    fn probe(
        &self,
        pid: i32,
    ) -> impl std::future::Future<Output = Result<ProcessState, ProcessError>> + Send;
}

/// Port for sending a termination signal to a process.
///
/// Signalling a pid that has already exited is not an error: it is reported
/// as [`Termination::AlreadyGone`].
pub trait ProcessTerminator: Send + Sync {
    fn terminate(
        &self,
        pid: i32,
    ) -> impl std::future::Future<Output = Result<Termination, ProcessError>> + Send;
}
