//! Error types for the jobwarden-core library.

use thiserror::Error;

/// Result type alias for jobwarden operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification of an [`Error`], used by callers to pick a status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// The caller asked for something that can never succeed as issued.
    Precondition,
    /// The referenced job does not exist.
    NotFound,
    /// Local infrastructure failed (process table, signals, filesystem).
    Server,
    /// Moving job output to the object store failed.
    Transfer,
    /// Configuration, region or credentials are unusable.
    Configuration,
}

/// Failures talking to the operating system about a process.
///
/// None of these mean "the process does not exist": a missing process is
/// reported as a successful probe result, not as an error.
#[derive(Error, Debug)]
pub enum ProcessError {
    /// The liveness check could not be performed.
    #[error("Failed to check status of process {pid}: {reason}")]
    ProbeFailed { pid: i32, reason: String },

    /// The termination signal could not be delivered.
    #[error("Failed to terminate process {pid}: {reason}")]
    TerminateFailed { pid: i32, reason: String },

    /// The OS call did not finish within the configured timeout.
    #[error("`{operation}` on process {pid} timed out after {timeout_ms}ms")]
    TimedOut {
        pid: i32,
        operation: String,
        timeout_ms: u64,
    },
}

/// Errors that can occur while supervising or archiving jobs.
#[derive(Error, Debug)]
pub enum Error {
    /// The job id is malformed.
    #[error("Invalid job id: {0}")]
    InvalidJobId(String),

    /// The job record lookup has no record for this id.
    #[error("No job with id {0} exists")]
    JobNotFound(String),

    /// A kill was routed to a host that did not launch the job.
    #[error("Job {job_id} is not owned by this host (owner: {owner}, this host: {host})")]
    NotOwnedByHost {
        job_id: String,
        owner: String,
        host: String,
    },

    /// The job is still running according to its record but never recorded a pid.
    #[error("Job {0} has no process id to signal")]
    MissingProcessId(String),

    /// Any other caller-side precondition violation.
    #[error("Precondition failed: {0}")]
    Precondition(String),

    /// Probing or signalling a process failed.
    #[error(transparent)]
    Process(#[from] ProcessError),

    /// Internal failure not attributable to the caller.
    #[error("Server error: {0}")]
    Server(String),

    /// Uploading job output failed.
    #[error("Transfer failed: {0}")]
    Transfer(String),

    /// Object store credentials could not be resolved.
    #[error("Credentials error: {0}")]
    Credentials(String),

    /// Object store region could not be resolved.
    #[error("Region error: {0}")]
    Region(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP client error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl Error {
    /// Classify this error.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::InvalidJobId(_)
            | Error::NotOwnedByHost { .. }
            | Error::MissingProcessId(_)
            | Error::Precondition(_) => ErrorCategory::Precondition,
            Error::JobNotFound(_) => ErrorCategory::NotFound,
            Error::Process(_) | Error::Server(_) | Error::Io(_) | Error::Json(_) => {
                ErrorCategory::Server
            }
            Error::Transfer(_) | Error::Http(_) => ErrorCategory::Transfer,
            Error::Credentials(_) | Error::Region(_) | Error::Config(_) => {
                ErrorCategory::Configuration
            }
        }
    }

    /// True for caller errors that must not be retried.
    pub fn is_precondition(&self) -> bool {
        self.category() == ErrorCategory::Precondition
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_process_errors_are_server_errors() {
        let err = Error::from(ProcessError::ProbeFailed {
            pid: 42,
            reason: "ps not found".to_string(),
        });
        assert_eq!(err.category(), ErrorCategory::Server);
        assert!(err.to_string().contains("42"));

        let err = Error::from(ProcessError::TimedOut {
            pid: 7,
            operation: "kill -TERM 7".to_string(),
            timeout_ms: 500,
        });
        assert_eq!(err.category(), ErrorCategory::Server);
        assert!(err.to_string().contains("500ms"));
    }

    #[test]
    fn test_routing_errors_are_preconditions() {
        let err = Error::NotOwnedByHost {
            job_id: "J2".to_string(),
            owner: "H2".to_string(),
            host: "H1".to_string(),
        };
        assert!(err.is_precondition());
        assert!(err.to_string().contains("H2"));

        assert!(Error::InvalidJobId(String::new()).is_precondition());
        assert!(!Error::JobNotFound("J9".to_string()).is_precondition());
    }

    #[test]
    fn test_archival_categories() {
        assert_eq!(
            Error::Transfer("boom".to_string()).category(),
            ErrorCategory::Transfer
        );
        assert_eq!(
            Error::Credentials("no keys".to_string()).category(),
            ErrorCategory::Configuration
        );
    }
}
