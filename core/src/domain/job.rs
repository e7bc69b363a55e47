//! Job record and kill outcome domain models.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, ErrorCategory, Result};

/// Exit code recorded for a job that has not finished yet.
pub const DEFAULT_EXIT_CODE: i32 = -1;

/// Longest job id accepted, in bytes.
pub const MAX_JOB_ID_LEN: usize = 255;

fn job_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z0-9._-]+$").expect("static regex"))
}

// ============================================================================
// JobId
// ============================================================================

/// A validated job identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct JobId(String);

impl JobId {
    /// Parse and validate a job id.
    ///
    /// Surrounding whitespace is ignored. Ids must be non-empty, at most
    /// [`MAX_JOB_ID_LEN`] bytes, and made of ASCII alphanumerics, `-`, `_`, `.`.
    pub fn parse(raw: &str) -> Result<Self> {
        let id = raw.trim();
        if id.is_empty() {
            return Err(Error::InvalidJobId("job id is blank".to_string()));
        }
        if id.len() > MAX_JOB_ID_LEN {
            return Err(Error::InvalidJobId(format!(
                "job id is {} bytes, limit is {}",
                id.len(),
                MAX_JOB_ID_LEN
            )));
        }
        if !job_id_pattern().is_match(id) {
            return Err(Error::InvalidJobId(format!(
                "{:?} contains characters outside [A-Za-z0-9._-]",
                id
            )));
        }
        Ok(Self(id.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for JobId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for JobId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<JobId> for String {
    fn from(id: JobId) -> Self {
        id.0
    }
}

// ============================================================================
// JobRecord
// ============================================================================

/// Last known persisted execution state of a job.
///
/// Owned by the job store; this crate only reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRecord {
    pub job_id: JobId,
    /// Host that launched the job.
    pub hostname: String,
    /// OS process id, absent until the job has launched.
    #[serde(default)]
    pub process_id: Option<i32>,
    /// Exit code, [`DEFAULT_EXIT_CODE`] while the job is still running.
    #[serde(default = "default_exit_code")]
    pub exit_code: i32,
}

fn default_exit_code() -> i32 {
    DEFAULT_EXIT_CODE
}

impl JobRecord {
    /// A record for a job that is still running.
    pub fn running(job_id: JobId, hostname: impl Into<String>, process_id: i32) -> Self {
        Self {
            job_id,
            hostname: hostname.into(),
            process_id: Some(process_id),
            exit_code: DEFAULT_EXIT_CODE,
        }
    }

    /// A record for a job that exited with `exit_code`.
    pub fn finished(job_id: JobId, hostname: impl Into<String>, exit_code: i32) -> Self {
        Self {
            job_id,
            hostname: hostname.into(),
            process_id: None,
            exit_code,
        }
    }

    /// Whether the record says the job already completed.
    pub fn is_finished(&self) -> bool {
        self.exit_code != DEFAULT_EXIT_CODE
    }

    pub fn is_owned_by(&self, host: &str) -> bool {
        self.hostname == host
    }
}

// ============================================================================
// KillOutcome
// ============================================================================

/// Successful result of a kill request.
///
/// Wrong-host and infrastructure failures are reported through
/// [`Error`] instead; see [`KillReport`] for the flattened view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum KillOutcome {
    /// The record already carried a final exit code.
    AlreadyFinished,
    /// The process exited between the record read and the kill.
    RaceLostAlreadyFinished,
    /// The termination signal was delivered.
    Killed,
}

impl KillOutcome {
    pub fn description(&self) -> &'static str {
        match self {
            KillOutcome::AlreadyFinished => "job had already finished",
            KillOutcome::RaceLostAlreadyFinished => "job process exited before it could be killed",
            KillOutcome::Killed => "job process was sent a termination signal",
        }
    }
}

impl std::fmt::Display for KillOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.description())
    }
}

/// Every way a kill request can end, as reported to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum KillReport {
    AlreadyFinished,
    NotOnThisHost { reason: String },
    RaceLostAlreadyFinished,
    Killed,
    NotFound { reason: String },
    Invalid { reason: String },
    Failed { reason: String },
}

impl KillReport {
    /// Whether the request ended without an error.
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            KillReport::AlreadyFinished | KillReport::RaceLostAlreadyFinished | KillReport::Killed
        )
    }
}

impl From<KillOutcome> for KillReport {
    fn from(outcome: KillOutcome) -> Self {
        match outcome {
            KillOutcome::AlreadyFinished => KillReport::AlreadyFinished,
            KillOutcome::RaceLostAlreadyFinished => KillReport::RaceLostAlreadyFinished,
            KillOutcome::Killed => KillReport::Killed,
        }
    }
}

impl From<&Error> for KillReport {
    fn from(err: &Error) -> Self {
        let reason = err.to_string();
        match err {
            Error::NotOwnedByHost { .. } => KillReport::NotOnThisHost { reason },
            _ => match err.category() {
                ErrorCategory::NotFound => KillReport::NotFound { reason },
                ErrorCategory::Precondition => KillReport::Invalid { reason },
                _ => KillReport::Failed { reason },
            },
        }
    }
}

impl From<&Result<KillOutcome>> for KillReport {
    fn from(result: &Result<KillOutcome>) -> Self {
        match result {
            Ok(outcome) => KillReport::from(*outcome),
            Err(err) => KillReport::from(err),
        }
    }
}
