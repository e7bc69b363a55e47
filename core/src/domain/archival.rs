//! Archival target and result domain models.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

use super::JobId;

// ============================================================================
// ObjectUri
// ============================================================================

/// An `s3://bucket/prefix` destination.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ObjectUri {
    bucket: String,
    prefix: String,
}

impl ObjectUri {
    pub const SCHEME: &'static str = "s3://";

    /// Parse an `s3://bucket[/prefix]` URI.
    pub fn parse(raw: &str) -> Result<Self> {
        let rest = raw
            .trim()
            .strip_prefix(Self::SCHEME)
            .ok_or_else(|| Error::Precondition(format!("{:?} is not an s3:// URI", raw)))?;

        let (bucket, prefix) = match rest.split_once('/') {
            Some((bucket, prefix)) => (bucket, prefix),
            None => (rest, ""),
        };

        if bucket.is_empty() {
            return Err(Error::Precondition(format!("{:?} has no bucket", raw)));
        }

        let prefix = prefix
            .split('/')
            .filter(|segment| !segment.is_empty())
            .collect::<Vec<_>>()
            .join("/");

        Ok(Self {
            bucket: bucket.to_string(),
            prefix,
        })
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Key prefix without leading or trailing slashes; may be empty.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// The object key for `relative` (a `/`-separated path) under this prefix.
    pub fn key_for(&self, relative: &str) -> String {
        let relative = relative.trim_start_matches('/');
        if self.prefix.is_empty() {
            relative.to_string()
        } else {
            format!("{}/{}", self.prefix, relative)
        }
    }
}

impl std::fmt::Display for ObjectUri {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.prefix.is_empty() {
            write!(f, "{}{}", Self::SCHEME, self.bucket)
        } else {
            write!(f, "{}{}/{}", Self::SCHEME, self.bucket, self.prefix)
        }
    }
}

impl std::str::FromStr for ObjectUri {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ObjectUri {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<ObjectUri> for String {
    fn from(uri: ObjectUri) -> Self {
        uri.to_string()
    }
}

// ============================================================================
// ArchivalTarget / ArchiveReport
// ============================================================================

/// What to archive for one finished job. Consumed by a single `archive` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchivalTarget {
    pub job_id: JobId,
    pub source_directory: PathBuf,
    pub destination: ObjectUri,
}

impl ArchivalTarget {
    pub fn new(job_id: JobId, source_directory: impl Into<PathBuf>, destination: ObjectUri) -> Self {
        Self {
            job_id,
            source_directory: source_directory.into(),
            destination,
        }
    }
}

/// Result of a successful `archive` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchiveReport {
    pub files_uploaded: usize,
    pub bytes_uploaded: u64,
    /// True when archival is disabled and nothing was attempted.
    pub skipped: bool,
}

impl ArchiveReport {
    pub fn skipped() -> Self {
        Self {
            skipped: true,
            ..Self::default()
        }
    }
}
