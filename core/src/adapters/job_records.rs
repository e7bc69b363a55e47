//! Job record lookup adapters.
//!
//! The authoritative job store lives outside the agent. These adapters give
//! the agent something to read from: an in-memory map (embedding, tests) and
//! a JSON file exported by the job store.

use std::collections::HashMap;
use std::path::PathBuf;

use parking_lot::RwLock;
use serde::Deserialize;
use tokio::fs;

use crate::domain::{JobId, JobRecord};
use crate::error::{Error, Result};
use crate::ports::JobRecordLookup;

/// Job records held in memory.
#[derive(Debug, Default)]
pub struct InMemoryJobRecords {
    records: RwLock<HashMap<JobId, JobRecord>>,
}

impl InMemoryJobRecords {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the record for its job id.
    pub fn upsert(&self, record: JobRecord) {
        self.records.write().insert(record.job_id.clone(), record);
    }

    pub fn remove(&self, job_id: &JobId) -> Option<JobRecord> {
        self.records.write().remove(job_id)
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

impl FromIterator<JobRecord> for InMemoryJobRecords {
    fn from_iter<I: IntoIterator<Item = JobRecord>>(iter: I) -> Self {
        let records = iter
            .into_iter()
            .map(|record| (record.job_id.clone(), record))
            .collect();
        Self {
            records: RwLock::new(records),
        }
    }
}

impl JobRecordLookup for InMemoryJobRecords {
    async fn job_record(&self, job_id: &JobId) -> Result<JobRecord> {
        self.records
            .read()
            .get(job_id)
            .cloned()
            .ok_or_else(|| Error::JobNotFound(job_id.to_string()))
    }
}

/// On-disk layout of the records file.
#[derive(Deserialize)]
#[serde(untagged)]
enum RecordFile {
    List(Vec<JobRecord>),
    /// Keyed by job id; the key is informational, the record's own id wins.
    Map(HashMap<String, JobRecord>),
}

/// Job records read from a JSON file holding either an array of records or
/// an object keyed by job id.
///
/// The file is re-read on every lookup so that updates written by the job
/// store are picked up without restarting the agent.
pub struct JsonJobRecordStore {
    path: PathBuf,
}

impl JsonJobRecordStore {
    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    async fn load(&self) -> Result<Vec<JobRecord>> {
        let content = fs::read_to_string(&self.path).await.map_err(|e| {
            Error::Server(format!(
                "Failed to read job records from {}: {}",
                self.path.display(),
                e
            ))
        })?;
        Ok(match serde_json::from_str(&content)? {
            RecordFile::List(records) => records,
            RecordFile::Map(records) => records.into_values().collect(),
        })
    }
}

impl JobRecordLookup for JsonJobRecordStore {
    async fn job_record(&self, job_id: &JobId) -> Result<JobRecord> {
        self.load()
            .await?
            .into_iter()
            .find(|record| &record.job_id == job_id)
            .ok_or_else(|| Error::JobNotFound(job_id.to_string()))
    }
}
