//! Adapters layer - External system implementations.
//!
//! This module contains implementations of the port traits defined in `ports`.
//! Each adapter handles communication with one external system: the process
//! table, the job record store, or the object store.

pub mod archival;
pub mod aws;
pub mod job_records;
pub mod process;

// Re-export main types for convenience
pub use archival::{BoundArchivalBackend, NoOpArchivalBackend, ObjectStoreArchivalBackend};
pub use aws::{CredentialSource, EnvSource, RegionProvider, S3Client};
pub use job_records::{InMemoryJobRecords, JsonJobRecordStore};
pub use process::ProcessControl;
