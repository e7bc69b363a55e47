//! Ports layer - Trait definitions (interfaces).
//!
//! This module defines the interfaces that the application layer uses
//! to interact with external systems. Implementations live in `adapters`.

mod archival;
mod credentials;
mod job_records;
mod process;

pub use archival::{ArchivalBackend, ObjectUploader};
pub use credentials::{Credentials, CredentialsProvider};
pub use job_records::JobRecordLookup;
pub use process::{ProcessProbe, ProcessState, ProcessTerminator, Termination};
