//! Domain layer - Pure business logic and data models.
//!
//! This module contains domain entities that represent core business concepts.
//! These types have no I/O dependencies and can be tested in isolation.

mod archival;
mod job;

// Re-export all domain types
pub use archival::{ArchivalTarget, ArchiveReport, ObjectUri};
pub use job::{JobId, JobRecord, KillOutcome, KillReport, DEFAULT_EXIT_CODE, MAX_JOB_ID_LEN};
