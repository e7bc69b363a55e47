//! JobWarden Core Library
//!
//! Per-host supervision agent for a distributed batch job scheduler.
//! Provides functionality to:
//! - Kill a running job on the host that launched it, safely and idempotently
//! - Archive a finished job's output directory to an S3-compatible store
//! - Manage the agent configuration file
//!
//! # Architecture
//! This library follows hexagonal architecture (ports & adapters):
//! - `domain`: Pure business logic and data models
//! - `ports`: Trait definitions (interfaces)
//! - `adapters`: External system implementations
//! - `application`: Use case services
//!
//! # Platform Support
//! - Unix: `ps`/`kill` commands or native `kill(2)` via `nix`
//! - Other: `ps`/`kill` commands only

// Hexagonal architecture layers
pub mod adapters;
pub mod application;
pub mod domain;
pub mod ports;

pub mod config;
pub mod engine;
pub mod error;

// Re-export domain types (primary API)
pub use domain::{
    ArchivalTarget, ArchiveReport, JobId, JobRecord, KillOutcome, KillReport, ObjectUri,
    DEFAULT_EXIT_CODE,
};

// Re-export other commonly used types
pub use config::{AgentConfig, ConfigStore};
pub use engine::{Agent, AgentStatus};
pub use error::{Error, ErrorCategory, ProcessError, Result};
pub use ports::ProcessState;
