//! Application layer - Use case services.
//!
//! Services are thin orchestrators that:
//! - Accept domain types as inputs
//! - Use ports (traits) for external dependencies
//! - Return domain types as outputs

mod archival_selector;
mod kill_service;

pub use archival_selector::ArchivalBackendSelector;
pub use kill_service::JobKillService;
