use tracing::info;

use crate::domain::{ArchivalTarget, ArchiveReport};
use crate::error::Result;
use crate::ports::ArchivalBackend;

/// Archival backend that accepts every request and stores nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpArchivalBackend;

impl ArchivalBackend for NoOpArchivalBackend {
    async fn archive(&self, target: ArchivalTarget) -> Result<ArchiveReport> {
        info!(
            job_id = %target.job_id,
            destination = %target.destination,
            "Archival disabled, skipping"
        );
        Ok(ArchiveReport::skipped())
    }

    fn name(&self) -> &'static str {
        "noop"
    }
}
