//! Job record lookup port (interface).

use crate::domain::{JobId, JobRecord};
use crate::error::Result;

/// Read-only access to the persisted job records.
///
/// Fails with [`crate::Error::JobNotFound`] for unknown ids.
pub trait JobRecordLookup: Send + Sync {
    fn job_record(
        &self,
        job_id: &JobId,
    ) -> impl std::future::Future<Output = Result<JobRecord>> + Send;
}
