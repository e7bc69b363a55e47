//! Archival ports (interfaces).

use std::path::Path;

use crate::domain::{ArchivalTarget, ArchiveReport};
use crate::error::Result;

/// Port for persisting a finished job's output directory.
pub trait ArchivalBackend: Send + Sync {
    /// Archive `target`. Failures are reported, never retried here.
    fn archive(
        &self,
        target: ArchivalTarget,
    ) -> impl std::future::Future<Output = Result<ArchiveReport>> + Send;

    /// Short name of the backend for logs and status output.
    fn name(&self) -> &'static str;
}

/// Port for storing a single object in a bucket.
pub trait ObjectUploader: Send + Sync {
    /// Store the contents of the file at `path` under `key`, returning the
    /// number of bytes sent.
    fn put_file(
        &self,
        bucket: &str,
        key: &str,
        path: &Path,
    ) -> impl std::future::Future<Output = Result<u64>> + Send;
}
