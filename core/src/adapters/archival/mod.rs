//! Archival backends and the upload pool they share.

mod noop;
mod object_store;
mod pool;

pub use noop::NoOpArchivalBackend;
pub use object_store::ObjectStoreArchivalBackend;
pub use pool::{TaskHandle, UploadPool};

use crate::adapters::aws::S3Client;
use crate::domain::{ArchivalTarget, ArchiveReport};
use crate::error::Result;
use crate::ports::ArchivalBackend;

/// The archival backend bound at agent startup.
pub enum BoundArchivalBackend {
    NoOp(NoOpArchivalBackend),
    ObjectStore(ObjectStoreArchivalBackend<S3Client>),
}

impl BoundArchivalBackend {
    pub fn is_noop(&self) -> bool {
        matches!(self, Self::NoOp(_))
    }
}

impl ArchivalBackend for BoundArchivalBackend {
    async fn archive(&self, target: ArchivalTarget) -> Result<ArchiveReport> {
        match self {
            Self::NoOp(inner) => inner.archive(target).await,
            Self::ObjectStore(inner) => inner.archive(target).await,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::NoOp(inner) => inner.name(),
            Self::ObjectStore(inner) => inner.name(),
        }
    }
}
