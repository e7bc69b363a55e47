//! Archival into an S3-compatible object store.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{error, info};
use walkdir::WalkDir;

use crate::config::PoolSettings;
use crate::domain::{ArchivalTarget, ArchiveReport};
use crate::error::{Error, Result};
use crate::ports::{ArchivalBackend, ObjectUploader};

use super::pool::UploadPool;

/// Uploads every regular file under the source directory, keyed by its path
/// relative to that directory.
pub struct ObjectStoreArchivalBackend<U> {
    uploader: Arc<U>,
    pool: UploadPool,
}

impl<U: ObjectUploader + 'static> ObjectStoreArchivalBackend<U> {
    /// Must be called within a Tokio runtime.
    pub fn new(uploader: U, pool: PoolSettings) -> Result<Self> {
        Ok(Self {
            uploader: Arc::new(uploader),
            pool: UploadPool::new(pool)?,
        })
    }

    pub fn uploader(&self) -> &U {
        &self.uploader
    }
}

/// Files under `root` paired with their `/`-separated relative paths.
/// Symlinks are not followed.
fn collect_files(root: &Path) -> Result<Vec<(PathBuf, String)>> {
    let metadata = std::fs::metadata(root).map_err(|e| {
        Error::Transfer(format!("cannot read source directory {}: {}", root.display(), e))
    })?;
    if !metadata.is_dir() {
        return Err(Error::Transfer(format!("{} is not a directory", root.display())));
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(root).follow_links(false).sort_by_file_name() {
        let entry = entry.map_err(|e| Error::Transfer(format!("walking {}: {}", root.display(), e)))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(root)
            .map_err(|e| Error::Transfer(e.to_string()))?
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("/");
        files.push((entry.into_path(), relative));
    }
    Ok(files)
}

impl<U: ObjectUploader + 'static> ArchivalBackend for ObjectStoreArchivalBackend<U> {
    async fn archive(&self, target: ArchivalTarget) -> Result<ArchiveReport> {
        let root = target.source_directory.clone();
        let files = tokio::task::spawn_blocking(move || collect_files(&root))
            .await
            .map_err(|e| Error::Transfer(format!("directory walk failed: {}", e)))??;

        info!(
            job_id = %target.job_id,
            destination = %target.destination,
            files = files.len(),
            "Archiving job output"
        );

        let mut handles = Vec::with_capacity(files.len());
        for (path, relative) in files {
            let uploader = Arc::clone(&self.uploader);
            let bucket = target.destination.bucket().to_string();
            let key = target.destination.key_for(&relative);
            let handle = self
                .pool
                .submit(async move { uploader.put_file(&bucket, &key, &path).await })
                .await?;
            handles.push((relative, handle));
        }

        let mut report = ArchiveReport::default();
        let mut failures = Vec::new();
        for (relative, handle) in handles {
            match handle.join().await.and_then(|outcome| outcome) {
                Ok(size) => {
                    report.files_uploaded += 1;
                    report.bytes_uploaded += size;
                }
                Err(e) => {
                    error!(job_id = %target.job_id, file = %relative, error = %e, "Upload failed");
                    failures.push(format!("{}: {}", relative, e));
                }
            }
        }

        if !failures.is_empty() {
            return Err(Error::Transfer(format!(
                "{} of {} uploads failed for job {} ({})",
                failures.len(),
                failures.len() + report.files_uploaded,
                target.job_id,
                failures.join("; ")
            )));
        }

        info!(
            job_id = %target.job_id,
            files = report.files_uploaded,
            bytes = report.bytes_uploaded,
            "Archived job output"
        );
        Ok(report)
    }

    fn name(&self) -> &'static str {
        "object-store"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{JobId, ObjectUri};
    use parking_lot::Mutex;
    use tempfile::tempdir;

    #[derive(Default)]
    struct RecordingUploader {
        objects: Mutex<Vec<(String, String, Vec<u8>)>>,
        fail_key: Option<String>,
    }

    impl ObjectUploader for RecordingUploader {
        async fn put_file(&self, bucket: &str, key: &str, path: &Path) -> Result<u64> {
            if self.fail_key.as_deref() == Some(key) {
                return Err(Error::Transfer("simulated failure".to_string()));
            }
            let body = tokio::fs::read(path).await.map_err(|e| Error::Transfer(e.to_string()))?;
            let size = body.len() as u64;
            self.objects
                .lock()
                .push((bucket.to_string(), key.to_string(), body));
            Ok(size)
        }
    }

    fn target(dir: &Path) -> ArchivalTarget {
        ArchivalTarget::new(
            JobId::parse("J1").unwrap(),
            dir,
            ObjectUri::parse("s3://archive/jobs/J1").unwrap(),
        )
    }

    fn small_pool() -> PoolSettings {
        PoolSettings {
            core_pool_size: 1,
            max_pool_size: 2,
            queue_capacity: 1,
            keep_alive_secs: 1,
        }
    }

    #[tokio::test]
    async fn test_uploads_nested_files() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("stdout"), b"hello").unwrap();
        std::fs::create_dir_all(dir.path().join("logs/deep")).unwrap();
        std::fs::write(dir.path().join("logs/deep/trace.log"), b"abc").unwrap();

        let backend =
            ObjectStoreArchivalBackend::new(RecordingUploader::default(), small_pool()).unwrap();
        let report = backend.archive(target(dir.path())).await.unwrap();

        assert_eq!(report.files_uploaded, 2);
        assert_eq!(report.bytes_uploaded, 8);
        assert!(!report.skipped);

        let mut keys: Vec<_> = backend
            .uploader()
            .objects
            .lock()
            .iter()
            .map(|(bucket, key, _)| format!("{}/{}", bucket, key))
            .collect();
        keys.sort();
        assert_eq!(keys, vec!["archive/jobs/J1/logs/deep/trace.log", "archive/jobs/J1/stdout"]);
    }

    #[tokio::test]
    async fn test_empty_directory_uploads_nothing() {
        let dir = tempdir().unwrap();
        let backend =
            ObjectStoreArchivalBackend::new(RecordingUploader::default(), small_pool()).unwrap();

        let report = backend.archive(target(dir.path())).await.unwrap();
        assert_eq!(report, ArchiveReport::default());
    }

    #[tokio::test]
    async fn test_missing_directory_is_transfer_error() {
        let dir = tempdir().unwrap();
        let backend =
            ObjectStoreArchivalBackend::new(RecordingUploader::default(), small_pool()).unwrap();

        let err = backend
            .archive(target(&dir.path().join("absent")))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Transfer(_)));
    }

    #[tokio::test]
    async fn test_partial_failure_reported() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("a"), b"1").unwrap();
        std::fs::write(dir.path().join("b"), b"2").unwrap();

        let uploader = RecordingUploader {
            fail_key: Some("jobs/J1/b".to_string()),
            ..RecordingUploader::default()
        };
        let backend = ObjectStoreArchivalBackend::new(uploader, small_pool()).unwrap();

        let err = backend.archive(target(dir.path())).await.unwrap_err();
        match err {
            Error::Transfer(message) => {
                assert!(message.contains("1 of 2 uploads failed"));
                assert!(message.contains("b: "));
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(backend.uploader().objects.lock().len(), 1);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_symlinks_are_not_followed() {
        let outside = tempdir().unwrap();
        std::fs::write(outside.path().join("secret"), b"x").unwrap();

        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("stdout"), b"ok").unwrap();
        std::os::unix::fs::symlink(outside.path(), dir.path().join("link")).unwrap();

        let backend =
            ObjectStoreArchivalBackend::new(RecordingUploader::default(), small_pool()).unwrap();
        let report = backend.archive(target(dir.path())).await.unwrap();
        assert_eq!(report.files_uploaded, 1);
    }
}
