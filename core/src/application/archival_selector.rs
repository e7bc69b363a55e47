//! Startup-time choice of archival backend.

use tracing::{info, warn};

use crate::adapters::archival::{BoundArchivalBackend, NoOpArchivalBackend, ObjectStoreArchivalBackend};
use crate::adapters::aws::{RegionProvider, S3Client};
use crate::config::ArchivalSettings;
use crate::error::Result;
use crate::ports::CredentialsProvider;

/// Binds the archival backend once, before any job runs.
///
/// Selection never fails: when the object store cannot be used the no-op
/// backend is bound and the reason is logged, so that a broken archive setup
/// does not stop jobs from running.
pub struct ArchivalBackendSelector {
    settings: ArchivalSettings,
    region: RegionProvider,
}

impl ArchivalBackendSelector {
    pub fn new(settings: ArchivalSettings, region: RegionProvider) -> Self {
        Self { settings, region }
    }

    /// Pick the backend. Must be awaited within a Tokio runtime.
    pub async fn select(&self, credentials: &impl CredentialsProvider) -> BoundArchivalBackend {
        if !self.settings.enabled {
            info!("Archival disabled in configuration, using no-op backend");
            return BoundArchivalBackend::NoOp(NoOpArchivalBackend);
        }

        match self.object_store(credentials) {
            Ok(backend) => {
                info!(
                    region = %backend.uploader().region(),
                    endpoint = %backend.uploader().endpoint(),
                    "Archiving to object store"
                );
                BoundArchivalBackend::ObjectStore(backend)
            }
            Err(e) => {
                warn!(error = %e, "Object store unavailable, archival disabled");
                BoundArchivalBackend::NoOp(NoOpArchivalBackend)
            }
        }
    }

    fn object_store(
        &self,
        credentials: &impl CredentialsProvider,
    ) -> Result<ObjectStoreArchivalBackend<S3Client>> {
        let region = self.region.region()?;
        let credentials = credentials.credentials()?;
        let client = S3Client::new(
            self.settings.endpoint.as_deref(),
            region,
            credentials,
            std::time::Duration::from_secs(self.settings.request_timeout_secs),
        )?;
        ObjectStoreArchivalBackend::new(client, self.settings.pool)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::aws::{CredentialSource, EnvSource};
    use crate::config::{CredentialSettings, CredentialSourceKind, RegionSettings};
    use crate::error::Error;
    use crate::ports::{ArchivalBackend, Credentials};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::tempdir;

    struct FakeCredentials {
        valid: bool,
        calls: AtomicUsize,
    }

    impl FakeCredentials {
        fn new(valid: bool) -> Self {
            Self {
                valid,
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl CredentialsProvider for FakeCredentials {
        fn credentials(&self) -> Result<Credentials> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.valid {
                Ok(Credentials::new("AKIDEXAMPLE", "secret"))
            } else {
                Err(Error::Credentials("no credentials configured".to_string()))
            }
        }
    }

    fn selector(settings: ArchivalSettings) -> ArchivalBackendSelector {
        ArchivalBackendSelector::new(settings, RegionProvider::Default)
    }

    #[tokio::test]
    async fn test_valid_credentials_bind_object_store() {
        let backend = selector(ArchivalSettings::default())
            .select(&FakeCredentials::new(true))
            .await;
        assert!(!backend.is_noop());
        assert_eq!(backend.name(), "object-store");
    }

    #[tokio::test]
    async fn test_credential_failure_binds_noop() {
        let backend = selector(ArchivalSettings::default())
            .select(&FakeCredentials::new(false))
            .await;
        assert!(backend.is_noop());
    }

    #[tokio::test]
    async fn test_disabled_skips_credentials() {
        let credentials = FakeCredentials::new(true);
        let settings = ArchivalSettings {
            enabled: false,
            ..ArchivalSettings::default()
        };

        let backend = selector(settings).select(&credentials).await;
        assert!(backend.is_noop());
        assert_eq!(credentials.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_region_failure_binds_noop() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("config").to_string_lossy().to_string();
        let region = RegionProvider::from_settings(
            &RegionSettings {
                static_region: None,
                auto: true,
            },
            EnvSource::from_pairs(&[("AWS_CONFIG_FILE", missing.as_str())]),
        )
        .unwrap();

        let credentials = FakeCredentials::new(true);
        let backend = ArchivalBackendSelector::new(ArchivalSettings::default(), region)
            .select(&credentials)
            .await;
        assert!(backend.is_noop());
        assert_eq!(credentials.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_blank_static_credentials_bind_noop() {
        let source = CredentialSource::from_settings(
            &CredentialSettings {
                source: CredentialSourceKind::Static,
                access_key_id: Some(String::new()),
                ..CredentialSettings::default()
            },
            EnvSource::from_pairs(&[]),
        );

        let backend = selector(ArchivalSettings::default()).select(&source).await;
        assert!(backend.is_noop());
    }

    #[tokio::test]
    async fn test_oversized_queue_binds_noop() {
        let mut settings = ArchivalSettings::default();
        settings.pool.queue_capacity = usize::MAX;

        let backend = selector(settings).select(&FakeCredentials::new(true)).await;
        assert!(backend.is_noop());
    }

    #[tokio::test]
    async fn test_bad_endpoint_binds_noop() {
        let settings = ArchivalSettings {
            endpoint: Some("::not-a-url::".to_string()),
            ..ArchivalSettings::default()
        };
        let backend = selector(settings).select(&FakeCredentials::new(true)).await;
        assert!(backend.is_noop());
    }
}
