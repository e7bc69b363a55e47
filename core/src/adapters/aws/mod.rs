//! AWS-compatible object store plumbing: region and credential resolution,
//! request signing, and the S3 client used by the archival backend.

mod credentials;
mod profile;
mod region;
mod s3;
pub mod sigv4;

pub use credentials::CredentialSource;
pub use region::{is_known_region, RegionProvider, DEFAULT_REGION};
pub use s3::S3Client;

use std::path::PathBuf;
use std::sync::Arc;

/// Where environment variables are read from.
///
/// The agent uses the process environment; tests supply fixed values.
#[derive(Clone)]
pub struct EnvSource(Arc<dyn Fn(&str) -> Option<String> + Send + Sync>);

impl EnvSource {
    pub fn process() -> Self {
        Self(Arc::new(|key| std::env::var(key).ok()))
    }

    pub fn from_pairs(pairs: &[(&str, &str)]) -> Self {
        let vars: Vec<(String, String)> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Self(Arc::new(move |key| {
            vars.iter().find(|(k, _)| k == key).map(|(_, v)| v.clone())
        }))
    }

    /// The value of `key`, treating blank values as unset.
    pub fn get(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|value| !value.trim().is_empty())
    }

    /// Selected profile name: `AWS_PROFILE` or `default`.
    pub fn profile_name(&self) -> String {
        self.get("AWS_PROFILE").unwrap_or_else(|| "default".to_string())
    }

    /// `$override_var` if set, otherwise `~/.aws/<file_name>`.
    pub(crate) fn aws_file(&self, override_var: &str, file_name: &str) -> Option<PathBuf> {
        self.get(override_var)
            .map(PathBuf::from)
            .or_else(|| dirs::home_dir().map(|home| home.join(".aws").join(file_name)))
    }
}

impl std::fmt::Debug for EnvSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("EnvSource")
    }
}
