//! Object store region resolution.

use std::path::PathBuf;

use tracing::debug;

use crate::config::RegionSettings;
use crate::error::{Error, Result};

use super::profile::{load_profiles, ProfileFile};
use super::EnvSource;

/// Region used when neither a static region nor auto-detection is configured.
pub const DEFAULT_REGION: &str = "us-east-1";

const KNOWN_REGIONS: &[&str] = &[
    "af-south-1",
    "ap-east-1",
    "ap-northeast-1",
    "ap-northeast-2",
    "ap-northeast-3",
    "ap-south-1",
    "ap-south-2",
    "ap-southeast-1",
    "ap-southeast-2",
    "ap-southeast-3",
    "ap-southeast-4",
    "ap-southeast-5",
    "ap-southeast-7",
    "ca-central-1",
    "ca-west-1",
    "cn-north-1",
    "cn-northwest-1",
    "eu-central-1",
    "eu-central-2",
    "eu-north-1",
    "eu-south-1",
    "eu-south-2",
    "eu-west-1",
    "eu-west-2",
    "eu-west-3",
    "il-central-1",
    "me-central-1",
    "me-south-1",
    "mx-central-1",
    "sa-east-1",
    "us-east-1",
    "us-east-2",
    "us-gov-east-1",
    "us-gov-west-1",
    "us-west-1",
    "us-west-2",
];

/// Whether `name` is a region the object store knows about.
pub fn is_known_region(name: &str) -> bool {
    KNOWN_REGIONS.contains(&name)
}

/// How the region is chosen.
#[derive(Debug, Clone)]
pub enum RegionProvider {
    /// Always the configured region.
    Static(String),
    /// `AWS_REGION`, `AWS_DEFAULT_REGION`, then the profile's `region` in the
    /// shared config file.
    Auto {
        env: EnvSource,
        config_file: Option<PathBuf>,
    },
    /// Always [`DEFAULT_REGION`].
    Default,
}

impl RegionProvider {
    /// Build the provider. An unknown static region is a configuration error.
    pub fn from_settings(settings: &RegionSettings, env: EnvSource) -> Result<Self> {
        if let Some(name) = settings
            .static_region
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
        {
            if !is_known_region(name) {
                return Err(Error::Config(format!("unknown static region {:?}", name)));
            }
            return Ok(Self::Static(name.to_string()));
        }

        if settings.auto {
            let config_file = env.aws_file("AWS_CONFIG_FILE", "config");
            return Ok(Self::Auto { env, config_file });
        }

        Ok(Self::Default)
    }

    /// Resolve the region name.
    pub fn region(&self) -> Result<String> {
        match self {
            Self::Static(name) => Ok(name.clone()),
            Self::Default => Ok(DEFAULT_REGION.to_string()),
            Self::Auto { env, config_file } => {
                for var in ["AWS_REGION", "AWS_DEFAULT_REGION"] {
                    if let Some(region) = env.get(var) {
                        debug!(source = var, region = %region, "Resolved region from environment");
                        return Ok(region);
                    }
                }

                let path = config_file.as_ref().ok_or_else(|| {
                    Error::Region("no region in environment and no config file".to_string())
                })?;
                let profile = env.profile_name();
                let profiles = load_profiles(path, ProfileFile::Config, Error::Region)?;

                profiles
                    .get(&profile)
                    .and_then(|keys| keys.get("region"))
                    .filter(|region| !region.is_empty())
                    .cloned()
                    .ok_or_else(|| {
                        Error::Region(format!(
                            "profile {:?} in {} has no region",
                            profile,
                            path.display()
                        ))
                    })
            }
        }
    }
}
