//! Object store credential sources.

use std::path::PathBuf;

use tracing::debug;

use crate::config::{CredentialSettings, CredentialSourceKind};
use crate::error::{Error, Result};
use crate::ports::{Credentials, CredentialsProvider};

use super::profile::{load_profiles, ProfileFile};
use super::EnvSource;

/// A configured way of obtaining credentials.
#[derive(Clone)]
pub enum CredentialSource {
    /// Keys written in the agent configuration.
    Static {
        access_key_id: Option<String>,
        secret_access_key: Option<String>,
        session_token: Option<String>,
    },
    /// `AWS_ACCESS_KEY_ID`, `AWS_SECRET_ACCESS_KEY`, `AWS_SESSION_TOKEN`.
    Environment(EnvSource),
    /// A profile in the shared credentials file.
    Profile { name: String, path: Option<PathBuf> },
    /// The first source in the list that yields credentials.
    Chain(Vec<CredentialSource>),
}

impl CredentialSource {
    pub fn from_settings(settings: &CredentialSettings, env: EnvSource) -> Self {
        let profile = || Self::Profile {
            name: settings
                .profile
                .clone()
                .unwrap_or_else(|| env.profile_name()),
            path: settings
                .credentials_file
                .clone()
                .or_else(|| env.aws_file("AWS_SHARED_CREDENTIALS_FILE", "credentials")),
        };

        match settings.source {
            CredentialSourceKind::Static => Self::Static {
                access_key_id: settings.access_key_id.clone(),
                secret_access_key: settings.secret_access_key.clone(),
                session_token: settings.session_token.clone(),
            },
            CredentialSourceKind::Environment => Self::Environment(env.clone()),
            CredentialSourceKind::Profile => profile(),
            CredentialSourceKind::Chain => Self::Chain(vec![Self::Environment(env.clone()), profile()]),
        }
    }

    /// Short label used in logs.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Static { .. } => "static",
            Self::Environment(_) => "environment",
            Self::Profile { .. } => "profile",
            Self::Chain(_) => "chain",
        }
    }
}

impl std::fmt::Debug for CredentialSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Static {
                access_key_id,
                secret_access_key,
                session_token,
            } => f
                .debug_struct("Static")
                .field("access_key_id", access_key_id)
                .field(
                    "secret_access_key",
                    &secret_access_key.as_ref().map(|_| "<redacted>"),
                )
                .field("session_token", &session_token.as_ref().map(|_| "<redacted>"))
                .finish(),
            Self::Environment(env) => f.debug_tuple("Environment").field(env).finish(),
            Self::Profile { name, path } => f
                .debug_struct("Profile")
                .field("name", name)
                .field("path", path)
                .finish(),
            Self::Chain(sources) => f.debug_tuple("Chain").field(sources).finish(),
        }
    }
}

fn build(
    access_key_id: Option<String>,
    secret_access_key: Option<String>,
    session_token: Option<String>,
    origin: &str,
) -> Result<Credentials> {
    let access_key_id = access_key_id
        .filter(|k| !k.trim().is_empty())
        .ok_or_else(|| Error::Credentials(format!("{}: access key id is missing", origin)))?;
    let secret_access_key = secret_access_key
        .filter(|k| !k.trim().is_empty())
        .ok_or_else(|| Error::Credentials(format!("{}: secret access key is missing", origin)))?;

    let credentials = Credentials::new(access_key_id.trim(), secret_access_key.trim());
    Ok(match session_token.filter(|t| !t.trim().is_empty()) {
        Some(token) => credentials.with_session_token(token.trim()),
        None => credentials,
    })
}

impl CredentialsProvider for CredentialSource {
    fn credentials(&self) -> Result<Credentials> {
        match self {
            Self::Static {
                access_key_id,
                secret_access_key,
                session_token,
            } => build(
                access_key_id.clone(),
                secret_access_key.clone(),
                session_token.clone(),
                "static credentials",
            ),
            Self::Environment(env) => build(
                env.get("AWS_ACCESS_KEY_ID"),
                env.get("AWS_SECRET_ACCESS_KEY"),
                env.get("AWS_SESSION_TOKEN"),
                "environment",
            ),
            Self::Profile { name, path } => {
                let path = path.as_ref().ok_or_else(|| {
                    Error::Credentials("no shared credentials file location".to_string())
                })?;
                let profiles =
                    load_profiles(path, ProfileFile::Credentials, Error::Credentials)?;
                let keys = profiles.get(name).ok_or_else(|| {
                    Error::Credentials(format!(
                        "profile {:?} not found in {}",
                        name,
                        path.display()
                    ))
                })?;
                build(
                    keys.get("aws_access_key_id").cloned(),
                    keys.get("aws_secret_access_key").cloned(),
                    keys.get("aws_session_token").cloned(),
                    &format!("profile {}", name),
                )
            }
            Self::Chain(sources) => {
                let mut failures = Vec::new();
                for source in sources {
                    match source.credentials() {
                        Ok(credentials) => {
                            debug!(source = source.label(), "Resolved credentials");
                            return Ok(credentials);
                        }
                        Err(e) => failures.push(e.to_string()),
                    }
                }
                Err(Error::Credentials(format!(
                    "no source provided credentials ({})",
                    failures.join("; ")
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn settings(source: CredentialSourceKind) -> CredentialSettings {
        CredentialSettings {
            source,
            ..CredentialSettings::default()
        }
    }

    #[test]
    fn test_static_credentials() {
        let settings = CredentialSettings {
            access_key_id: Some("AKIDEXAMPLE".to_string()),
            secret_access_key: Some("secret".to_string()),
            session_token: Some("  ".to_string()),
            ..settings(CredentialSourceKind::Static)
        };
        let creds = CredentialSource::from_settings(&settings, EnvSource::from_pairs(&[]))
            .credentials()
            .unwrap();
        assert_eq!(creds.access_key_id, "AKIDEXAMPLE");
        assert_eq!(creds.session_token, None);
    }

    #[test]
    fn test_blank_static_secret_rejected() {
        let settings = CredentialSettings {
            access_key_id: Some("AKIDEXAMPLE".to_string()),
            secret_access_key: Some(" ".to_string()),
            ..settings(CredentialSourceKind::Static)
        };
        let err = CredentialSource::from_settings(&settings, EnvSource::from_pairs(&[]))
            .credentials()
            .unwrap_err();
        assert!(matches!(err, Error::Credentials(_)));
    }

    #[test]
    fn test_static_debug_redacts_secrets() {
        let settings = CredentialSettings {
            access_key_id: Some("AKID".to_string()),
            secret_access_key: Some("super-secret".to_string()),
            session_token: Some("session-token".to_string()),
            ..settings(CredentialSourceKind::Static)
        };
        let debug = format!(
            "{:?}",
            CredentialSource::from_settings(&settings, EnvSource::from_pairs(&[]))
        );
        assert!(debug.contains("AKID"));
        assert!(debug.contains("<redacted>"));
        assert!(!debug.contains("super-secret"));
        assert!(!debug.contains("session-token"));
    }

    #[test]
    fn test_environment_credentials() {
        let env = EnvSource::from_pairs(&[
            ("AWS_ACCESS_KEY_ID", "AKIDENV"),
            ("AWS_SECRET_ACCESS_KEY", "envsecret"),
            ("AWS_SESSION_TOKEN", "token"),
        ]);
        let creds = CredentialSource::from_settings(&settings(CredentialSourceKind::Environment), env)
            .credentials()
            .unwrap();
        assert_eq!(creds.access_key_id, "AKIDENV");
        assert_eq!(creds.session_token.as_deref(), Some("token"));
    }

    #[test]
    fn test_profile_credentials() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("credentials");
        std::fs::write(
            &path,
            "[default]\naws_access_key_id = AKIDDEFAULT\naws_secret_access_key = s1\n\
             [archive]\naws_access_key_id = AKIDARCHIVE\naws_secret_access_key = s2\n",
        )
        .unwrap();

        let settings = CredentialSettings {
            profile: Some("archive".to_string()),
            credentials_file: Some(path),
            ..settings(CredentialSourceKind::Profile)
        };
        let creds = CredentialSource::from_settings(&settings, EnvSource::from_pairs(&[]))
            .credentials()
            .unwrap();
        assert_eq!(creds.access_key_id, "AKIDARCHIVE");
        assert_eq!(creds.secret_access_key, "s2");
    }

    #[test]
    fn test_chain_falls_back_to_profile() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("credentials");
        std::fs::write(
            &path,
            "[default]\naws_access_key_id = AKIDFILE\naws_secret_access_key = filesecret\n",
        )
        .unwrap();
        let path_str = path.to_string_lossy().to_string();

        let env = EnvSource::from_pairs(&[("AWS_SHARED_CREDENTIALS_FILE", path_str.as_str())]);
        let creds = CredentialSource::from_settings(&settings(CredentialSourceKind::Chain), env)
            .credentials()
            .unwrap();
        assert_eq!(creds.access_key_id, "AKIDFILE");
    }

    #[test]
    fn test_chain_reports_every_failure() {
        let dir = tempdir().unwrap();
        let path_str = dir.path().join("absent").to_string_lossy().to_string();

        let env = EnvSource::from_pairs(&[("AWS_SHARED_CREDENTIALS_FILE", path_str.as_str())]);
        let err = CredentialSource::from_settings(&settings(CredentialSourceKind::Chain), env)
            .credentials()
            .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("environment"));
        assert!(message.contains("cannot read"));
    }
}
