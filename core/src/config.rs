//! Agent configuration.
//!
//! Stores configuration in JSON format at `~/.jobwarden/agent.json`.
//! Every field has a default, so a missing file or a partial file is valid.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::error::{Error, Result};

/// Top-level agent configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentConfig {
    /// Name this agent answers to in job records. Defaults to the OS hostname.
    #[serde(default)]
    pub hostname: Option<String>,

    /// Job records exported by the job store. Defaults to `~/.jobwarden/jobs.json`.
    #[serde(default)]
    pub records_file: Option<PathBuf>,

    #[serde(default)]
    pub process: ProcessSettings,

    #[serde(default)]
    pub archival: ArchivalSettings,
}

impl AgentConfig {
    /// Where job records are read from.
    pub fn records_path(&self) -> Result<PathBuf> {
        match &self.records_file {
            Some(path) => Ok(path.clone()),
            None => Ok(jobwarden_dir()?.join("jobs.json")),
        }
    }

    /// A copy safe to print: secret keys are replaced by a marker.
    pub fn redacted(&self) -> Self {
        let mut config = self.clone();
        config.archival.credentials = config.archival.credentials.redacted();
        config
    }

    /// Check the settings that cannot be validated by deserialization alone.
    pub fn validate(&self) -> Result<()> {
        if let Some(hostname) = &self.hostname {
            if hostname.trim().is_empty() {
                return Err(Error::Config("hostname must not be blank".to_string()));
            }
        }
        self.process.validate()?;
        self.archival.pool.validate()?;
        if self.archival.request_timeout_secs == 0 {
            return Err(Error::Config(
                "archival.requestTimeoutSecs must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

// ============================================================================
// Process control
// ============================================================================

/// Which mechanism is used to probe and signal job processes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessControlKind {
    /// Run `ps -p` and `kill`.
    #[default]
    Command,
    /// Call `kill(2)` directly.
    Signal,
}

/// Signal sent to terminate a job process.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TerminationSignal {
    #[default]
    Term,
    Kill,
    Int,
    Hup,
    Quit,
}

impl TerminationSignal {
    /// Name as accepted by `kill -<NAME>`.
    pub fn name(&self) -> &'static str {
        match self {
            TerminationSignal::Term => "TERM",
            TerminationSignal::Kill => "KILL",
            TerminationSignal::Int => "INT",
            TerminationSignal::Hup => "HUP",
            TerminationSignal::Quit => "QUIT",
        }
    }
}

impl std::fmt::Display for TerminationSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SIG{}", self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessSettings {
    #[serde(default)]
    pub control: ProcessControlKind,

    #[serde(default)]
    pub signal: TerminationSignal,

    /// Upper bound for every probe or terminate call.
    #[serde(default = "default_command_timeout_ms")]
    pub command_timeout_ms: u64,

    #[serde(default = "default_ps_path")]
    pub ps_path: PathBuf,

    #[serde(default = "default_kill_path")]
    pub kill_path: PathBuf,
}

fn default_command_timeout_ms() -> u64 {
    10_000
}

fn default_ps_path() -> PathBuf {
    PathBuf::from("ps")
}

fn default_kill_path() -> PathBuf {
    PathBuf::from("kill")
}

impl Default for ProcessSettings {
    fn default() -> Self {
        Self {
            control: ProcessControlKind::default(),
            signal: TerminationSignal::default(),
            command_timeout_ms: default_command_timeout_ms(),
            ps_path: default_ps_path(),
            kill_path: default_kill_path(),
        }
    }
}

impl ProcessSettings {
    fn validate(&self) -> Result<()> {
        if self.command_timeout_ms == 0 {
            return Err(Error::Config(
                "process.commandTimeoutMs must be greater than 0".to_string(),
            ));
        }
        if self.ps_path.as_os_str().is_empty() || self.kill_path.as_os_str().is_empty() {
            return Err(Error::Config(
                "process.psPath and process.killPath must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn command_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.command_timeout_ms)
    }
}

// ============================================================================
// Archival
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchivalSettings {
    /// When false the no-op backend is bound without probing credentials.
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default)]
    pub region: RegionSettings,

    #[serde(default)]
    pub credentials: CredentialSettings,

    /// Base URL of an S3-compatible endpoint. Defaults to AWS for the region.
    #[serde(default)]
    pub endpoint: Option<String>,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default)]
    pub pool: PoolSettings,
}

fn default_true() -> bool {
    true
}

fn default_request_timeout_secs() -> u64 {
    60
}

impl Default for ArchivalSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            region: RegionSettings::default(),
            credentials: CredentialSettings::default(),
            endpoint: None,
            request_timeout_secs: default_request_timeout_secs(),
            pool: PoolSettings::default(),
        }
    }
}

/// Region selection: a static name wins, then the auto-detect chain, then `us-east-1`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionSettings {
    #[serde(default, rename = "static")]
    pub static_region: Option<String>,

    #[serde(default)]
    pub auto: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialSourceKind {
    /// Environment variables, then the shared credentials file.
    #[default]
    Chain,
    Environment,
    Profile,
    Static,
}

#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialSettings {
    #[serde(default)]
    pub source: CredentialSourceKind,

    /// Profile name for the shared credentials file. Defaults to `AWS_PROFILE` or `default`.
    #[serde(default)]
    pub profile: Option<String>,

    /// Shared credentials file. Defaults to `~/.aws/credentials`.
    #[serde(default)]
    pub credentials_file: Option<PathBuf>,

    #[serde(default)]
    pub access_key_id: Option<String>,

    #[serde(default)]
    pub secret_access_key: Option<String>,

    #[serde(default)]
    pub session_token: Option<String>,
}

const REDACTED: &str = "<redacted>";

impl CredentialSettings {
    pub fn redacted(&self) -> Self {
        Self {
            secret_access_key: self.secret_access_key.as_ref().map(|_| REDACTED.to_string()),
            session_token: self.session_token.as_ref().map(|_| REDACTED.to_string()),
            ..self.clone()
        }
    }
}

impl std::fmt::Debug for CredentialSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialSettings")
            .field("source", &self.source)
            .field("profile", &self.profile)
            .field("credentials_file", &self.credentials_file)
            .field("access_key_id", &self.access_key_id)
            .field(
                "secret_access_key",
                &self.secret_access_key.as_ref().map(|_| REDACTED),
            )
            .field(
                "session_token",
                &self.session_token.as_ref().map(|_| REDACTED),
            )
            .finish()
    }
}

/// Sizing of the upload worker pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolSettings {
    /// Workers kept alive for the life of the pool.
    #[serde(default = "default_core_pool_size")]
    pub core_pool_size: usize,

    /// Upper bound on concurrent uploads once the queue is full.
    #[serde(default = "default_max_pool_size")]
    pub max_pool_size: usize,

    /// Uploads that may wait for a worker before submitters are held back.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Idle time after which a burst worker exits.
    #[serde(default = "default_keep_alive_secs")]
    pub keep_alive_secs: u64,
}

fn default_core_pool_size() -> usize {
    2
}

fn default_max_pool_size() -> usize {
    8
}

fn default_queue_capacity() -> usize {
    64
}

fn default_keep_alive_secs() -> u64 {
    60
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            core_pool_size: default_core_pool_size(),
            max_pool_size: default_max_pool_size(),
            queue_capacity: default_queue_capacity(),
            keep_alive_secs: default_keep_alive_secs(),
        }
    }
}

impl PoolSettings {
    pub fn validate(&self) -> Result<()> {
        if self.core_pool_size == 0 {
            return Err(Error::Config("pool.corePoolSize must be at least 1".to_string()));
        }
        if self.max_pool_size < self.core_pool_size {
            return Err(Error::Config(format!(
                "pool.maxPoolSize ({}) must not be smaller than pool.corePoolSize ({})",
                self.max_pool_size, self.core_pool_size
            )));
        }
        if self.queue_capacity == 0 {
            return Err(Error::Config("pool.queueCapacity must be at least 1".to_string()));
        }
        if self.queue_capacity > tokio::sync::Semaphore::MAX_PERMITS {
            return Err(Error::Config(format!(
                "pool.queueCapacity must not exceed {}",
                tokio::sync::Semaphore::MAX_PERMITS
            )));
        }
        Ok(())
    }

    pub fn keep_alive(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.keep_alive_secs)
    }
}

// ============================================================================
// ConfigStore
// ============================================================================

/// `~/.jobwarden`
fn jobwarden_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| Error::Config("Could not determine home directory".to_string()))?;
    Ok(home.join(".jobwarden"))
}

/// Reads and writes the agent configuration file.
pub struct ConfigStore {
    /// Path to the configuration file.
    config_path: PathBuf,
}

impl ConfigStore {
    /// Create a new config store with the default path.
    ///
    /// Default path: `~/.jobwarden/agent.json`
    pub fn new() -> Result<Self> {
        Ok(Self {
            config_path: jobwarden_dir()?.join("agent.json"),
        })
    }

    /// Create a config store with a custom path.
    pub fn with_path(config_path: PathBuf) -> Self {
        Self { config_path }
    }

    pub fn config_path(&self) -> &PathBuf {
        &self.config_path
    }

    /// Load and validate configuration from disk.
    ///
    /// Returns default config if the file doesn't exist.
    pub async fn load(&self) -> Result<AgentConfig> {
        if !fs::try_exists(&self.config_path).await.unwrap_or(false) {
            return Ok(AgentConfig::default());
        }

        let content = fs::read_to_string(&self.config_path)
            .await
            .map_err(|e| Error::Config(format!("Failed to read config: {}", e)))?;

        let config: AgentConfig = serde_json::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to disk.
    ///
    /// Creates the config directory if it doesn't exist.
    pub async fn save(&self, config: &AgentConfig) -> Result<()> {
        config.validate()?;

        if let Some(config_dir) = self.config_path.parent() {
            fs::create_dir_all(config_dir)
                .await
                .map_err(|e| Error::Config(format!("Failed to create config directory: {}", e)))?;
        }

        let content = serde_json::to_string_pretty(config)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;

        // Write atomically by writing to temp file then renaming
        let temp_path = self.config_path.with_extension("json.tmp");

        let mut file = fs::File::create(&temp_path)
            .await
            .map_err(|e| Error::Config(format!("Failed to create temp config file: {}", e)))?;

        file.write_all(content.as_bytes())
            .await
            .map_err(|e| Error::Config(format!("Failed to write config: {}", e)))?;

        file.sync_all()
            .await
            .map_err(|e| Error::Config(format!("Failed to sync config: {}", e)))?;

        fs::rename(&temp_path, &self.config_path)
            .await
            .map_err(|e| Error::Config(format!("Failed to rename config file: {}", e)))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn test_store() -> (ConfigStore, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("agent.json");
        (ConfigStore::with_path(path), dir)
    }

    #[tokio::test]
    async fn test_load_nonexistent() {
        let (store, _dir) = test_store();
        let config = store.load().await.unwrap();
        assert_eq!(config, AgentConfig::default());
        assert!(config.archival.enabled);
        assert_eq!(config.process.signal, TerminationSignal::Term);
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let (store, _dir) = test_store();

        let mut config = AgentConfig::default();
        config.hostname = Some("worker-7".to_string());
        config.process.control = ProcessControlKind::Signal;
        config.archival.region.static_region = Some("eu-west-1".to_string());
        config.archival.pool.max_pool_size = 16;

        store.save(&config).await.unwrap();

        let loaded = store.load().await.unwrap();
        assert_eq!(loaded, config);
    }

    #[tokio::test]
    async fn test_partial_file_uses_defaults() {
        let (store, _dir) = test_store();
        tokio::fs::write(
            store.config_path(),
            r#"{"archival":{"region":{"auto":true},"pool":{"corePoolSize":4}}}"#,
        )
        .await
        .unwrap();

        let config = store.load().await.unwrap();
        assert!(config.archival.region.auto);
        assert_eq!(config.archival.pool.core_pool_size, 4);
        assert_eq!(config.archival.pool.max_pool_size, 8);
        assert_eq!(config.process.command_timeout_ms, 10_000);
    }

    #[tokio::test]
    async fn test_load_rejects_bad_pool() {
        let (store, _dir) = test_store();
        tokio::fs::write(
            store.config_path(),
            r#"{"archival":{"pool":{"corePoolSize":4,"maxPoolSize":2}}}"#,
        )
        .await
        .unwrap();

        let err = store.load().await.unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_pool_validation() {
        assert!(PoolSettings::default().validate().is_ok());

        let zero_core = PoolSettings {
            core_pool_size: 0,
            ..PoolSettings::default()
        };
        assert!(zero_core.validate().is_err());

        let zero_queue = PoolSettings {
            queue_capacity: 0,
            ..PoolSettings::default()
        };
        assert!(zero_queue.validate().is_err());

        let huge_queue = PoolSettings {
            queue_capacity: usize::MAX,
            ..PoolSettings::default()
        };
        assert!(matches!(huge_queue.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_records_path() {
        let config: AgentConfig =
            serde_json::from_str(r#"{"recordsFile":"/var/lib/jobwarden/jobs.json"}"#).unwrap();
        assert_eq!(
            config.records_path().unwrap(),
            PathBuf::from("/var/lib/jobwarden/jobs.json")
        );
        assert!(AgentConfig::default()
            .records_path()
            .unwrap()
            .ends_with(".jobwarden/jobs.json"));
    }

    #[test]
    fn test_signal_names() {
        let signal: TerminationSignal = serde_json::from_str("\"KILL\"").unwrap();
        assert_eq!(signal, TerminationSignal::Kill);
        assert_eq!(signal.to_string(), "SIGKILL");
    }

    #[test]
    fn test_credential_settings_debug_redacts() {
        let settings = CredentialSettings {
            source: CredentialSourceKind::Static,
            access_key_id: Some("AKIDEXAMPLE".to_string()),
            secret_access_key: Some("super-secret".to_string()),
            ..CredentialSettings::default()
        };
        let debug = format!("{:?}", settings);
        assert!(debug.contains("AKIDEXAMPLE"));
        assert!(!debug.contains("super-secret"));
    }

    #[test]
    fn test_redacted_config_hides_secrets() {
        let mut config = AgentConfig::default();
        config.archival.credentials = CredentialSettings {
            source: CredentialSourceKind::Static,
            access_key_id: Some("AKIDEXAMPLE".to_string()),
            secret_access_key: Some("super-secret".to_string()),
            session_token: Some("session-token".to_string()),
            ..CredentialSettings::default()
        };

        let json = serde_json::to_string(&config.redacted()).unwrap();
        assert!(json.contains("AKIDEXAMPLE"));
        assert!(json.contains(r#""secretAccessKey":"<redacted>""#));
        assert!(!json.contains("super-secret"));
        assert!(!json.contains("session-token"));

        let unset = serde_json::to_string(&AgentConfig::default().redacted()).unwrap();
        assert!(unset.contains(r#""secretAccessKey":null"#));
    }
}
