//! Configuration management for RAX File Server
//!
//! Separates startup configuration (requires restart) from runtime configuration
//! (shared with running sessions), plus the table of configured accounts.

use config::{Config, Environment, File};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::storage::profile::DEFAULT_MAX_PROFILE_PICTURE_BYTES;

/// Complete server configuration with startup/runtime separation
#[derive(Debug, Deserialize, Clone, Default)]
pub struct ServerConfig {
    #[serde(default)]
    pub startup: StartupConfig,

    #[serde(default)]
    pub runtime: RuntimeConfig,

    #[serde(default)]
    pub users: Vec<UserRecord>,
}

/// Configuration that requires server restart to take effect
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StartupConfig {
    // ═══ NETWORK ═══
    /// IP address to bind the control connection
    pub bind_address: String,

    /// Port for the control connection; 0 picks a free port
    pub control_port: u16,

    // ═══ STORAGE ═══
    /// Directory holding one subdirectory per user
    pub storage_root: String,

    /// Root for project-relative file access
    pub project_root: String,

    /// Enables PREAD/PEDIT for elevated accounts
    pub project_files_enabled: bool,

    // ═══ LIMITS ═══
    pub max_command_length: usize,
    pub max_username_length: usize,
    pub max_profile_picture_bytes: u64,
}

impl Default for StartupConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1".to_string(),
            control_port: 2121,
            storage_root: "./uploads".to_string(),
            project_root: ".".to_string(),
            project_files_enabled: false,
            max_command_length: 1024,
            max_username_length: 64,
            max_profile_picture_bytes: DEFAULT_MAX_PROFILE_PICTURE_BYTES,
        }
    }
}

/// Configuration read by live sessions
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Maximum concurrent authenticated sessions
    /// Environment: RAX_RUNTIME__MAX_CLIENTS
    pub max_clients: usize,

    /// Maximum payload size in MB for any single command
    /// Environment: RAX_RUNTIME__MAX_UPLOAD_SIZE_MB
    pub max_upload_size_mb: u64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            max_clients: 10,
            max_upload_size_mb: 100,
        }
    }
}

/// A configured account
#[derive(Debug, Deserialize, Clone)]
pub struct UserRecord {
    /// Namespace id; lowercase letters, digits, `-` and `_`
    pub id: String,
    pub username: String,
    pub password: String,
    /// May use project-relative file access
    #[serde(default)]
    pub elevated: bool,
}

/// Thread-safe runtime configuration wrapper
pub type SharedRuntimeConfig = Arc<RwLock<RuntimeConfig>>;

impl ServerConfig {
    /// Load configuration from config.toml with environment overrides
    pub fn load() -> Result<Self, config::ConfigError> {
        // Try the packaged layout first, then the working directory
        let config_paths = ["rax-file-server/config", "config"];

        let mut last_error = None;
        for config_path in config_paths {
            match Self::load_from(config_path) {
                Ok(config) => return Ok(config),
                Err(e) => last_error = Some(e),
            }
        }

        Err(last_error.unwrap_or_else(|| {
            config::ConfigError::Message(format!(
                "No configuration found. Tried: {config_paths:?}"
            ))
        }))
    }

    /// Load one configuration file (extension optional) with `RAX_` overrides
    pub fn load_from(path: &str) -> Result<Self, config::ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name(path))
            .add_source(
                Environment::with_prefix("RAX")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: ServerConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Split into startup (immutable) and runtime (shared) parts
    pub fn split(self) -> (StartupConfig, SharedRuntimeConfig, Vec<UserRecord>) {
        let runtime = Arc::new(RwLock::new(self.runtime));
        (self.startup, runtime, self.users)
    }

    /// Validation for all configuration values
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        if self.startup.storage_root.is_empty() {
            return Err(config::ConfigError::Message(
                "storage_root cannot be empty".into(),
            ));
        }

        if self.startup.max_profile_picture_bytes == 0 {
            return Err(config::ConfigError::Message(
                "max_profile_picture_bytes must be greater than 0".into(),
            ));
        }

        if self.runtime.max_clients == 0 {
            return Err(config::ConfigError::Message(
                "max_clients must be greater than 0".into(),
            ));
        }

        if self.runtime.max_upload_size_mb == 0 {
            return Err(config::ConfigError::Message(
                "max_upload_size_mb must be greater than 0".into(),
            ));
        }

        let mut usernames = HashSet::new();
        let mut ids = HashSet::new();
        for user in &self.users {
            if !usernames.insert(user.username.as_str()) {
                return Err(config::ConfigError::Message(format!(
                    "duplicate username: {}",
                    user.username
                )));
            }
            if !ids.insert(user.id.as_str()) {
                return Err(config::ConfigError::Message(format!(
                    "duplicate user id: {}",
                    user.id
                )));
            }
        }

        Ok(())
    }
}

impl StartupConfig {
    /// Get bind address and control port as socket address
    pub fn control_socket(&self) -> String {
        format!("{}:{}", self.bind_address, self.control_port)
    }

    pub fn storage_root_path(&self) -> PathBuf {
        PathBuf::from(&self.storage_root)
    }

    pub fn project_root_path(&self) -> &Path {
        Path::new(&self.project_root)
    }
}

impl RuntimeConfig {
    /// Get maximum payload size in bytes
    pub fn max_upload_size_bytes(&self) -> u64 {
        self.max_upload_size_mb * 1024 * 1024
    }
}
