//! Configuration management for Parley
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.

use crate::error::{ParleyError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure for Parley
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Backend API settings
    #[serde(default)]
    pub api: ApiConfig,
    /// Where the bearer credential is kept
    #[serde(default)]
    pub credentials: CredentialsConfig,
    /// Conversation store behavior
    #[serde(default)]
    pub store: StoreConfig,
}

/// Backend API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL every request path is joined onto
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout applied by the HTTP transport (seconds)
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Value of the `User-Agent` header
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_base_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_user_agent() -> String {
    format!("parley/{}", env!("CARGO_PKG_VERSION"))
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_seconds: default_timeout_seconds(),
            user_agent: default_user_agent(),
        }
    }
}

/// Credential backend selection
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum CredentialBackend {
    /// JSON file in the user data directory
    #[default]
    File,
    /// OS native keyring
    Keyring,
    /// Process memory only
    Memory,
}

impl std::str::FromStr for CredentialBackend {
    type Err = ParleyError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "file" => Ok(Self::File),
            "keyring" => Ok(Self::Keyring),
            "memory" => Ok(Self::Memory),
            other => Err(ParleyError::Config(format!(
                "unknown credential backend: {}",
                other
            ))),
        }
    }
}

/// Credential storage configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CredentialsConfig {
    /// Backend used for the token and display name
    #[serde(default)]
    pub backend: CredentialBackend,

    /// File location for the `file` backend; defaults to the data directory
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// How a fetched conversation list is reconciled with deletions that
/// completed while the fetch was in flight.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchPolicy {
    /// Replace the list with the server response as-is. A slow fetch can
    /// reintroduce an item deleted after it was sent.
    #[default]
    Replace,
    /// Drop ids deleted locally while the fetch was in flight.
    SkipDeleted,
}

impl std::str::FromStr for FetchPolicy {
    type Err = ParleyError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "replace" => Ok(Self::Replace),
            "skip_deleted" => Ok(Self::SkipDeleted),
            other => Err(ParleyError::Config(format!("unknown fetch policy: {}", other))),
        }
    }
}

/// Conversation store configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Reconciliation policy for `fetch_conversations`
    #[serde(default)]
    pub fetch_policy: FetchPolicy,
}

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// # Arguments
    ///
    /// * `path` - Path to configuration file
    /// * `cli` - CLI arguments for overrides
    ///
    /// # Returns
    ///
    /// Returns the loaded and merged configuration
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read or parsed
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ParleyError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| ParleyError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) {
        if let Ok(base_url) = std::env::var("PARLEY_API_BASE_URL") {
            self.api.base_url = base_url;
        }

        if let Ok(timeout) = std::env::var("PARLEY_API_TIMEOUT_SECONDS") {
            if let Ok(value) = timeout.parse() {
                self.api.timeout_seconds = value;
            } else {
                tracing::warn!("Invalid PARLEY_API_TIMEOUT_SECONDS: {}", timeout);
            }
        }

        if let Ok(backend) = std::env::var("PARLEY_CREDENTIALS_BACKEND") {
            match backend.parse() {
                Ok(value) => self.credentials.backend = value,
                Err(e) => tracing::warn!("Ignoring PARLEY_CREDENTIALS_BACKEND: {}", e),
            }
        }

        if let Ok(path) = std::env::var("PARLEY_CREDENTIALS_PATH") {
            self.credentials.path = Some(PathBuf::from(path));
        }

        if let Ok(policy) = std::env::var("PARLEY_FETCH_POLICY") {
            match policy.parse() {
                Ok(value) => self.store.fetch_policy = value,
                Err(e) => tracing::warn!("Ignoring PARLEY_FETCH_POLICY: {}", e),
            }
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if let Some(base_url) = &cli.base_url {
            self.api.base_url = base_url.clone();
        }
        if let Some(backend) = cli.credentials {
            self.credentials.backend = backend;
        }
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns [`ParleyError::Config`] describing the first invalid field.
    pub fn validate(&self) -> Result<()> {
        let base = url::Url::parse(&self.api.base_url).map_err(|e| {
            ParleyError::Config(format!(
                "api.base_url is not a valid URL ({}): {}",
                self.api.base_url, e
            ))
        })?;

        if !matches!(base.scheme(), "http" | "https") {
            return Err(ParleyError::Config(format!(
                "api.base_url must use http or https, got {}",
                base.scheme()
            ))
            .into());
        }

        if self.api.timeout_seconds == 0 {
            return Err(ParleyError::Config(
                "api.timeout_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        if self.credentials.backend != CredentialBackend::File && self.credentials.path.is_some() {
            tracing::warn!(
                "credentials.path is ignored by the {:?} backend",
                self.credentials.backend
            );
        }

        Ok(())
    }
}
