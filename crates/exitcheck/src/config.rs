//! Configuration loading

use anyhow::{Context, Result};
use exitcheck_core::{DEFAULT_MAX_AGE, DEFAULT_MEMO_TTL, ServiceConfig};
use exitcheck_fetch::{DEFAULT_ADDRESS_URL, DEFAULT_LIST_URL, DEFAULT_TIMEOUT_SECS, ExitListClientConfig};
use exitcheck_storage::local::{DEFAULT_LIST_PATH, DEFAULT_TIMESTAMP_PATH};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Remote endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    #[serde(default = "default_list_url")]
    pub list_url: String,
    #[serde(default = "default_address_url")]
    pub address_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            list_url: default_list_url(),
            address_url: default_address_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl SourceConfig {
    pub fn client_config(&self) -> ExitListClientConfig {
        ExitListClientConfig {
            list_url: self.list_url.clone(),
            address_url: self.address_url.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }
}

/// Storage backend kind
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackendKind {
    #[default]
    File,
    Memory,
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackendKind,
    #[serde(default = "default_list_path")]
    pub list_path: String,
    #[serde(default = "default_timestamp_path")]
    pub timestamp_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackendKind::default(),
            list_path: default_list_path(),
            timestamp_path: default_timestamp_path(),
        }
    }
}

/// Cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_max_age_hours")]
    pub max_age_hours: u64,
    /// Zero disables the in-process memo
    #[serde(default = "default_memo_ttl_secs")]
    pub memo_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_age_hours: default_max_age_hours(),
            memo_ttl_secs: default_memo_ttl_secs(),
        }
    }
}

impl CacheConfig {
    pub fn service_config(&self) -> ServiceConfig {
        ServiceConfig {
            max_age: Duration::from_secs(self.max_age_hours.saturating_mul(3600)),
            memo_ttl: (self.memo_ttl_secs > 0).then(|| Duration::from_secs(self.memo_ttl_secs)),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// "pretty" or "json"
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

// Default value functions
fn default_list_url() -> String {
    DEFAULT_LIST_URL.to_string()
}

fn default_address_url() -> String {
    DEFAULT_ADDRESS_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_list_path() -> String {
    DEFAULT_LIST_PATH.to_string()
}

fn default_timestamp_path() -> String {
    DEFAULT_TIMESTAMP_PATH.to_string()
}

fn default_max_age_hours() -> u64 {
    DEFAULT_MAX_AGE.as_secs() / 3600
}

fn default_memo_ttl_secs() -> u64 {
    DEFAULT_MEMO_TTL.as_secs()
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Config {
    /// Load configuration from a file, falling back to defaults if absent
    pub fn load(path: &str) -> Result<Self> {
        let config_path = Path::new(path);

        if !config_path.exists() {
            info!("Config file not found at {}, using defaults", path);
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {}", path))?;

        let config = Self::parse(&content)
            .with_context(|| format!("Failed to parse config file: {}", path))?;

        info!("Loaded configuration from {}", path);
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}
