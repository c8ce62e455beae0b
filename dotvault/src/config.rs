//! Configuration management for dotvault.
//!
//! Loads configuration from a TOML file with environment variable overrides.
//! Every section is optional; missing values fall back to defaults.

use crate::{Result, VaultError};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub device: DeviceConfig,
    pub scan: ScanConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Remote store URL
    pub url: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Identifies this machine in backups it creates
    pub id: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Directory names skipped in addition to the built-in list
    pub extra_skip_dirs: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:3000".to_string(),
            timeout_secs: 30,
        }
    }
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            id: hostname::get()
                .ok()
                .and_then(|h| h.into_string().ok())
                .unwrap_or_else(|| "unknown-device".to_string()),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| VaultError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml(&content)
            .map_err(|e| VaultError::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn from_toml(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Apply `DOTVAULT_*` environment variables on top of file values.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    fn with_overrides(mut self, var: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = var("DOTVAULT_SERVER_URL") {
            self.server.url = url;
        }
        if let Some(id) = var("DOTVAULT_DEVICE_ID") {
            self.device.id = id;
        }
        if let Some(level) = var("DOTVAULT_LOG_LEVEL") {
            self.log.level = level;
        }
        self
    }
}
