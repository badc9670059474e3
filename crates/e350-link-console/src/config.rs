/*
[INPUT]:  YAML configuration file (optional)
[OUTPUT]: Parsed console configuration with defaults for every key
[POS]:    Configuration layer - device address and monitor cadence
[UPDATE]: When adding new configuration options
*/

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use e350_link_adapter::{ClientConfig, DEFAULT_BASE_URL, DEFAULT_POLL_INTERVAL, DeviceClient};
use serde::{Deserialize, Serialize};

/// Top-level configuration for the operator console
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ConsoleConfig {
    pub device: DeviceConfig,
    pub monitor: MonitorConfig,
}

/// Where the controller web service lives
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct DeviceConfig {
    pub base_url: String,
    pub connect_timeout_secs: u64,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            connect_timeout_secs: 10,
        }
    }
}

/// Live view cadence
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Operation log poll period
    pub poll_interval_ms: u64,
    /// Upper bound of the push channel reconnect backoff
    pub reconnect_max_backoff_secs: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: DEFAULT_POLL_INTERVAL.as_millis() as u64,
            reconnect_max_backoff_secs: 30,
        }
    }
}

impl MonitorConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn max_backoff(&self) -> Duration {
        Duration::from_secs(self.reconnect_max_backoff_secs)
    }
}

impl ConsoleConfig {
    /// Load configuration from YAML file
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(&content)
            .with_context(|| format!("parse config {}", path.display()))?;
        Ok(config)
    }

    /// An explicit path must exist; the default path is optional.
    pub fn load(explicit: Option<&Path>) -> anyhow::Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        match default_path() {
            Some(path) if path.is_file() => Self::from_file(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            connect_timeout: Duration::from_secs(self.device.connect_timeout_secs),
            ..ClientConfig::default()
        }
    }

    pub fn build_client(&self) -> anyhow::Result<DeviceClient> {
        DeviceClient::with_config(self.client_config(), &self.device.base_url)
            .with_context(|| format!("device url {}", self.device.base_url))
    }
}

/// `<config_dir>/e350-link/config.yaml`
pub fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("e350-link").join("config.yaml"))
}
