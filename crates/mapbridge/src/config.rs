//! Host configuration, loaded once at startup.
//!
//! ```toml
//! outbound_buffer = 1024
//! log_level = "info"
//!
//! [bridge]
//! namespace = "mapbridge"
//! settle_delay_ms = 100
//! ready_timeout_ms = 30000
//! ```

use std::path::Path;

use mapbridge_core::{BridgeConfig, ConfigError};
use serde::{Deserialize, Serialize};

/// Everything the host binary needs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Bridge settings.
    pub bridge: BridgeConfig,
    /// Capacity of the queue feeding the stdout writer.
    pub outbound_buffer: usize,
    /// Log level used when `MAPBRIDGE_LOG` is not set.
    pub log_level: String,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            bridge: BridgeConfig::default(),
            outbound_buffer: 1024,
            log_level: "info".to_string(),
        }
    }
}

impl HostConfig {
    /// Parses a TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    /// Checks value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.outbound_buffer == 0 {
            return Err(ConfigError::Invalid(
                "outbound_buffer must be at least 1".into(),
            ));
        }
        self.bridge.validate()
    }

    /// Builder method to set the bridge settings.
    #[must_use]
    pub fn with_bridge(mut self, bridge: BridgeConfig) -> Self {
        self.bridge = bridge;
        self
    }
}
