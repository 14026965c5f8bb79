//! # Bridge Configuration
//!
//! Loaded once at startup from TOML. Every field has a default, so an empty
//! file (or no file) is a valid configuration.
//!
//! ```toml
//! namespace = "mapbridge"
//! settle_delay_ms = 100
//! ready_timeout_ms = 30000   # 0 waits forever
//! ```

use mapbridge_shared::{BodyId, MapId};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not valid TOML for this schema.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is out of range.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Runtime knobs of the bridge.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Prefix of every element id the bridge derives (mount points, popup bodies).
    pub namespace: String,
    /// Delay between first constructing a map and forcing a size re-measurement.
    pub settle_delay_ms: u64,
    /// Upper bound on waiting for a map that does not exist yet. `0` means no bound.
    pub ready_timeout_ms: u64,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            namespace: "mapbridge".to_string(),
            settle_delay_ms: 100,
            ready_timeout_ms: 30_000,
        }
    }
}

impl BridgeConfig {
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
        if self.namespace.is_empty() {
            return Err(ConfigError::Invalid("namespace must not be empty".into()));
        }
        if self.namespace.chars().any(char::is_whitespace) {
            return Err(ConfigError::Invalid(format!(
                "namespace {:?} must not contain whitespace",
                self.namespace
            )));
        }
        Ok(())
    }

    /// Builder method to set the namespace.
    #[must_use]
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Builder method to set the settle delay.
    #[must_use]
    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Builder method to set the readiness deadline. `None` waits forever.
    #[must_use]
    pub fn with_ready_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.ready_timeout_ms = timeout
            .map_or(0, |t| u64::try_from(t.as_millis()).unwrap_or(u64::MAX).max(1));
        self
    }

    /// Settle delay as a duration.
    #[must_use]
    pub const fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    /// Readiness deadline, if any.
    #[must_use]
    pub const fn ready_timeout(&self) -> Option<Duration> {
        if self.ready_timeout_ms == 0 {
            None
        } else {
            Some(Duration::from_millis(self.ready_timeout_ms))
        }
    }

    /// Mount point a map is constructed on: `<namespace>-map-<id>`.
    #[must_use]
    pub fn mount_id(&self, map_id: MapId) -> String {
        format!("{}-map-{}", self.namespace, map_id.get())
    }

    /// Element holding a popup body: `<namespace>-popup-<body_id>`.
    #[must_use]
    pub fn popup_element_id(&self, body_id: BodyId) -> String {
        format!("{}-popup-{}", self.namespace, body_id.get())
    }
}
