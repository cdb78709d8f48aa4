//! Engine configuration.
//!
//! Configuration is read from a TOML file. Every field has a default, so an
//! empty file (or no file at all) yields a working configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::ConfigError;

/// Placement of elements created by the engine itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Horizontal distance between a process and its auto-inserted decision
    #[serde(default = "default_decision_offset_x")]
    pub decision_offset_x: f64,

    /// Offset applied to both axes when an element is copied
    #[serde(default = "default_copy_offset")]
    pub copy_offset: f64,

    /// Horizontal distance between a parent process and an inherited child
    #[serde(default = "default_child_offset_x")]
    pub child_offset_x: f64,
}

fn default_decision_offset_x() -> f64 {
    200.0
}

fn default_copy_offset() -> f64 {
    40.0
}

fn default_child_offset_x() -> f64 {
    250.0
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            decision_offset_x: default_decision_offset_x(),
            copy_offset: default_copy_offset(),
            child_offset_x: default_child_offset_x(),
        }
    }
}

/// Access control settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Whether read operations also need a signed-in caller
    #[serde(default)]
    pub require_auth_for_reads: bool,
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive, overridden by `RUST_LOG`
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

/// Snapshot storage settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// File holding the persisted graph tables
    #[serde(default = "default_snapshot_path")]
    pub snapshot_path: PathBuf,
}

fn default_snapshot_path() -> PathBuf {
    PathBuf::from("./procflow.json")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            snapshot_path: default_snapshot_path(),
        }
    }
}

/// Top-level engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub layout: LayoutConfig,

    #[serde(default)]
    pub auth: AuthConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub storage: StorageConfig,
}

impl EngineConfig {
    /// Load configuration from a file, falling back to defaults when no path
    /// is given or the file does not exist.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        if !path.exists() {
            warn!("Configuration file not found: {}", path.display());
            return Ok(Self::default());
        }

        info!("Loading configuration from {}", path.display());
        let raw = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::LoadFailed(format!("{}: {}", path.display(), e)))?;

        let config = Self::from_toml(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from TOML text.
    pub fn from_toml(raw: &str) -> Result<Self, ConfigError> {
        toml::from_str(raw).map_err(|e| ConfigError::ParseFailed(e.to_string()))
    }

    /// Reject values the engine cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let layout = &self.layout;
        for (name, value) in [
            ("layout.decision_offset_x", layout.decision_offset_x),
            ("layout.copy_offset", layout.copy_offset),
            ("layout.child_offset_x", layout.child_offset_x),
        ] {
            if !value.is_finite() {
                return Err(ConfigError::Invalid(format!("{} must be finite", name)));
            }
        }

        if self.logging.level.trim().is_empty() {
            return Err(ConfigError::Invalid("logging.level must not be empty".into()));
        }

        Ok(())
    }
}
