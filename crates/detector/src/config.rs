//! Detector configuration loaded from JSON.
//!
//! Looks for a config file in this order:
//! 1. An explicit path (command line)
//! 2. `~/.config/quakelight/config.json` (platform config dir)
//! 3. Built-in defaults

use std::path::{Path, PathBuf};
use std::time::Duration;

use quakelight_scale::MagnitudeThresholds;
use serde::{Deserialize, Serialize};

use crate::monitor::{MonitorSettings, DEFAULT_INACTIVITY_TIMEOUT, DEFAULT_POLL_INTERVAL};

/// Error loading or validating a config file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Parse error in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Invalid config: {message}")]
    Validation { message: String },
}

/// Tunables for the detection cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Breakpoints for digits 1-9.
    pub thresholds: MagnitudeThresholds,
    /// Accelerometer polling period.
    pub poll_interval_ms: u64,
    /// Quiet time that ends an event.
    pub inactivity_timeout_ms: u64,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            thresholds: MagnitudeThresholds::default(),
            poll_interval_ms: DEFAULT_POLL_INTERVAL.as_millis() as u64,
            inactivity_timeout_ms: DEFAULT_INACTIVITY_TIMEOUT.as_millis() as u64,
        }
    }
}

/// Validated settings handed to the controller.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DetectorSettings {
    pub scale: MagnitudeThresholds,
    pub monitor: MonitorSettings,
}

impl DetectorConfig {
    /// Read and validate a config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        tracing::info!(path = %path.display(), "Loaded detector config");
        Ok(config)
    }

    /// Load `path` if given, else the user config file if it exists, else
    /// defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = path {
            return Self::load(path);
        }

        match default_config_path() {
            Some(path) if path.exists() => Self::load(&path),
            _ => {
                tracing::debug!("No config file, using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::Validation {
                message: "poll_interval_ms must be greater than zero".to_string(),
            });
        }
        if self.inactivity_timeout_ms < self.poll_interval_ms {
            return Err(ConfigError::Validation {
                message: format!(
                    "inactivity_timeout_ms ({}) must be at least poll_interval_ms ({})",
                    self.inactivity_timeout_ms, self.poll_interval_ms
                ),
            });
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn inactivity_timeout(&self) -> Duration {
        Duration::from_millis(self.inactivity_timeout_ms)
    }

    pub fn settings(&self) -> DetectorSettings {
        DetectorSettings {
            scale: self.thresholds,
            monitor: MonitorSettings::from_timeout(self.poll_interval(), self.inactivity_timeout()),
        }
    }
}

/// `<config dir>/quakelight/config.json`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|config| config.join("quakelight").join("config.json"))
}
