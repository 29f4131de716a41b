//! Recorded vibration traces.
//!
//! A trace is a JSON document listing quakes in order:
//!
//! ```json
//! {
//!   "sample_interval_ms": 100,
//!   "events": [
//!     { "delay_ms": 2000, "readings": [0.2, 0.7, 0.4] }
//!   ]
//! }
//! ```
//!
//! Each event fires the trigger `delay_ms` after the controller starts
//! listening; the accelerometer then yields `readings` one per sample
//! interval, and silence after that.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{ReplayError, Result};

/// Default accelerometer sample interval for traces that don't set one.
pub const DEFAULT_SAMPLE_INTERVAL_MS: u64 = 100;

fn default_sample_interval_ms() -> u64 {
    DEFAULT_SAMPLE_INTERVAL_MS
}

/// One recorded quake.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceEvent {
    /// Time between arming the trigger and it firing.
    #[serde(default)]
    pub delay_ms: u64,
    /// Accelerometer magnitudes, one per sample interval.
    pub readings: Vec<f64>,
}

impl TraceEvent {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    pub fn peak(&self) -> f64 {
        self.readings.iter().copied().fold(0.0, f64::max)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayTrace {
    #[serde(default = "default_sample_interval_ms")]
    pub sample_interval_ms: u64,
    pub events: Vec<TraceEvent>,
}

impl ReplayTrace {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ReplayError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let trace = Self::parse(&content, path)?;
        tracing::info!(
            path = %path.display(),
            events = trace.events.len(),
            "Loaded replay trace"
        );
        Ok(trace)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        Self::parse(content, Path::new("<inline>"))
    }

    fn parse(content: &str, path: &Path) -> Result<Self> {
        let trace: Self = serde_json::from_str(content).map_err(|source| ReplayError::Parse {
            path: PathBuf::from(path),
            source,
        })?;
        trace.validate()?;
        Ok(trace)
    }

    pub fn validate(&self) -> Result<()> {
        if self.sample_interval_ms == 0 {
            return Err(ReplayError::Invalid {
                message: "sample_interval_ms must be greater than zero".to_string(),
            });
        }
        for (index, event) in self.events.iter().enumerate() {
            if let Some(bad) = event.readings.iter().find(|r| !r.is_finite() || **r < 0.0) {
                return Err(ReplayError::Invalid {
                    message: format!("event {index} has an invalid reading {bad}"),
                });
            }
        }
        Ok(())
    }

    pub fn sample_interval(&self) -> Duration {
        Duration::from_millis(self.sample_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_with_defaults() {
        let trace = ReplayTrace::from_json(r#"{ "events": [ { "readings": [0.1, 0.9] } ] }"#)
            .unwrap();
        assert_eq!(trace.sample_interval_ms, DEFAULT_SAMPLE_INTERVAL_MS);
        assert_eq!(trace.events[0].delay_ms, 0);
        assert_eq!(trace.events[0].peak(), 0.9);
    }

    #[test]
    fn test_rejects_negative_reading() {
        let result = ReplayTrace::from_json(r#"{ "events": [ { "readings": [0.1, -0.2] } ] }"#);
        assert!(matches!(result, Err(ReplayError::Invalid { .. })));
    }

    #[test]
    fn test_rejects_zero_interval() {
        let result = ReplayTrace::from_json(r#"{ "sample_interval_ms": 0, "events": [] }"#);
        assert!(matches!(result, Err(ReplayError::Invalid { .. })));
    }

    #[test]
    fn test_missing_events_is_parse_error() {
        let result = ReplayTrace::from_json(r#"{ "sample_interval_ms": 10 }"#);
        assert!(matches!(result, Err(ReplayError::Parse { .. })));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quake.json");
        std::fs::write(
            &path,
            r#"{ "sample_interval_ms": 20, "events": [ { "delay_ms": 5, "readings": [0.5] } ] }"#,
        )
        .unwrap();

        let trace = ReplayTrace::load(&path).unwrap();
        assert_eq!(trace.sample_interval(), Duration::from_millis(20));
        assert_eq!(trace.events[0].delay(), Duration::from_millis(5));
    }
}
