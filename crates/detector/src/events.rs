//! Events emitted while the controller runs.

use std::sync::Arc;

use quakelight_scale::Digit;
use serde::{Deserialize, Serialize};

use crate::state::CycleReport;

/// Something observable happened in the detection cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DetectorEvent {
    /// A trigger was armed and the controller is waiting.
    Listening { timestamp_ms: i64 },

    /// The trigger fired; the accelerometer is starting.
    Triggered { timestamp_ms: i64 },

    /// The displayed digit changed during monitoring.
    DigitChanged {
        digit: Digit,
        peak_reading: f64,
        timestamp_ms: i64,
    },

    /// A cycle finished after the inactivity timeout.
    Settled { report: CycleReport },

    /// The controller stopped after a shutdown request.
    Stopped {
        completed_cycles: u64,
        timestamp_ms: i64,
    },
}

impl DetectorEvent {
    pub fn name(&self) -> &'static str {
        match self {
            DetectorEvent::Listening { .. } => "listening",
            DetectorEvent::Triggered { .. } => "triggered",
            DetectorEvent::DigitChanged { .. } => "digit_changed",
            DetectorEvent::Settled { .. } => "settled",
            DetectorEvent::Stopped { .. } => "stopped",
        }
    }
}

/// Callback type for detector events.
pub type EventCallback = Arc<dyn Fn(DetectorEvent) + Send + Sync + 'static>;

pub fn new_callback<F>(f: F) -> EventCallback
where
    F: Fn(DetectorEvent) + Send + Sync + 'static,
{
    Arc::new(f)
}

pub(crate) fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_with_type_tag() {
        let event = DetectorEvent::DigitChanged {
            digit: Digit::new(5).unwrap(),
            peak_reading: 0.7,
            timestamp_ms: 42,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "digit_changed");
        assert_eq!(json["digit"], 5);
        assert_eq!(json["timestamp_ms"], 42);
        assert_eq!(event.name(), "digit_changed");
    }
}
