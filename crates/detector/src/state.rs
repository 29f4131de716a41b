//! Cycle state and per-cycle reports.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use quakelight_scale::Digit;
use serde::{Deserialize, Serialize};

/// Phase of the detection cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum CycleState {
    /// Waiting on the vibration trigger.
    #[default]
    Listening = 0,
    /// Vibration seen, accelerometer being brought up.
    Triggered = 1,
    /// Polling the accelerometer until it goes quiet.
    Monitoring = 2,
    /// Flashing the result and resetting the display.
    Settling = 3,
}

impl CycleState {
    pub fn label(&self) -> &'static str {
        match self {
            CycleState::Listening => "listening",
            CycleState::Triggered => "triggered",
            CycleState::Monitoring => "monitoring",
            CycleState::Settling => "settling",
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            1 => CycleState::Triggered,
            2 => CycleState::Monitoring,
            3 => CycleState::Settling,
            _ => CycleState::Listening,
        }
    }
}

impl std::fmt::Display for CycleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Lock-free view of the controller's current phase, readable from any thread.
#[derive(Debug, Clone, Default)]
pub struct StateHandle(Arc<AtomicU8>);

impl StateHandle {
    pub fn get(&self) -> CycleState {
        CycleState::from_u8(self.0.load(Ordering::Acquire))
    }

    pub(crate) fn set(&self, state: CycleState) {
        self.0.store(state as u8, Ordering::Release);
    }
}

/// Summary of one completed cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleReport {
    /// 1-based cycle number since the controller was built.
    pub cycle: u64,
    /// Digit that was flashed at the end of the cycle.
    pub final_digit: Digit,
    /// Highest reading the sampler saw.
    pub peak_reading: f64,
    /// Polling periods spent monitoring.
    pub periods: u32,
    /// Display writes issued while monitoring.
    pub display_writes: u32,
    pub started_ms: i64,
    pub ended_ms: i64,
}

impl CycleReport {
    pub fn duration_ms(&self) -> i64 {
        self.ended_ms - self.started_ms
    }
}

/// How a call to `run_cycle` ended.
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    Completed(CycleReport),
    Cancelled,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_round_trips_every_state() {
        let handle = StateHandle::default();
        assert_eq!(handle.get(), CycleState::Listening);

        for state in [
            CycleState::Triggered,
            CycleState::Monitoring,
            CycleState::Settling,
            CycleState::Listening,
        ] {
            handle.set(state);
            assert_eq!(handle.get(), state);
        }
    }

    #[test]
    fn test_handle_is_shared_between_clones() {
        let handle = StateHandle::default();
        let observer = handle.clone();
        handle.set(CycleState::Monitoring);
        assert_eq!(observer.get(), CycleState::Monitoring);
    }
}
