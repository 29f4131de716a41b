//! Trace-driven trigger and accelerometer.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::JoinHandle;
use std::time::Duration;

use quakelight_detector::{
    sleep_unless_cancelled, AccelerationSampler, CancellationToken, HardwareError, SensorRig,
    TriggerOutcome, VibrationTrigger,
};

use crate::trace::{ReplayTrace, TraceEvent};

/// How often a waiting trigger looks at the shutdown token.
pub const DEFAULT_RECHECK_INTERVAL: Duration = Duration::from_millis(50);

/// Poll interval while the sampler is paused.
const PAUSE_POLL: Duration = Duration::from_millis(1);

#[derive(Debug, Default)]
struct Cursor {
    pending: VecDeque<TraceEvent>,
    /// Event whose trigger fired and whose readings the next sampler plays.
    armed: Option<TraceEvent>,
}

fn lock(cursor: &Mutex<Cursor>) -> MutexGuard<'_, Cursor> {
    cursor.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Replays a [`ReplayTrace`] through the [`SensorRig`] interface.
pub struct ReplayRig {
    cursor: Arc<Mutex<Cursor>>,
    sample_interval: Duration,
    recheck_interval: Duration,
}

impl ReplayRig {
    pub fn new(trace: ReplayTrace) -> Self {
        Self {
            sample_interval: trace.sample_interval(),
            cursor: Arc::new(Mutex::new(Cursor {
                pending: trace.events.into(),
                armed: None,
            })),
            recheck_interval: DEFAULT_RECHECK_INTERVAL,
        }
    }

    pub fn with_recheck_interval(mut self, recheck_interval: Duration) -> Self {
        self.recheck_interval = recheck_interval;
        self
    }

    /// Events not yet replayed.
    pub fn remaining(&self) -> usize {
        lock(&self.cursor).pending.len()
    }
}

impl SensorRig for ReplayRig {
    type Trigger = ReplayTrigger;
    type Sampler = ReplaySampler;

    fn acquire_trigger(&mut self) -> Result<ReplayTrigger, HardwareError> {
        tracing::debug!(remaining = self.remaining(), "Replay trigger armed");
        Ok(ReplayTrigger {
            cursor: Arc::clone(&self.cursor),
            recheck_interval: self.recheck_interval,
        })
    }

    fn acquire_sampler(&mut self) -> Result<ReplaySampler, HardwareError> {
        let readings = lock(&self.cursor)
            .armed
            .take()
            .map(|event| event.readings)
            .unwrap_or_default();
        ReplaySampler::start(readings, self.sample_interval)
    }
}

/// Fires when the next trace event's delay has elapsed.
pub struct ReplayTrigger {
    cursor: Arc<Mutex<Cursor>>,
    recheck_interval: Duration,
}

impl VibrationTrigger for ReplayTrigger {
    fn wait(&mut self, cancel: &CancellationToken) -> Result<TriggerOutcome, HardwareError> {
        let delay = lock(&self.cursor).pending.front().map(TraceEvent::delay);

        let Some(delay) = delay else {
            tracing::info!("Replay trace exhausted, idling until shutdown");
            while sleep_unless_cancelled(self.recheck_interval, self.recheck_interval, cancel) {}
            return Ok(TriggerOutcome::Cancelled);
        };

        if !sleep_unless_cancelled(delay, self.recheck_interval, cancel) {
            return Ok(TriggerOutcome::Cancelled);
        }

        let mut cursor = lock(&self.cursor);
        cursor.armed = cursor.pending.pop_front();
        if let Some(event) = &cursor.armed {
            tracing::info!(
                readings = event.readings.len(),
                peak = event.peak(),
                "Replay trigger fired"
            );
        }
        Ok(TriggerOutcome::Vibration)
    }
}

#[derive(Debug, Default)]
struct Readings {
    current: f64,
    peak: f64,
}

struct Shared {
    readings: Mutex<Readings>,
    paused: AtomicBool,
    running: AtomicBool,
}

impl Shared {
    fn record(&self, value: f64) {
        let mut readings = self
            .readings
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        readings.current = value;
        readings.peak = readings.peak.max(value);
    }

    fn snapshot(&self) -> (f64, f64) {
        let readings = self
            .readings
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        (readings.current, readings.peak)
    }
}

/// Plays a list of readings on a background thread, then silence.
///
/// The thread stops when the sampler is dropped.
pub struct ReplaySampler {
    shared: Arc<Shared>,
    handle: Option<JoinHandle<()>>,
}

impl ReplaySampler {
    pub fn start(readings: Vec<f64>, interval: Duration) -> Result<Self, HardwareError> {
        let shared = Arc::new(Shared {
            readings: Mutex::new(Readings::default()),
            paused: AtomicBool::new(false),
            running: AtomicBool::new(true),
        });

        let mut samples = readings.into_iter();
        // First sample is taken before returning so the first poll sees it.
        shared.record(samples.next().unwrap_or(0.0));

        let thread_shared = Arc::clone(&shared);
        let handle = std::thread::Builder::new()
            .name("quakelight-replay-sampler".to_string())
            .spawn(move || {
                let shared = thread_shared;
                std::thread::sleep(interval);
                while shared.running.load(Ordering::Acquire) {
                    if shared.paused.load(Ordering::Acquire) {
                        std::thread::sleep(PAUSE_POLL);
                        continue;
                    }
                    shared.record(samples.next().unwrap_or(0.0));
                    std::thread::sleep(interval);
                }
            })
            .map_err(|source| HardwareError::Io {
                resource: "accelerometer",
                source,
            })?;

        tracing::info!(interval_ms = interval.as_millis() as u64, "Replay accelerometer active");
        Ok(Self {
            shared,
            handle: Some(handle),
        })
    }
}

impl AccelerationSampler for ReplaySampler {
    fn current_reading(&self) -> f64 {
        self.shared.snapshot().0
    }

    fn peak_reading(&self) -> f64 {
        self.shared.snapshot().1
    }

    fn pause(&self) {
        self.shared.paused.store(true, Ordering::Release);
    }

    fn resume(&self) {
        self.shared.paused.store(false, Ordering::Release);
    }
}

impl ReplaySampler {
    /// Stop the sampling thread. Returns `false` if it panicked.
    fn stop(&mut self) -> bool {
        self.shared.running.store(false, Ordering::Release);
        match self.handle.take().map(JoinHandle::join) {
            Some(Err(_)) => {
                tracing::warn!("Replay sampler thread panicked");
                false
            }
            _ => true,
        }
    }
}

impl Drop for ReplaySampler {
    fn drop(&mut self) {
        if self.stop() {
            tracing::debug!("Replay accelerometer stopped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trace(events: Vec<TraceEvent>) -> ReplayTrace {
        ReplayTrace {
            sample_interval_ms: 1,
            events,
        }
    }

    #[test]
    fn test_sampler_tracks_peak_and_current() {
        let sampler = ReplaySampler::start(vec![0.3, 0.9, 0.1], Duration::from_millis(1)).unwrap();
        assert_eq!(sampler.current_reading(), 0.3);

        std::thread::sleep(Duration::from_millis(50));
        assert_eq!(sampler.peak_reading(), 0.9);
        assert_eq!(sampler.current_reading(), 0.0);
    }

    #[test]
    fn test_paused_sampler_holds_its_reading() {
        let sampler = ReplaySampler::start(vec![0.4, 0.8], Duration::from_millis(20)).unwrap();
        sampler.pause();
        std::thread::sleep(Duration::from_millis(60));
        assert_eq!(sampler.peak_reading(), 0.4);

        sampler.resume();
        std::thread::sleep(Duration::from_millis(80));
        assert_eq!(sampler.peak_reading(), 0.8);
    }

    #[test]
    fn test_stop_joins_thread_once() {
        let mut sampler = ReplaySampler::start(vec![0.2], Duration::from_millis(1)).unwrap();
        assert!(sampler.stop());
        assert!(sampler.handle.is_none());
        assert!(sampler.stop());
    }

    #[test]
    fn test_trigger_hands_event_to_sampler() {
        let mut rig = ReplayRig::new(trace(vec![TraceEvent {
            delay_ms: 5,
            readings: vec![0.6],
        }]));

        let mut trigger = rig.acquire_trigger().unwrap();
        let outcome = trigger.wait(&CancellationToken::new()).unwrap();
        drop(trigger);
        assert_eq!(outcome, TriggerOutcome::Vibration);
        assert_eq!(rig.remaining(), 0);

        let sampler = rig.acquire_sampler().unwrap();
        assert_eq!(sampler.peak_reading(), 0.6);
    }

    #[test]
    fn test_exhausted_trigger_waits_for_cancel() {
        let mut rig = ReplayRig::new(trace(Vec::new()))
            .with_recheck_interval(Duration::from_millis(5));
        let mut trigger = rig.acquire_trigger().unwrap();

        let cancel = CancellationToken::new();
        let remote = cancel.clone();
        let canceller = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(20));
            remote.cancel();
        });

        assert_eq!(trigger.wait(&cancel).unwrap(), TriggerOutcome::Cancelled);
        canceller.join().unwrap();
    }

    #[test]
    fn test_cancel_during_delay_keeps_event() {
        let mut rig = ReplayRig::new(trace(vec![TraceEvent {
            delay_ms: 60_000,
            readings: vec![0.6],
        }]))
        .with_recheck_interval(Duration::from_millis(5));
        let mut trigger = rig.acquire_trigger().unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();

        assert_eq!(trigger.wait(&cancel).unwrap(), TriggerOutcome::Cancelled);
        assert_eq!(rig.remaining(), 1);
    }
}
