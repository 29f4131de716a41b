//! Collaborator traits for the devices the controller drives.
//!
//! These traits abstract the physical trigger, accelerometer and display so
//! the cycle logic stays testable. Releasing a trigger or sampler is dropping
//! it; implementations free their device in `Drop`.

use std::time::{Duration, Instant};

use quakelight_scale::Digit;
use tokio_util::sync::CancellationToken;

use crate::error::HardwareError;

/// How a trigger wait ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// A qualifying vibration was observed.
    Vibration,
    /// The shutdown token fired before any vibration.
    Cancelled,
}

/// Binary vibration sensor that wakes the controller.
pub trait VibrationTrigger: Send {
    /// Block until a vibration is observed or `cancel` fires.
    ///
    /// Implementations must notice cancellation within a bounded time.
    fn wait(&mut self, cancel: &CancellationToken) -> Result<TriggerOutcome, HardwareError>;
}

/// Continuously sampling accelerometer.
///
/// Sampling starts when the sampler is acquired and stops when it is dropped.
pub trait AccelerationSampler: Send {
    /// Latest instantaneous magnitude.
    fn current_reading(&self) -> f64;

    /// Largest magnitude observed since acquisition.
    fn peak_reading(&self) -> f64;

    /// Suspend internal sampling.
    fn pause(&self);

    /// Resume internal sampling after [`pause`](Self::pause).
    fn resume(&self);
}

/// Single-digit display.
pub trait DigitDisplay: Send {
    fn set_digit(&mut self, digit: Digit) -> Result<(), HardwareError>;

    fn current_digit(&self) -> Digit;

    /// Attention animation of the current digit. Blocks until complete.
    fn flash(&mut self) -> Result<(), HardwareError>;
}

/// Source of phase-scoped devices.
///
/// The controller acquires a trigger when it starts listening and a sampler
/// when a vibration arrives; each lives only for its phase.
pub trait SensorRig: Send {
    type Trigger: VibrationTrigger;
    type Sampler: AccelerationSampler;

    fn acquire_trigger(&mut self) -> Result<Self::Trigger, HardwareError>;

    fn acquire_sampler(&mut self) -> Result<Self::Sampler, HardwareError>;
}

/// Sampling is suspended while this guard lives.
///
/// Dropping the guard resumes the sampler, including on an early return.
pub struct PausedSampler<'a, S: AccelerationSampler + ?Sized> {
    sampler: &'a S,
}

impl<'a, S: AccelerationSampler + ?Sized> PausedSampler<'a, S> {
    pub fn new(sampler: &'a S) -> Self {
        sampler.pause();
        Self { sampler }
    }
}

impl<S: AccelerationSampler + ?Sized> Drop for PausedSampler<'_, S> {
    fn drop(&mut self) {
        self.sampler.resume();
    }
}

/// Sleep up to `duration`, waking every `recheck` to look at `cancel`.
///
/// Returns `true` if the full duration elapsed and `false` if cancelled.
/// This is the timeout-and-recheck building block for trigger waits.
pub fn sleep_unless_cancelled(
    duration: Duration,
    recheck: Duration,
    cancel: &CancellationToken,
) -> bool {
    let deadline = Instant::now() + duration;
    loop {
        if cancel.is_cancelled() {
            return false;
        }
        let now = Instant::now();
        if now >= deadline {
            return true;
        }
        let step = (deadline - now).min(recheck.max(Duration::from_millis(1)));
        std::thread::sleep(step);
    }
}
