//! Monitoring loop - polls the accelerometer until it has been quiet long enough.

use std::time::Duration;

use quakelight_scale::{Digit, MagnitudeThresholds};
use tokio_util::sync::CancellationToken;

use crate::error::{DetectorError, HardwareError, Result};
use crate::hardware::{sleep_unless_cancelled, AccelerationSampler, DigitDisplay, PausedSampler};

/// Default polling period.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Default quiet time before an event is considered over.
pub const DEFAULT_INACTIVITY_TIMEOUT: Duration = Duration::from_secs(10);

/// How often a sleeping poll looks at the shutdown token.
const CANCEL_RECHECK: Duration = Duration::from_millis(10);

/// Polling cadence and patience of the monitoring loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorSettings {
    /// Sleep between polls.
    pub poll_interval: Duration,
    /// Consecutive quiet polls that end monitoring.
    pub quiet_periods: u32,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self::from_timeout(DEFAULT_POLL_INTERVAL, DEFAULT_INACTIVITY_TIMEOUT)
    }
}

impl MonitorSettings {
    /// Derive the quiet-period target as `timeout / poll_interval` (at least 1).
    pub fn from_timeout(poll_interval: Duration, inactivity_timeout: Duration) -> Self {
        let quiet_periods = if poll_interval.is_zero() {
            1
        } else {
            let periods = inactivity_timeout.as_nanos() / poll_interval.as_nanos();
            u32::try_from(periods).unwrap_or(u32::MAX).max(1)
        };
        Self {
            poll_interval,
            quiet_periods,
        }
    }

    pub fn inactivity_timeout(&self) -> Duration {
        self.poll_interval.saturating_mul(self.quiet_periods)
    }
}

/// Counts consecutive quiet polls.
///
/// Any active reading starts the count over, so a shake with short pauses
/// keeps the event open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InactivityCounter {
    quiet: u32,
    target: u32,
}

impl InactivityCounter {
    pub fn new(target: u32) -> Self {
        Self { quiet: 0, target }
    }

    /// Record one poll. Returns `true` once the quiet target is reached.
    pub fn record(&mut self, active: bool) -> bool {
        if active {
            self.quiet = 0;
        } else {
            self.quiet = self.quiet.saturating_add(1);
        }
        self.is_settled()
    }

    pub fn quiet_periods(&self) -> u32 {
        self.quiet
    }

    pub fn is_settled(&self) -> bool {
        self.quiet >= self.target
    }
}

/// What the loop observed before it returned.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonitorSummary {
    /// Digit on the display when monitoring ended.
    pub final_digit: Digit,
    pub peak_reading: f64,
    pub periods: u32,
    pub display_writes: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MonitorOutcome {
    /// The quiet target was reached.
    Settled(MonitorSummary),
    /// Shutdown was requested mid-event.
    Cancelled(MonitorSummary),
}

/// Polls a sampler, keeps the display in step with the peak, and returns
/// after a run of quiet polls.
#[derive(Debug, Clone, Copy)]
pub struct MonitoringLoop {
    scale: MagnitudeThresholds,
    settings: MonitorSettings,
}

impl MonitoringLoop {
    pub fn new(scale: MagnitudeThresholds, settings: MonitorSettings) -> Self {
        Self { scale, settings }
    }

    /// Run until `quiet_periods` consecutive readings fall below the lowest
    /// threshold.
    ///
    /// Each period classifies the running peak (writing the display only on
    /// change), then feeds the instantaneous reading to the inactivity
    /// counter, then sleeps. `cancel` is checked at the top of every period
    /// and during the sleep.
    /// `on_change` is called after each display write.
    pub fn run<S, D, F>(
        &self,
        sampler: &S,
        display: &mut D,
        cancel: &CancellationToken,
        mut on_change: F,
    ) -> Result<MonitorOutcome>
    where
        S: AccelerationSampler + ?Sized,
        D: DigitDisplay + ?Sized,
        F: FnMut(Digit, f64),
    {
        let mut counter = InactivityCounter::new(self.settings.quiet_periods);
        let mut summary = MonitorSummary {
            final_digit: display.current_digit(),
            peak_reading: 0.0,
            periods: 0,
            display_writes: 0,
        };

        loop {
            if cancel.is_cancelled() {
                tracing::debug!(periods = summary.periods, "Monitoring cancelled");
                summary.final_digit = display.current_digit();
                return Ok(MonitorOutcome::Cancelled(summary));
            }

            summary.periods += 1;

            let peak = sampler.peak_reading();
            summary.peak_reading = peak;
            if let Some(digit) = self
                .show_magnitude(sampler, display, peak)
                .map_err(DetectorError::Display)?
            {
                summary.display_writes += 1;
                on_change(digit, peak);
            }

            let current = sampler.current_reading();
            let settled = counter.record(self.scale.is_active(current));
            tracing::trace!(
                current,
                peak,
                quiet = counter.quiet_periods(),
                "accelerometer poll"
            );
            if settled {
                break;
            }

            if !self.settings.poll_interval.is_zero()
                && !sleep_unless_cancelled(self.settings.poll_interval, CANCEL_RECHECK, cancel)
            {
                tracing::debug!(periods = summary.periods, "Monitoring cancelled between polls");
                summary.final_digit = display.current_digit();
                return Ok(MonitorOutcome::Cancelled(summary));
            }
        }

        summary.final_digit = display.current_digit();
        tracing::debug!(
            periods = summary.periods,
            peak = summary.peak_reading,
            digit = %summary.final_digit,
            "Accelerometer quiet"
        );
        Ok(MonitorOutcome::Settled(summary))
    }

    /// Classify `peak` and write it to the display if it differs from what
    /// is shown. The write happens with sampling paused.
    ///
    /// Returns the digit written, or `None` when the display was already
    /// current.
    pub fn show_magnitude<S, D>(
        &self,
        sampler: &S,
        display: &mut D,
        peak: f64,
    ) -> std::result::Result<Option<Digit>, HardwareError>
    where
        S: AccelerationSampler + ?Sized,
        D: DigitDisplay + ?Sized,
    {
        let digit = self.scale.classify(peak);
        if digit == display.current_digit() {
            return Ok(None);
        }

        let _paused = PausedSampler::new(sampler);
        display.set_digit(digit)?;
        tracing::debug!(digit = %digit, peak, "Magnitude changed");
        Ok(Some(digit))
    }
}
