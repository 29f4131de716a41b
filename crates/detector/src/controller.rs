//! Detection controller - the listen / measure / settle cycle.
//!
//! ```text
//!            vibration              sampler up
//! Listening ──────────► Triggered ───────────► Monitoring
//!     ▲                                            │ quiet for the timeout
//!     │        flash, reset to 0, drop sampler     ▼
//!     └─────────────────────────────────────── Settling
//! ```
//!
//! The trigger lives only while listening and the sampler only from the
//! trigger to the end of settling. The display lives as long as the
//! controller. Everything runs on the caller's thread; there is exactly one
//! monitoring loop per cycle.

use quakelight_scale::Digit;
use tokio_util::sync::CancellationToken;

use crate::config::DetectorSettings;
use crate::error::{DetectorError, Result};
use crate::events::{now_ms, DetectorEvent, EventCallback};
use crate::hardware::{DigitDisplay, SensorRig, TriggerOutcome, VibrationTrigger};
use crate::monitor::{MonitorOutcome, MonitoringLoop};
use crate::state::{CycleOutcome, CycleReport, CycleState, StateHandle};

pub struct DetectionController<R: SensorRig, D: DigitDisplay> {
    rig: R,
    display: D,
    monitor: MonitoringLoop,
    cancel: CancellationToken,
    state: StateHandle,
    callback: Option<EventCallback>,
    cycles: u64,
}

impl<R: SensorRig, D: DigitDisplay> DetectionController<R, D> {
    /// Build a controller that stops once `cancel` fires.
    pub fn new(rig: R, display: D, settings: DetectorSettings, cancel: CancellationToken) -> Self {
        tracing::debug!(
            poll_interval_ms = settings.monitor.poll_interval.as_millis() as u64,
            inactivity_timeout_ms = settings.monitor.inactivity_timeout().as_millis() as u64,
            quiet_periods = settings.monitor.quiet_periods,
            "Detection controller configured"
        );
        Self {
            rig,
            display,
            monitor: MonitoringLoop::new(settings.scale, settings.monitor),
            cancel,
            state: StateHandle::default(),
            callback: None,
            cycles: 0,
        }
    }

    /// Receive [`DetectorEvent`]s on the controller's thread.
    pub fn with_callback(mut self, callback: EventCallback) -> Self {
        self.callback = Some(callback);
        self
    }

    pub fn state(&self) -> CycleState {
        self.state.get()
    }

    /// Shared view of the current phase for other threads.
    pub fn state_handle(&self) -> StateHandle {
        self.state.clone()
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    pub fn completed_cycles(&self) -> u64 {
        self.cycles
    }

    /// Run cycles until shutdown. Returns the number of completed cycles.
    ///
    /// Hardware failures end the run and are returned as-is; nothing is
    /// retried. `Stopped` is emitted either way.
    pub fn run(&mut self) -> Result<u64> {
        tracing::info!("Detection controller started");

        let result = loop {
            if self.cancel.is_cancelled() {
                break Ok(());
            }
            match self.run_cycle() {
                Ok(CycleOutcome::Completed(_)) => {}
                Ok(CycleOutcome::Cancelled) => break Ok(()),
                Err(e) => break Err(e),
            }
        };

        self.emit(DetectorEvent::Stopped {
            completed_cycles: self.cycles,
            timestamp_ms: now_ms(),
        });
        match &result {
            Ok(()) => {
                tracing::info!(completed_cycles = self.cycles, "Detection controller stopped")
            }
            Err(e) => tracing::error!(
                error = %e,
                completed_cycles = self.cycles,
                "Detection controller stopped on hardware failure"
            ),
        }
        result.map(|()| self.cycles)
    }

    /// Run one full cycle from listening back to listening.
    pub fn run_cycle(&mut self) -> Result<CycleOutcome> {
        // Listening
        self.enter(CycleState::Listening);
        tracing::info!("Launching vibration sensor to listen for a vibration");
        let mut trigger = self.rig.acquire_trigger().map_err(DetectorError::Trigger)?;
        self.emit(DetectorEvent::Listening {
            timestamp_ms: now_ms(),
        });
        let outcome = trigger.wait(&self.cancel).map_err(DetectorError::Trigger)?;
        drop(trigger);

        if outcome == TriggerOutcome::Cancelled || self.cancel.is_cancelled() {
            tracing::info!("Stopped listening: shutdown requested");
            return Ok(CycleOutcome::Cancelled);
        }

        // Triggered
        let started_ms = now_ms();
        self.enter(CycleState::Triggered);
        self.emit(DetectorEvent::Triggered {
            timestamp_ms: started_ms,
        });
        tracing::info!("Vibration detected, vibration sensor released, launching accelerometer");
        let sampler = self.rig.acquire_sampler().map_err(DetectorError::Sampler)?;

        // Monitoring
        self.enter(CycleState::Monitoring);
        let callback = self.callback.clone();
        let outcome = self
            .monitor
            .run(&sampler, &mut self.display, &self.cancel, |digit, peak_reading| {
                if let Some(callback) = &callback {
                    callback(DetectorEvent::DigitChanged {
                        digit,
                        peak_reading,
                        timestamp_ms: now_ms(),
                    });
                }
            })?;

        let summary = match outcome {
            MonitorOutcome::Settled(summary) => summary,
            MonitorOutcome::Cancelled(_) => {
                self.reset_display()?;
                drop(sampler);
                self.enter(CycleState::Listening);
                tracing::info!("Accelerometer released: shutdown requested mid-event");
                return Ok(CycleOutcome::Cancelled);
            }
        };

        // Settling
        self.enter(CycleState::Settling);
        tracing::info!(digit = %summary.final_digit, peak = summary.peak_reading, "Event over, flashing magnitude");
        self.display.flash().map_err(DetectorError::Display)?;
        self.reset_display()?;
        drop(sampler);
        tracing::info!("Shutting down accelerometer for inactivity");

        self.cycles += 1;
        let report = CycleReport {
            cycle: self.cycles,
            final_digit: summary.final_digit,
            peak_reading: summary.peak_reading,
            periods: summary.periods,
            display_writes: summary.display_writes,
            started_ms,
            ended_ms: now_ms(),
        };
        tracing::info!(
            cycle = report.cycle,
            digit = %report.final_digit,
            duration_ms = report.duration_ms(),
            "Cycle complete"
        );
        self.emit(DetectorEvent::Settled {
            report: report.clone(),
        });
        self.enter(CycleState::Listening);

        Ok(CycleOutcome::Completed(report))
    }

    fn reset_display(&mut self) -> Result<()> {
        self.display
            .set_digit(Digit::ZERO)
            .map_err(DetectorError::Display)
    }

    fn enter(&self, state: CycleState) {
        let previous = self.state.get();
        if previous != state {
            tracing::debug!(from = %previous, to = %state, "cycle state");
        }
        self.state.set(state);
    }

    fn emit(&self, event: DetectorEvent) {
        if let Some(callback) = &self.callback {
            callback(event);
        }
    }
}
