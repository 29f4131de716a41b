//! Vibration detection cycle for QuakeLight.
//!
//! The appliance idles on a binary vibration trigger. When it trips, an
//! accelerometer is brought up and polled until readings have stayed below
//! the lowest magnitude threshold for the inactivity timeout. Meanwhile the
//! running peak is classified and shown on a single-digit display, written
//! only when the digit changes. At the end the digit flashes, the display
//! returns to 0 and the controller listens again.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Domain Layer                             │
//! │  monitor.rs  - inactivity counting, write-on-change display │
//! │  state.rs    - CycleState, CycleReport                      │
//! │  hardware.rs - Traits for trigger, sampler, display         │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   Application Layer                          │
//! │  controller.rs - the listen/monitor/settle state machine    │
//! │  service.rs    - background thread and shutdown             │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use quakelight_detector::{DetectionController, DetectorConfig, DetectorService};
//! use tokio_util::sync::CancellationToken;
//!
//! let config = DetectorConfig::load_or_default(None)?;
//! let controller = DetectionController::new(rig, display, config.settings(), CancellationToken::new());
//! let mut service = DetectorService::spawn(controller)?;
//! // ...
//! service.stop()?;
//! ```

mod config;
mod controller;
mod error;
mod events;
mod hardware;
mod monitor;
mod service;
mod state;

pub use config::{default_config_path, ConfigError, DetectorConfig, DetectorSettings};
pub use controller::DetectionController;
pub use error::{DetectorError, HardwareError, Result};
pub use events::{new_callback, DetectorEvent, EventCallback};
pub use hardware::{
    sleep_unless_cancelled, AccelerationSampler, DigitDisplay, PausedSampler, SensorRig,
    TriggerOutcome, VibrationTrigger,
};
pub use monitor::{
    InactivityCounter, MonitorOutcome, MonitorSettings, MonitorSummary, MonitoringLoop,
    DEFAULT_INACTIVITY_TIMEOUT, DEFAULT_POLL_INTERVAL,
};
pub use service::DetectorService;
pub use state::{CycleOutcome, CycleReport, CycleState, StateHandle};

pub use quakelight_scale::{Digit, MagnitudeThresholds};
pub use tokio_util::sync::CancellationToken;
