//! Hardware-free collaborators for QuakeLight.
//!
//! Plays recorded quakes through the detector's trigger and accelerometer
//! traits, and shows the digit in the log. Used by the daemon when no device
//! is attached and by the integration tests.

mod display;
mod rig;
mod trace;

use std::path::PathBuf;

pub use display::{ConsoleDisplay, DEFAULT_FLASH_DURATION};
pub use rig::{ReplayRig, ReplaySampler, ReplayTrigger, DEFAULT_RECHECK_INTERVAL};
pub use trace::{ReplayTrace, TraceEvent, DEFAULT_SAMPLE_INTERVAL_MS};

/// Error loading a replay trace.
#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
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
    #[error("Invalid trace: {message}")]
    Invalid { message: String },
}

pub type Result<T> = std::result::Result<T, ReplayError>;
