//! Error types for the detection cycle.

use thiserror::Error;

/// Failure reported by a hardware collaborator.
///
/// The core never retries these: a collaborator that cannot reserve or drive
/// its device ends the controller, and the process decides what to do.
#[derive(Debug, Error)]
pub enum HardwareError {
    /// The device could not be reserved.
    #[error("failed to acquire {resource}: {message}")]
    Acquire {
        resource: &'static str,
        message: String,
    },

    /// A control file or device node could not be read or written.
    #[error("{resource} I/O failed: {source}")]
    Io {
        resource: &'static str,
        #[source]
        source: std::io::Error,
    },

    /// The display refused a digit or an animation.
    #[error("display error: {0}")]
    Display(String),
}

/// Errors that stop the detection controller.
#[derive(Debug, Error)]
pub enum DetectorError {
    #[error("vibration trigger failed: {0}")]
    Trigger(#[source] HardwareError),

    #[error("acceleration sampler failed: {0}")]
    Sampler(#[source] HardwareError),

    #[error("digit display failed: {0}")]
    Display(#[source] HardwareError),

    #[error("failed to spawn detector thread: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("detector thread panicked")]
    WorkerPanicked,
}

pub type Result<T> = std::result::Result<T, DetectorError>;
