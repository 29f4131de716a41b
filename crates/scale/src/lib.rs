//! Magnitude scale for QuakeLight.
//!
//! Maps a continuous acceleration magnitude onto the single digit (0-9) that
//! the appliance shows on its display. Nine strictly increasing breakpoints
//! define digits 1 through 9; anything below the first breakpoint is 0.
//!
//! Pure domain logic - no I/O, no platform dependencies.
//!
//! # Example
//!
//! ```
//! use quakelight_scale::{Digit, MagnitudeThresholds};
//!
//! let scale = MagnitudeThresholds::default();
//! assert_eq!(scale.classify(0.7), Digit::new(5).unwrap());
//! assert_eq!(scale.classify(0.1), Digit::ZERO);
//! ```

mod digit;
mod thresholds;

pub use digit::Digit;
pub use thresholds::{MagnitudeThresholds, DEFAULT_THRESHOLDS, THRESHOLD_COUNT};

use thiserror::Error;

/// Errors raised when building a scale or digit from untrusted values.
#[derive(Debug, Error, PartialEq)]
pub enum ScaleError {
    #[error("digit {0} is out of range (expected 0-9)")]
    DigitOutOfRange(u8),

    #[error("threshold for digit {digit} is not a finite number")]
    NonFiniteThreshold { digit: u8 },

    #[error("threshold for digit {digit} ({value}) must be greater than the one for digit {previous_digit} ({previous})")]
    NotIncreasing {
        digit: u8,
        value: f64,
        previous_digit: u8,
        previous: f64,
    },
}

pub type Result<T> = std::result::Result<T, ScaleError>;
