//! Threshold table and classification.

use serde::{Deserialize, Serialize};

use crate::{Digit, Result, ScaleError};

/// Number of breakpoints (digits 1 through 9).
pub const THRESHOLD_COUNT: usize = 9;

/// Factory breakpoints, indexed by `digit - 1`.
pub const DEFAULT_THRESHOLDS: [f64; THRESHOLD_COUNT] = [
    0.144, 0.281, 0.418, 0.555, 0.692, 0.829, 0.966, 1.103, 1.24,
];

/// Nine strictly increasing breakpoints; `breakpoints[i]` is the minimum
/// reading for digit `i + 1`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "[f64; THRESHOLD_COUNT]", into = "[f64; THRESHOLD_COUNT]")]
pub struct MagnitudeThresholds {
    breakpoints: [f64; THRESHOLD_COUNT],
}

impl Default for MagnitudeThresholds {
    fn default() -> Self {
        Self {
            breakpoints: DEFAULT_THRESHOLDS,
        }
    }
}

impl MagnitudeThresholds {
    /// Build a scale, rejecting non-finite or non-increasing breakpoints.
    pub fn new(breakpoints: [f64; THRESHOLD_COUNT]) -> Result<Self> {
        let mut previous: Option<f64> = None;
        for (index, &value) in breakpoints.iter().enumerate() {
            let digit = index as u8 + 1;
            if !value.is_finite() {
                return Err(ScaleError::NonFiniteThreshold { digit });
            }
            if let Some(previous) = previous {
                if value <= previous {
                    return Err(ScaleError::NotIncreasing {
                        digit,
                        value,
                        previous_digit: digit - 1,
                        previous,
                    });
                }
            }
            previous = Some(value);
        }
        Ok(Self { breakpoints })
    }

    /// Readings at or above this value count as activity.
    pub fn activity_floor(&self) -> f64 {
        self.breakpoints[0]
    }

    /// Highest digit whose breakpoint the reading meets, else 0.
    ///
    /// Walks the table from the top so a quiet reading costs a full scan and
    /// a strong one stops early; either way at most nine comparisons. NaN
    /// meets no breakpoint and classifies as 0.
    pub fn classify(&self, reading: f64) -> Digit {
        self.breakpoints
            .iter()
            .rposition(|&threshold| reading >= threshold)
            .and_then(|index| Digit::new(index as u8 + 1))
            .unwrap_or(Digit::ZERO)
    }

    /// Whether `reading` resets the inactivity count.
    pub fn is_active(&self, reading: f64) -> bool {
        reading >= self.activity_floor()
    }
}

impl TryFrom<[f64; THRESHOLD_COUNT]> for MagnitudeThresholds {
    type Error = ScaleError;

    fn try_from(value: [f64; THRESHOLD_COUNT]) -> Result<Self> {
        Self::new(value)
    }
}

impl From<MagnitudeThresholds> for [f64; THRESHOLD_COUNT] {
    fn from(value: MagnitudeThresholds) -> Self {
        value.breakpoints
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn digit(value: u8) -> Digit {
        Digit::new(value).unwrap()
    }

    #[test]
    fn test_boundaries() {
        let scale = MagnitudeThresholds::default();
        assert_eq!(scale.classify(0.143), digit(0));
        assert_eq!(scale.classify(0.144), digit(1));
        assert_eq!(scale.classify(0.2809), digit(1));
        assert_eq!(scale.classify(0.281), digit(2));
        assert_eq!(scale.classify(1.24), digit(9));
        assert_eq!(scale.classify(2.0), digit(9));
    }

    #[test]
    fn test_every_breakpoint_maps_to_its_digit() {
        let scale = MagnitudeThresholds::default();
        for (index, &threshold) in DEFAULT_THRESHOLDS.iter().enumerate() {
            assert_eq!(scale.classify(threshold), digit(index as u8 + 1));
        }
    }

    #[test]
    fn test_monotonic() {
        let scale = MagnitudeThresholds::default();
        let mut previous = Digit::ZERO;
        // 0.000 .. 1.500 in 0.001 steps
        for step in 0..=1500 {
            let current = scale.classify(step as f64 / 1000.0);
            assert!(current >= previous, "classification dropped at step {step}");
            previous = current;
        }
    }

    #[test]
    fn test_negative_and_nan_are_zero() {
        let scale = MagnitudeThresholds::default();
        assert_eq!(scale.classify(-3.0), Digit::ZERO);
        assert_eq!(scale.classify(f64::NAN), Digit::ZERO);
        assert!(!scale.is_active(f64::NAN));
    }

    #[test]
    fn test_rejects_non_increasing() {
        let mut values = DEFAULT_THRESHOLDS;
        values[4] = values[3];
        assert!(matches!(
            MagnitudeThresholds::new(values),
            Err(ScaleError::NotIncreasing { digit: 5, .. })
        ));
    }

    #[test]
    fn test_rejects_non_finite() {
        let mut values = DEFAULT_THRESHOLDS;
        values[8] = f64::INFINITY;
        assert_eq!(
            MagnitudeThresholds::new(values),
            Err(ScaleError::NonFiniteThreshold { digit: 9 })
        );
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: MagnitudeThresholds =
            serde_json::from_str("[0.1,0.2,0.3,0.4,0.5,0.6,0.7,0.8,0.9]").unwrap();
        assert_eq!(ok.activity_floor(), 0.1);

        let bad = serde_json::from_str::<MagnitudeThresholds>("[0.1,0.2,0.3,0.4,0.5,0.6,0.7,0.8,0.1]");
        assert!(bad.is_err());
    }
}
