//! Display that renders to the log instead of a seven-segment digit.

use std::time::Duration;

use quakelight_detector::{Digit, DigitDisplay, HardwareError};

/// Default time a flash blocks for.
pub const DEFAULT_FLASH_DURATION: Duration = Duration::from_millis(1500);

pub struct ConsoleDisplay {
    current: Digit,
    flash_duration: Duration,
}

impl Default for ConsoleDisplay {
    fn default() -> Self {
        Self::new(DEFAULT_FLASH_DURATION)
    }
}

impl ConsoleDisplay {
    pub fn new(flash_duration: Duration) -> Self {
        tracing::info!("Console display initialised at 0");
        Self {
            current: Digit::ZERO,
            flash_duration,
        }
    }
}

impl DigitDisplay for ConsoleDisplay {
    fn set_digit(&mut self, digit: Digit) -> Result<(), HardwareError> {
        self.current = digit;
        tracing::info!(digit = %digit, "Display shows {digit}");
        Ok(())
    }

    fn current_digit(&self) -> Digit {
        self.current
    }

    fn flash(&mut self) -> Result<(), HardwareError> {
        tracing::info!(digit = %self.current, "Display flashing {}", self.current);
        if !self.flash_duration.is_zero() {
            std::thread::sleep(self.flash_duration);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracks_current_digit() {
        let mut display = ConsoleDisplay::new(Duration::ZERO);
        assert_eq!(display.current_digit(), Digit::ZERO);

        display.set_digit(Digit::new(7).unwrap()).unwrap();
        display.flash().unwrap();
        assert_eq!(display.current_digit(), Digit::new(7).unwrap());

        display.set_digit(Digit::ZERO).unwrap();
        assert_eq!(display.current_digit(), Digit::ZERO);
    }

    #[test]
    fn test_flash_blocks_for_its_duration() {
        let mut display = ConsoleDisplay::new(Duration::from_millis(20));
        let started = std::time::Instant::now();
        display.flash().unwrap();
        assert!(started.elapsed() >= Duration::from_millis(20));
    }
}
