//! # Calibration Module
//!
//! Stores a baseline ("neutral") reading and subtracts it from live samples.
//!
//! The offset is captured on an explicit user action from the current
//! smoothed mean, persists for the life of the owner and never decays.
//! Capturing from an empty history is a no-op, so a device can never be
//! calibrated against zero samples.
//!
//! ## Usage
//!
//! ```
//! use motion_relay::signal::calibration::CalibrationState;
//! use motion_relay::signal::history::SampleHistory;
//! use motion_relay::signal::math::Angles;
//!
//! let mut history = SampleHistory::new(3)?;
//! let mut cal = CalibrationState::default();
//!
//! // Uncalibrated readings pass through unchanged
//! let reading = Angles::new(0.0, 12.0, -4.0);
//! assert_eq!(cal.apply(reading), reading);
//!
//! history.push(reading);
//! assert!(cal.capture(&history));
//! assert_eq!(cal.apply(reading), Angles::default());
//! # Ok::<(), motion_relay::error::RelayError>(())
//! ```

use tracing::debug;

use super::history::SampleHistory;
use super::math::Channel;

/// Baseline offset for one channel.
#[derive(Debug, Clone, Copy, Default)]
pub struct CalibrationState<T> {
    /// Offset subtracted from every reading. Zero until captured.
    offset: T,
    /// Whether an offset has been captured since creation or the last reset.
    calibrated: bool,
}

impl<T: Channel + std::fmt::Debug> CalibrationState<T> {
    /// Creates an uncalibrated state (zero offset).
    #[must_use]
    pub fn new() -> Self {
        Self {
            offset: T::default(),
            calibrated: false,
        }
    }

    /// Captures the mean of `history` as the new offset.
    ///
    /// # Returns
    ///
    /// `true` if an offset was stored, `false` if the history was empty.
    pub fn capture(&mut self, history: &SampleHistory<T>) -> bool {
        if history.is_empty() {
            debug!("Calibration skipped: no samples buffered");
            return false;
        }
        self.offset = history.mean().sanitized();
        self.calibrated = true;
        debug!("Calibration captured: {:?}", self.offset);
        true
    }

    /// Returns `sample - offset`, with non-finite components zeroed.
    #[must_use]
    pub fn apply(&self, sample: T) -> T {
        (sample.sanitized() - self.offset).sanitized()
    }

    /// Restores the zero offset.
    pub fn reset(&mut self) {
        self.offset = T::default();
        self.calibrated = false;
    }

    /// Returns the stored offset.
    #[must_use]
    pub fn offset(&self) -> T {
        self.offset
    }

    #[must_use]
    pub fn is_calibrated(&self) -> bool {
        self.calibrated
    }
}
