//! # Sensor Pipeline
//!
//! The per-client chain from a relayed [`SensorFrame`] to a [`GameInput`]:
//!
//! ```text
//! SensorFrame ──► SampleHistory (per channel) ──► mean ──► CalibrationState
//!                                                              │
//!          motion channels of this frame ────────────────► InputMapper ──► GameInput
//! ```
//!
//! Channels missing from a frame leave their history untouched. Triggers only
//! see the motion channels of the frame being ingested.

use std::time::Instant;

use tracing::{debug, info};

use super::game_input::GameInput;
use super::mapper::{InputMapper, MapperInput};
use super::profile::MappingProfile;
use crate::error::Result;
use crate::protocol::SensorFrame;
use crate::signal::{Angles, CalibrationState, SampleHistory, Vec3};

/// History, calibration and mapping for one game client.
#[derive(Debug, Clone)]
pub struct SensorPipeline {
    orientation: SampleHistory<Angles>,
    accelerometer: SampleHistory<Vec3>,
    gyroscope: SampleHistory<Angles>,
    calibration: CalibrationState<Angles>,
    mapper: InputMapper,
    frames: u64,
}

impl SensorPipeline {
    /// Creates a pipeline buffering `capacity` samples per channel.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::InvalidConfig`](crate::error::RelayError::InvalidConfig)
    /// if `capacity` is zero or the profile is invalid.
    pub fn new(capacity: usize, profile: MappingProfile) -> Result<Self> {
        profile.validate()?;
        Ok(Self {
            orientation: SampleHistory::new(capacity)?,
            accelerometer: SampleHistory::new(capacity)?,
            gyroscope: SampleHistory::new(capacity)?,
            calibration: CalibrationState::new(),
            mapper: InputMapper::new(profile),
            frames: 0,
        })
    }

    /// Buffers `frame` and maps the smoothed, calibrated result.
    pub fn ingest(&mut self, frame: &SensorFrame, now: Instant) -> GameInput {
        let frame = frame.sanitized();
        if let Some(orientation) = frame.orientation {
            self.orientation.push(orientation);
        }
        if let Some(accelerometer) = frame.accelerometer {
            self.accelerometer.push(accelerometer);
        }
        if let Some(gyroscope) = frame.gyroscope {
            self.gyroscope.push(gyroscope);
        }
        self.frames += 1;

        let reading = MapperInput {
            orientation: self.calibration.apply(self.orientation.mean()),
            motion: frame,
        };
        let input = self.mapper.map(&reading, now);
        debug!("Mapped frame #{}: {:?}", self.frames, input);
        input
    }

    /// Captures the current orientation mean as the neutral pose.
    ///
    /// Returns `false` (and changes nothing) when no orientation has been received.
    pub fn calibrate(&mut self) -> bool {
        let captured = self.calibration.capture(&self.orientation);
        if captured {
            info!("Calibrated neutral orientation: {:?}", self.calibration.offset());
        }
        captured
    }

    pub fn reset_calibration(&mut self) {
        self.calibration.reset();
        info!("Calibration reset");
    }

    #[must_use]
    pub fn is_calibrated(&self) -> bool {
        self.calibration.is_calibrated()
    }

    /// Smoothed orientation before calibration.
    #[must_use]
    pub fn smoothed_orientation(&self) -> Angles {
        self.orientation.mean()
    }

    /// Number of frames ingested so far.
    #[must_use]
    pub fn frames(&self) -> u64 {
        self.frames
    }

    #[must_use]
    pub fn profile(&self) -> &MappingProfile {
        self.mapper.profile()
    }
}
