//! # Input Mapper Module
//!
//! Executes a [`MappingProfile`] against one smoothed, calibrated reading.
//!
//! ## Inputs
//!
//! | Field | Source | Used for |
//! |-------|--------|----------|
//! | `orientation` | history mean minus calibration offset | `x`, `y`, `brake`, `speed` |
//! | `motion` | latest raw frame | `jump`, `shoot`, `action` magnitudes |
//!
//! Pulses read the latest raw frame rather than the moving average so a
//! short shake is not averaged away. The only state carried between calls
//! is the cooldown of each pulse.
//!
//! ## Usage
//!
//! ```
//! use std::time::Instant;
//! use motion_relay::input::{InputMapper, MapperInput, Preset};
//! use motion_relay::signal::math::Angles;
//!
//! let mut mapper = InputMapper::new(Preset::Tilt.profile());
//! let reading = MapperInput {
//!     orientation: Angles::new(0.0, 50.0, 10.0),
//!     ..MapperInput::default()
//! };
//! let input = mapper.map(&reading, Instant::now());
//! assert_eq!(input.y, 1.0);
//! assert!((input.x - 10.0 / 45.0).abs() < 1e-6);
//! ```

use std::time::Instant;

use super::game_input::GameInput;
use super::profile::{AxisSpec, MappingProfile, TriggerSpec};
use super::pulse::PulseGate;
use crate::protocol::SensorFrame;
use crate::signal::math::{Angles, Channel};

/// One reading prepared for mapping.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MapperInput {
    /// Smoothed, calibrated orientation in degrees.
    pub orientation: Angles,
    /// Latest raw motion channels, used for pulse magnitudes.
    pub motion: SensorFrame,
}

/// A trigger spec paired with its cooldown state.
#[derive(Debug, Clone)]
struct PulseSlot {
    spec: TriggerSpec,
    gate: PulseGate,
}

impl PulseSlot {
    fn new(spec: TriggerSpec) -> Self {
        Self {
            gate: PulseGate::new(spec.cooldown()),
            spec,
        }
    }

    fn poll(&mut self, motion: &SensorFrame, now: Instant) -> bool {
        self.gate.poll(self.spec.is_exceeded(motion), now)
    }
}

/// Converts readings to [`GameInput`] according to a profile.
#[derive(Debug, Clone)]
pub struct InputMapper {
    profile: MappingProfile,
    jump: Option<PulseSlot>,
    shoot: Option<PulseSlot>,
    action: Option<PulseSlot>,
}

impl InputMapper {
    /// Creates a mapper. The profile is assumed to be validated.
    #[must_use]
    pub fn new(profile: MappingProfile) -> Self {
        Self {
            jump: profile.jump.map(PulseSlot::new),
            shoot: profile.shoot.map(PulseSlot::new),
            action: profile.action.map(PulseSlot::new),
            profile,
        }
    }

    #[must_use]
    pub fn profile(&self) -> &MappingProfile {
        &self.profile
    }

    /// Maps one reading. Unmapped fields stay at their neutral value.
    pub fn map(&mut self, reading: &MapperInput, now: Instant) -> GameInput {
        let orientation = reading.orientation.sanitized();
        let motion = reading.motion.sanitized();

        let axis = |spec: &Option<AxisSpec>| spec.map_or(0.0, |s| s.map(&orientation));
        let aux = |spec: &Option<AxisSpec>| spec.map_or(0.0, |s| s.map_positive(&orientation));

        let pulse = |slot: &mut Option<PulseSlot>| {
            slot.as_mut().is_some_and(|slot| slot.poll(&motion, now))
        };

        GameInput {
            x: axis(&self.profile.x),
            y: axis(&self.profile.y),
            brake: aux(&self.profile.brake),
            speed: aux(&self.profile.speed),
            jump: pulse(&mut self.jump),
            shoot: pulse(&mut self.shoot),
            action: pulse(&mut self.action),
        }
        .clamped()
    }

    /// Clears every pulse cooldown.
    pub fn reset_pulses(&mut self) {
        for slot in [&mut self.jump, &mut self.shoot, &mut self.action]
            .into_iter()
            .flatten()
        {
            slot.gate.reset();
        }
    }
}
