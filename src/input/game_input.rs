//! # Game Input
//!
//! The normalized control record handed to game collaborators.

use serde::Serialize;

use crate::signal::math::clamp;

/// Normalized per-device control signal.
///
/// Continuous fields are always within their declared range; the boolean
/// fields are pulses that are `true` for exactly one update.
///
/// # Examples
///
/// ```
/// use motion_relay::input::GameInput;
///
/// let input = GameInput { x: 3.0, brake: -1.0, ..GameInput::default() }.clamped();
/// assert_eq!(input.x, 1.0);
/// assert_eq!(input.brake, 0.0);
/// assert!(!input.jump);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct GameInput {
    /// Horizontal axis (-1.0 to 1.0).
    pub x: f32,
    /// Vertical axis (-1.0 to 1.0).
    pub y: f32,
    /// Brake amount (0.0 to 1.0).
    pub brake: f32,
    /// Throttle/speed amount (0.0 to 1.0).
    pub speed: f32,
    /// Jump pulse.
    pub jump: bool,
    /// Shoot pulse.
    pub shoot: bool,
    /// Generic action pulse.
    pub action: bool,
}

impl GameInput {
    /// Returns a copy with every continuous field forced into range and NaN zeroed.
    #[must_use]
    pub fn clamped(self) -> Self {
        Self {
            x: clamp(self.x, -1.0, 1.0),
            y: clamp(self.y, -1.0, 1.0),
            brake: clamp(self.brake, 0.0, 1.0),
            speed: clamp(self.speed, 0.0, 1.0),
            ..self
        }
    }

    /// Same continuous values with every pulse cleared.
    #[must_use]
    pub fn without_pulses(self) -> Self {
        Self {
            jump: false,
            shoot: false,
            action: false,
            ..self
        }
    }

    /// Returns `true` if any pulse is set.
    #[must_use]
    pub fn any_pulse(&self) -> bool {
        self.jump || self.shoot || self.action
    }
}
