//! # Mapping Profiles
//!
//! Per-game description of how sensor readings become [`GameInput`](super::GameInput).
//!
//! A profile is plain data: which orientation angle drives each axis, its
//! sign, gain and deadzone, and which motion channel fires each pulse with
//! what threshold and cooldown. One generic [`InputMapper`](super::InputMapper)
//! executes any profile, so games differ only in configuration.
//!
//! ## Axis Mapping
//!
//! 1. Read the angle (degrees) selected by [`AngleSource`]
//! 2. `|angle| <= deadzone_deg` gives exactly `0.0`
//! 3. Divide by [`FULL_SCALE_DEGREES`] (45°), multiply by `sensitivity`, apply sign
//! 4. Clamp to `[-1, 1]` (auxiliary axes to `[0, 1]`)
//!
//! ## Presets
//!
//! | Preset | x | y | aux | pulses |
//! |--------|---|---|-----|--------|
//! | `tilt` | gamma | beta | - | - |
//! | `racing` | gamma | - | speed (tilt forward), brake (tilt back) | - |
//! | `platformer` | gamma | - | - | jump (accelerometer) |
//! | `shooter` | gamma | beta | - | shoot (accelerometer) |
//! | `flight` | gamma | beta (inverted) | - | action (gyroscope) |
//!
//! ## Usage
//!
//! ```
//! use motion_relay::input::profile::{AngleSource, AxisSpec, MappingProfile, TriggerSpec};
//!
//! let profile = MappingProfile::builder()
//!     .x(AxisSpec::new(AngleSource::Gamma).sensitivity(1.5))
//!     .y(AxisSpec::new(AngleSource::Beta).inverted())
//!     .jump(TriggerSpec::accelerometer(18.0, 400))
//!     .build()?;
//!
//! assert!(profile.jump.is_some());
//! # Ok::<(), motion_relay::error::RelayError>(())
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{RelayError, Result};
use crate::protocol::SensorFrame;
use crate::signal::math::{clamp, deadzone, finite_or_zero, Angles, Channel};

/// Angle that maps to full deflection (±1.0) at sensitivity 1.0.
pub const FULL_SCALE_DEGREES: f32 = 45.0;

/// Orientation angle driving an axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AngleSource {
    /// Compass heading (rotation around z).
    Alpha,
    /// Front/back tilt (rotation around x).
    Beta,
    /// Left/right tilt (rotation around y).
    Gamma,
}

impl AngleSource {
    /// Picks the selected angle from an orientation reading.
    #[must_use]
    pub fn pick(self, angles: &Angles) -> f32 {
        match self {
            AngleSource::Alpha => angles.alpha,
            AngleSource::Beta => angles.beta,
            AngleSource::Gamma => angles.gamma,
        }
    }
}

/// Motion channel whose magnitude fires a pulse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriggerChannel {
    Accelerometer,
    Gyroscope,
}

impl TriggerChannel {
    /// Magnitude of the channel in `frame`, `0.0` when the channel is absent.
    #[must_use]
    pub fn magnitude(self, frame: &SensorFrame) -> f32 {
        match self {
            TriggerChannel::Accelerometer => frame.accelerometer.map_or(0.0, |v| v.magnitude()),
            TriggerChannel::Gyroscope => frame.gyroscope.map_or(0.0, |v| v.magnitude()),
        }
    }
}

/// Mapping of one orientation angle onto one continuous axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisSpec {
    pub source: AngleSource,

    /// Flips the sign so the game's coordinate convention can be matched.
    #[serde(default)]
    pub invert: bool,

    #[serde(default = "default_sensitivity")]
    pub sensitivity: f32,

    /// Deadzone in degrees, checked before scaling.
    #[serde(default = "default_deadzone_deg")]
    pub deadzone_deg: f32,
}

fn default_sensitivity() -> f32 {
    1.0
}

fn default_deadzone_deg() -> f32 {
    5.0
}

fn default_trigger_threshold() -> f32 {
    15.0
}

fn default_cooldown_ms() -> u64 {
    500
}

impl AxisSpec {
    /// Axis with default sensitivity (1.0) and deadzone (5°).
    #[must_use]
    pub fn new(source: AngleSource) -> Self {
        Self {
            source,
            invert: false,
            sensitivity: default_sensitivity(),
            deadzone_deg: default_deadzone_deg(),
        }
    }

    #[must_use]
    pub fn inverted(mut self) -> Self {
        self.invert = !self.invert;
        self
    }

    #[must_use]
    pub fn sensitivity(mut self, sensitivity: f32) -> Self {
        self.sensitivity = sensitivity;
        self
    }

    #[must_use]
    pub fn deadzone(mut self, degrees: f32) -> Self {
        self.deadzone_deg = degrees;
        self
    }

    /// Maps an orientation reading to `[-1, 1]`.
    ///
    /// # Examples
    ///
    /// ```
    /// use motion_relay::input::profile::{AngleSource, AxisSpec};
    /// use motion_relay::signal::math::Angles;
    ///
    /// let axis = AxisSpec::new(AngleSource::Beta).deadzone(5.0);
    /// assert_eq!(axis.map(&Angles::new(0.0, 4.0, 0.0)), 0.0);
    /// assert_eq!(axis.map(&Angles::new(0.0, 90.0, 0.0)), 1.0);
    /// ```
    #[must_use]
    pub fn map(&self, angles: &Angles) -> f32 {
        let angle = deadzone(self.source.pick(angles), self.deadzone_deg);
        if angle == 0.0 {
            return 0.0;
        }
        let sign = if self.invert { -1.0 } else { 1.0 };
        let scaled = angle / FULL_SCALE_DEGREES * finite_or_zero(self.sensitivity) * sign;
        clamp(scaled, -1.0, 1.0)
    }

    /// Maps an orientation reading to `[0, 1]`; the opposite direction reads as `0.0`.
    #[must_use]
    pub fn map_positive(&self, angles: &Angles) -> f32 {
        clamp(self.map(angles), 0.0, 1.0)
    }

    fn validate(&self, name: &str) -> Result<()> {
        if !self.sensitivity.is_finite() || self.sensitivity <= 0.0 || self.sensitivity > 10.0 {
            return Err(RelayError::InvalidConfig(format!(
                "{} sensitivity must be between 0.0 (exclusive) and 10.0",
                name
            )));
        }
        if !self.deadzone_deg.is_finite() || self.deadzone_deg < 0.0 || self.deadzone_deg >= FULL_SCALE_DEGREES {
            return Err(RelayError::InvalidConfig(format!(
                "{} deadzone_deg must be between 0.0 and {}",
                name, FULL_SCALE_DEGREES
            )));
        }
        Ok(())
    }
}

/// Pulse fired when a channel's magnitude exceeds a threshold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TriggerSpec {
    pub channel: TriggerChannel,

    #[serde(default = "default_trigger_threshold")]
    pub threshold: f32,

    #[serde(default = "default_cooldown_ms")]
    pub cooldown_ms: u64,
}

impl TriggerSpec {
    /// Accelerometer-magnitude trigger (m/s², gravity included).
    #[must_use]
    pub fn accelerometer(threshold: f32, cooldown_ms: u64) -> Self {
        Self {
            channel: TriggerChannel::Accelerometer,
            threshold,
            cooldown_ms,
        }
    }

    /// Gyroscope-magnitude trigger (degrees per second).
    #[must_use]
    pub fn gyroscope(threshold: f32, cooldown_ms: u64) -> Self {
        Self {
            channel: TriggerChannel::Gyroscope,
            threshold,
            cooldown_ms,
        }
    }

    #[must_use]
    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }

    /// Returns `true` when the magnitude in `frame` exceeds the threshold.
    #[must_use]
    pub fn is_exceeded(&self, frame: &SensorFrame) -> bool {
        self.channel.magnitude(frame) > self.threshold
    }

    fn validate(&self, name: &str) -> Result<()> {
        if !self.threshold.is_finite() || self.threshold <= 0.0 {
            return Err(RelayError::InvalidConfig(format!(
                "{} threshold must be greater than 0",
                name
            )));
        }
        if self.cooldown_ms > 60000 {
            return Err(RelayError::InvalidConfig(format!(
                "{} cooldown_ms must be between 0 and 60000",
                name
            )));
        }
        Ok(())
    }
}

/// Named starting points for common game styles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    #[default]
    Tilt,
    Racing,
    Platformer,
    Shooter,
    Flight,
}

impl std::str::FromStr for Preset {
    type Err = RelayError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "tilt" => Ok(Preset::Tilt),
            "racing" => Ok(Preset::Racing),
            "platformer" => Ok(Preset::Platformer),
            "shooter" => Ok(Preset::Shooter),
            "flight" => Ok(Preset::Flight),
            other => Err(RelayError::InvalidConfig(format!("unknown preset '{}'", other))),
        }
    }
}

impl Preset {
    /// Builds the profile for this preset.
    #[must_use]
    pub fn profile(self) -> MappingProfile {
        let steer = AxisSpec::new(AngleSource::Gamma);
        let pitch = AxisSpec::new(AngleSource::Beta);
        match self {
            Preset::Tilt => MappingProfile {
                x: Some(steer),
                y: Some(pitch),
                ..MappingProfile::default()
            },
            Preset::Racing => MappingProfile {
                x: Some(steer.sensitivity(1.2)),
                speed: Some(pitch.inverted().deadzone(8.0)),
                brake: Some(pitch.deadzone(8.0)),
                ..MappingProfile::default()
            },
            Preset::Platformer => MappingProfile {
                x: Some(steer),
                jump: Some(TriggerSpec::accelerometer(15.0, 500)),
                ..MappingProfile::default()
            },
            Preset::Shooter => MappingProfile {
                x: Some(steer),
                y: Some(pitch),
                shoot: Some(TriggerSpec::accelerometer(14.0, 300)),
                ..MappingProfile::default()
            },
            Preset::Flight => MappingProfile {
                x: Some(steer.deadzone(3.0)),
                y: Some(pitch.inverted().deadzone(3.0)),
                action: Some(TriggerSpec::gyroscope(250.0, 1000)),
                ..MappingProfile::default()
            },
        }
    }
}

/// Complete per-game mapping description.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MappingProfile {
    #[serde(default)]
    pub x: Option<AxisSpec>,
    #[serde(default)]
    pub y: Option<AxisSpec>,
    #[serde(default)]
    pub brake: Option<AxisSpec>,
    #[serde(default)]
    pub speed: Option<AxisSpec>,
    #[serde(default)]
    pub jump: Option<TriggerSpec>,
    #[serde(default)]
    pub shoot: Option<TriggerSpec>,
    #[serde(default)]
    pub action: Option<TriggerSpec>,
}

impl MappingProfile {
    #[must_use]
    pub fn builder() -> MappingProfileBuilder {
        MappingProfileBuilder::default()
    }

    /// Checks every configured axis and trigger.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::InvalidConfig`] naming the first invalid entry.
    pub fn validate(&self) -> Result<()> {
        for (name, axis) in [
            ("x", &self.x),
            ("y", &self.y),
            ("brake", &self.brake),
            ("speed", &self.speed),
        ] {
            if let Some(axis) = axis {
                axis.validate(name)?;
            }
        }
        for (name, trigger) in [
            ("jump", &self.jump),
            ("shoot", &self.shoot),
            ("action", &self.action),
        ] {
            if let Some(trigger) = trigger {
                trigger.validate(name)?;
            }
        }
        Ok(())
    }
}

/// Builder for [`MappingProfile`].
#[derive(Debug, Clone, Default)]
pub struct MappingProfileBuilder {
    profile: MappingProfile,
}

impl MappingProfileBuilder {
    /// Starts from a preset instead of an empty profile.
    #[must_use]
    pub fn preset(mut self, preset: Preset) -> Self {
        self.profile = preset.profile();
        self
    }

    #[must_use]
    pub fn x(mut self, axis: AxisSpec) -> Self {
        self.profile.x = Some(axis);
        self
    }

    #[must_use]
    pub fn y(mut self, axis: AxisSpec) -> Self {
        self.profile.y = Some(axis);
        self
    }

    #[must_use]
    pub fn brake(mut self, axis: AxisSpec) -> Self {
        self.profile.brake = Some(axis);
        self
    }

    #[must_use]
    pub fn speed(mut self, axis: AxisSpec) -> Self {
        self.profile.speed = Some(axis);
        self
    }

    #[must_use]
    pub fn jump(mut self, trigger: TriggerSpec) -> Self {
        self.profile.jump = Some(trigger);
        self
    }

    #[must_use]
    pub fn shoot(mut self, trigger: TriggerSpec) -> Self {
        self.profile.shoot = Some(trigger);
        self
    }

    #[must_use]
    pub fn action(mut self, trigger: TriggerSpec) -> Self {
        self.profile.action = Some(trigger);
        self
    }

    /// Validates and returns the profile.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::InvalidConfig`] if any entry is out of range.
    pub fn build(self) -> Result<MappingProfile> {
        self.profile.validate()?;
        Ok(self.profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::math::Vec3;

    fn beta(value: f32) -> Angles {
        Angles::new(0.0, value, 0.0)
    }

    // ==================== Axis Tests ====================

    #[test]
    fn test_axis_deadzone_is_exact_zero() {
        let axis = AxisSpec::new(AngleSource::Beta).deadzone(5.0);
        for angle in [-5.0, -4.9, -0.1, 0.0, 0.1, 4.9, 5.0] {
            assert_eq!(axis.map(&beta(angle)), 0.0, "angle {}", angle);
        }
    }

    #[test]
    fn test_axis_deadzone_agrees_with_signal_deadzone() {
        let axis = AxisSpec::new(AngleSource::Beta).deadzone(12.0);
        for angle in [-30.0, -12.0, -11.9, 0.0, 11.9, 12.0, 12.1, 30.0] {
            let expected = crate::signal::math::deadzone(angle, 12.0) == 0.0;
            assert_eq!(axis.map(&beta(angle)) == 0.0, expected, "angle {}", angle);
        }
    }

    #[test]
    fn test_axis_outside_deadzone_is_not_rescaled() {
        let axis = AxisSpec::new(AngleSource::Gamma).deadzone(5.0);
        let value = axis.map(&Angles::new(0.0, 0.0, 10.0));
        assert!((value - 10.0 / 45.0).abs() < 1e-6);
    }

    #[test]
    fn test_axis_is_always_in_range() {
        let axis = AxisSpec::new(AngleSource::Beta).sensitivity(3.0).deadzone(0.0);
        let mut angle = -720.0;
        while angle <= 720.0 {
            let value = axis.map(&beta(angle));
            assert!((-1.0..=1.0).contains(&value), "angle {} gave {}", angle, value);
            angle += 7.5;
        }
    }

    #[test]
    fn test_axis_inversion_and_sensitivity() {
        let axis = AxisSpec::new(AngleSource::Beta).inverted().sensitivity(2.0);
        let value = axis.map(&beta(9.0));
        assert!((value - (-0.4)).abs() < 1e-6);

        // Inverting twice restores the sign
        let axis = AxisSpec::new(AngleSource::Beta).inverted().inverted();
        assert!(!axis.invert);
    }

    #[test]
    fn test_axis_non_finite_angle_is_zero() {
        let axis = AxisSpec::new(AngleSource::Alpha).deadzone(0.0);
        assert_eq!(axis.map(&Angles::new(f32::NAN, 0.0, 0.0)), 0.0);
        assert_eq!(axis.map(&Angles::new(f32::INFINITY, 0.0, 0.0)), 0.0);
    }

    #[test]
    fn test_map_positive() {
        let axis = AxisSpec::new(AngleSource::Beta);
        assert_eq!(axis.map_positive(&beta(-30.0)), 0.0);
        assert!(axis.map_positive(&beta(30.0)) > 0.0);
        assert_eq!(axis.map_positive(&beta(90.0)), 1.0);
    }

    // ==================== Trigger Tests ====================

    #[test]
    fn test_trigger_magnitude() {
        let trigger = TriggerSpec::accelerometer(15.0, 500);
        let calm = SensorFrame {
            accelerometer: Some(Vec3::new(0.0, 9.8, 0.0)),
            ..SensorFrame::default()
        };
        let shake = SensorFrame {
            accelerometer: Some(Vec3::new(12.0, 9.8, 4.0)),
            ..SensorFrame::default()
        };
        assert!(!trigger.is_exceeded(&calm));
        assert!(trigger.is_exceeded(&shake));
        assert!(!trigger.is_exceeded(&SensorFrame::default()));
        assert_eq!(trigger.cooldown(), Duration::from_millis(500));
    }

    #[test]
    fn test_gyroscope_trigger() {
        let trigger = TriggerSpec::gyroscope(100.0, 200);
        let spin = SensorFrame {
            gyroscope: Some(Angles::new(0.0, 0.0, 180.0)),
            ..SensorFrame::default()
        };
        assert!(trigger.is_exceeded(&spin));
    }

    // ==================== Profile Tests ====================

    #[test]
    fn test_builder_validates() {
        let result = MappingProfile::builder()
            .x(AxisSpec::new(AngleSource::Gamma).sensitivity(0.0))
            .build();
        assert!(matches!(result, Err(RelayError::InvalidConfig(_))));

        let result = MappingProfile::builder()
            .x(AxisSpec::new(AngleSource::Gamma).deadzone(-1.0))
            .build();
        assert!(result.is_err());

        let result = MappingProfile::builder()
            .jump(TriggerSpec::accelerometer(0.0, 100))
            .build();
        assert!(result.is_err());

        let result = MappingProfile::builder()
            .shoot(TriggerSpec::accelerometer(10.0, 60001))
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_builder_from_preset() {
        let profile = MappingProfile::builder()
            .preset(Preset::Racing)
            .jump(TriggerSpec::accelerometer(20.0, 800))
            .build()
            .unwrap();
        assert!(profile.speed.is_some());
        assert!(profile.brake.is_some());
        assert!(profile.jump.is_some());
    }

    #[test]
    fn test_all_presets_are_valid() {
        for preset in [
            Preset::Tilt,
            Preset::Racing,
            Preset::Platformer,
            Preset::Shooter,
            Preset::Flight,
        ] {
            assert!(preset.profile().validate().is_ok(), "{:?}", preset);
        }
    }

    #[test]
    fn test_preset_from_str() {
        assert_eq!("Racing".parse::<Preset>().unwrap(), Preset::Racing);
        assert_eq!("flight".parse::<Preset>().unwrap(), Preset::Flight);
        assert!("golf".parse::<Preset>().is_err());
    }

    #[test]
    fn test_profile_from_toml() {
        let profile: MappingProfile = toml::from_str(
            r#"
[x]
source = "gamma"
sensitivity = 1.5

[y]
source = "beta"
invert = true
deadzone_deg = 3.0

[jump]
channel = "accelerometer"
threshold = 18.0
"#,
        )
        .unwrap();

        let x = profile.x.unwrap();
        assert_eq!(x.source, AngleSource::Gamma);
        assert_eq!(x.sensitivity, 1.5);
        assert_eq!(x.deadzone_deg, 5.0);
        assert!(profile.y.unwrap().invert);
        assert_eq!(profile.jump.unwrap().cooldown_ms, 500);
        assert!(profile.brake.is_none());
    }
}
