//! # Signal Math
//!
//! Stateless numeric primitives shared by the input pipeline and the
//! simulation fallback: sanitizing, clamping, interpolation, deadzones and
//! the small vector types the sensor channels are made of.
//!
//! Every function here treats NaN and infinities as `0.0` before using them,
//! so a corrupted sample can never leak into game input.
//!
//! ## Usage
//!
//! ```
//! use motion_relay::signal::math::{clamp, deadzone, finite_or_zero};
//!
//! assert_eq!(finite_or_zero(f32::NAN), 0.0);
//! assert_eq!(clamp(2.5, -1.0, 1.0), 1.0);
//! assert_eq!(deadzone(3.0, 5.0), 0.0);
//! assert_eq!(deadzone(-7.0, 5.0), -7.0);
//! ```

use std::ops::{Add, Mul, Sub};

use serde::{Deserialize, Deserializer, Serialize};

/// Maps NaN and ±infinity to `0.0`, passes finite values through.
#[inline]
#[must_use]
pub fn finite_or_zero(value: f32) -> f32 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// Clamps `value` to `[min, max]`. Non-finite input yields `0.0` clamped into range.
#[inline]
#[must_use]
pub fn clamp(value: f32, min: f32, max: f32) -> f32 {
    finite_or_zero(value).clamp(min, max)
}

/// Linear interpolation from `from` to `to` by `t` (`t` is clamped to `[0, 1]`).
#[inline]
#[must_use]
pub fn lerp(from: f32, to: f32, t: f32) -> f32 {
    let from = finite_or_zero(from);
    let to = finite_or_zero(to);
    let t = clamp(t, 0.0, 1.0);
    from + (to - from) * t
}

/// One step of a first-order low-pass filter toward `target`.
///
/// Snaps onto the target once the remaining distance is below `1e-3`, so a
/// released key settles on exactly zero instead of decaying forever.
#[inline]
#[must_use]
pub fn approach(current: f32, target: f32, rate: f32) -> f32 {
    let next = lerp(current, target, rate);
    if (next - target).abs() < 1e-3 {
        target
    } else {
        next
    }
}

/// Returns exactly `0.0` when `|value| <= threshold`, otherwise `value` unchanged.
///
/// Unlike a rescaling deadzone the surviving range is not stretched; the
/// caller decides how to normalize.
#[inline]
#[must_use]
pub fn deadzone(value: f32, threshold: f32) -> f32 {
    let value = finite_or_zero(value);
    if value.abs() <= threshold.abs() {
        0.0
    } else {
        value
    }
}

/// Euclidean length of a 3-component vector.
#[inline]
#[must_use]
pub fn magnitude(x: f32, y: f32, z: f32) -> f32 {
    let (x, y, z) = (finite_or_zero(x), finite_or_zero(y), finite_or_zero(z));
    finite_or_zero((x * x + y * y + z * z).sqrt())
}

/// Deserializes a number leniently: missing, `null` and non-finite values become `0.0`.
pub fn lenient_f32<'de, D>(deserializer: D) -> std::result::Result<f32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<f32>::deserialize(deserializer)?;
    Ok(value.map(finite_or_zero).unwrap_or(0.0))
}

/// Arithmetic a sensor channel needs to be buffered, averaged and calibrated.
pub trait Channel:
    Copy + Default + Add<Output = Self> + Sub<Output = Self> + Mul<f32, Output = Self>
{
    /// Replaces every non-finite component with `0.0`.
    #[must_use]
    fn sanitized(self) -> Self;

    /// Length of the channel seen as a 3-vector.
    #[must_use]
    fn magnitude(&self) -> f32;
}

macro_rules! channel_type {
    ($(#[$meta:meta])* $name:ident { $($field:ident),+ }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
        pub struct $name {
            $(
                #[serde(default, deserialize_with = "lenient_f32")]
                pub $field: f32,
            )+
        }

        impl $name {
            /// Creates a new value from its components.
            #[must_use]
            pub const fn new($($field: f32),+) -> Self {
                Self { $($field),+ }
            }
        }

        impl Add for $name {
            type Output = Self;
            fn add(self, rhs: Self) -> Self {
                Self { $($field: self.$field + rhs.$field),+ }
            }
        }

        impl Sub for $name {
            type Output = Self;
            fn sub(self, rhs: Self) -> Self {
                Self { $($field: self.$field - rhs.$field),+ }
            }
        }

        impl Mul<f32> for $name {
            type Output = Self;
            fn mul(self, rhs: f32) -> Self {
                Self { $($field: self.$field * rhs),+ }
            }
        }

        impl Channel for $name {
            fn sanitized(self) -> Self {
                Self { $($field: finite_or_zero(self.$field)),+ }
            }

            fn magnitude(&self) -> f32 {
                let [a, b, c] = [$(self.$field),+];
                magnitude(a, b, c)
            }
        }
    };
}

channel_type!(
    /// Euler angles in degrees, used for orientation and gyroscope rotation rate.
    Angles { alpha, beta, gamma }
);

channel_type!(
    /// Cartesian vector, used for accelerometer readings.
    Vec3 { x, y, z }
);

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== Sanitizing ====================

    #[test]
    fn test_finite_or_zero() {
        assert_eq!(finite_or_zero(1.5), 1.5);
        assert_eq!(finite_or_zero(f32::NAN), 0.0);
        assert_eq!(finite_or_zero(f32::INFINITY), 0.0);
        assert_eq!(finite_or_zero(f32::NEG_INFINITY), 0.0);
    }

    #[test]
    fn test_clamp_handles_non_finite() {
        assert_eq!(clamp(f32::NAN, -1.0, 1.0), 0.0);
        assert_eq!(clamp(f32::INFINITY, -1.0, 1.0), 0.0);
        assert_eq!(clamp(f32::NAN, 0.5, 1.0), 0.5);
        assert_eq!(clamp(-3.0, -1.0, 1.0), -1.0);
    }

    // ==================== Interpolation ====================

    #[test]
    fn test_lerp() {
        assert_eq!(lerp(0.0, 1.0, 0.0), 0.0);
        assert_eq!(lerp(0.0, 1.0, 1.0), 1.0);
        assert!((lerp(0.0, 1.0, 0.25) - 0.25).abs() < 1e-6);
        // t is clamped
        assert_eq!(lerp(0.0, 1.0, 4.0), 1.0);
    }

    #[test]
    fn test_approach_moves_gradually() {
        let step = approach(0.0, 1.0, 0.15);
        assert!((step - 0.15).abs() < 1e-6);

        let mut value = 0.0;
        for _ in 0..200 {
            value = approach(value, 1.0, 0.15);
        }
        assert_eq!(value, 1.0, "should settle exactly on the target");
    }

    // ==================== Deadzone ====================

    #[test]
    fn test_deadzone_is_exact_zero_inside() {
        assert_eq!(deadzone(5.0, 5.0), 0.0);
        assert_eq!(deadzone(-5.0, 5.0), 0.0);
        assert_eq!(deadzone(0.1, 5.0), 0.0);
    }

    #[test]
    fn test_deadzone_passes_outside_unchanged() {
        assert_eq!(deadzone(5.5, 5.0), 5.5);
        assert_eq!(deadzone(-12.0, 5.0), -12.0);
    }

    // ==================== Channels ====================

    #[test]
    fn test_magnitude() {
        assert!((magnitude(3.0, 4.0, 0.0) - 5.0).abs() < 1e-6);
        assert_eq!(magnitude(f32::NAN, 0.0, 0.0), 0.0);
        assert!((Vec3::new(0.0, 0.0, 9.81).magnitude() - 9.81).abs() < 1e-5);
    }

    #[test]
    fn test_channel_arithmetic() {
        let a = Angles::new(1.0, 2.0, 3.0);
        let b = Angles::new(0.5, 0.5, 0.5);
        assert_eq!(a + b, Angles::new(1.5, 2.5, 3.5));
        assert_eq!(a - b, Angles::new(0.5, 1.5, 2.5));
        assert_eq!(a * 2.0, Angles::new(2.0, 4.0, 6.0));
    }

    #[test]
    fn test_sanitized() {
        let v = Vec3::new(f32::NAN, 1.0, f32::NEG_INFINITY).sanitized();
        assert_eq!(v, Vec3::new(0.0, 1.0, 0.0));
    }

    #[test]
    fn test_lenient_deserialize() {
        let v: Vec3 = serde_json::from_str(r#"{"x": 1.5, "y": null}"#).unwrap();
        assert_eq!(v, Vec3::new(1.5, 0.0, 0.0));

        let a: Angles = serde_json::from_str(r#"{"alpha": 10, "beta": -20.5, "gamma": 3}"#).unwrap();
        assert_eq!(a, Angles::new(10.0, -20.5, 3.0));
    }
}
