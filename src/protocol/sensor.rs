//! # Sensor Frames
//!
//! Payload of a `sensor_data` message as sent by phones.
//!
//! Every channel is optional; a device without a gyroscope simply omits it.
//! Numeric fields are parsed leniently (`null` and missing become `0.0`).

use serde::{Deserialize, Serialize};

use crate::signal::math::{Angles, Channel, Vec3};

/// One reading from a sensor device.
///
/// # Examples
///
/// ```
/// use motion_relay::protocol::SensorFrame;
///
/// let frame: SensorFrame = serde_json::from_str(
///     r#"{"orientation": {"alpha": 0, "beta": 50, "gamma": 10}}"#,
/// )?;
/// assert_eq!(frame.orientation.unwrap().beta, 50.0);
/// assert!(frame.accelerometer.is_none());
/// # Ok::<(), serde_json::Error>(())
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SensorFrame {
    /// Device orientation in degrees.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orientation: Option<Angles>,

    /// Acceleration including gravity, m/s².
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accelerometer: Option<Vec3>,

    /// Rotation rate in degrees per second.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gyroscope: Option<Angles>,
}

impl SensorFrame {
    /// Returns `true` when no channel is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.orientation.is_none() && self.accelerometer.is_none() && self.gyroscope.is_none()
    }

    /// Copy of the frame with every non-finite component zeroed.
    #[must_use]
    pub fn sanitized(&self) -> Self {
        Self {
            orientation: self.orientation.map(Channel::sanitized),
            accelerometer: self.accelerometer.map(Channel::sanitized),
            gyroscope: self.gyroscope.map(Channel::sanitized),
        }
    }
}
