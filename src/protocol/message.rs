//! # Relay Messages
//!
//! JSON text frames exchanged between devices, game clients and the hub.
//! Every frame is an object with a `type` tag.
//!
//! | Type | Direction | Payload |
//! |------|-----------|---------|
//! | `register` | client → hub | `deviceId`, `timestamp`, `gameType?`, `capabilities?`, `name?`, `role?` |
//! | `sensor_data` | sensor → hub → others | `data` (see [`SensorFrame`]) |
//! | `join` | hub → registered others | `name`, ISO-8601 `timestamp` |
//! | `leave` | hub → registered others | `name`, ISO-8601 `timestamp` |
//!
//! The hub parses inbound frames with [`HubInbound`], which keeps the sensor
//! payload opaque. Game clients parse relayed frames with [`RelayMessage`].
//! Unknown `type` values parse to an `Unknown`/`Other` variant so they can be
//! logged and dropped without an error.

use std::fmt;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use super::sensor::SensorFrame;
use crate::error::{RelayError, Result};

/// Declared or inferred role of a connection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Phone or other device streaming sensor frames.
    Sensor,
    /// Game front-end turning relayed frames into input.
    Consumer,
    /// Nothing declared or observed yet.
    #[default]
    Unknown,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Sensor => write!(f, "sensor"),
            Role::Consumer => write!(f, "consumer"),
            Role::Unknown => write!(f, "unknown"),
        }
    }
}

/// Registration sent by a client right after connecting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Register {
    /// Locally generated, stable for the life of the client.
    pub device_id: String,

    /// Milliseconds since the Unix epoch on the client.
    #[serde(default)]
    pub timestamp: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capabilities: Option<Vec<String>>,

    /// Display name announced in `join`/`leave`. Without one the sender takes
    /// no part in presence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

impl Register {
    /// Creates a registration stamped with the current time.
    #[must_use]
    pub fn new(device_id: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
            timestamp: Some(Utc::now().timestamp_millis() as f64),
            game_type: None,
            capabilities: None,
            name: None,
            role: None,
        }
    }

    /// Name announced in `join`/`leave`, `None` when absent or blank.
    #[must_use]
    pub fn announced_name(&self) -> Option<&str> {
        self.name.as_deref().map(str::trim).filter(|name| !name.is_empty())
    }
}

/// Body of `join` and `leave` notifications.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Presence {
    pub name: String,
    /// ISO-8601 UTC timestamp set by the hub.
    pub timestamp: String,
}

impl Presence {
    /// Creates a presence body stamped with the current UTC time.
    #[must_use]
    pub fn now(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

/// Frames the hub accepts from connections.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HubInbound {
    Register(Register),
    /// The hub never interprets the sensor payload.
    SensorData {
        #[serde(default)]
        data: serde_json::Value,
    },
    #[serde(other)]
    Unknown,
}

/// Frames the hub emits on its own behalf.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HubOutbound {
    Join(Presence),
    Leave(Presence),
}

/// Frames a game client receives from the hub.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RelayMessage {
    SensorData { data: SensorFrame },
    Join(Presence),
    Leave(Presence),
    #[serde(other)]
    Other,
}

/// Frames a client sends to the hub.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientOutbound {
    Register(Register),
    SensorData { data: SensorFrame },
}

/// Parses a frame received by the hub.
///
/// # Errors
///
/// Returns [`RelayError::Protocol`] if the text is not a JSON object with a
/// string `type` field, or a known type has an invalid body.
pub fn parse_hub_inbound(text: &str) -> Result<HubInbound> {
    serde_json::from_str(text)
        .map_err(|e| RelayError::Protocol(format!("Malformed frame: {}", e)))
}

/// Parses a frame received by a game client.
///
/// # Errors
///
/// Returns [`RelayError::Protocol`] on malformed JSON or an invalid body.
pub fn parse_relay_message(text: &str) -> Result<RelayMessage> {
    serde_json::from_str(text)
        .map_err(|e| RelayError::Protocol(format!("Malformed frame: {}", e)))
}

/// Serializes any outbound frame to its JSON text.
///
/// # Errors
///
/// Returns [`RelayError::Json`] if serialization fails.
pub fn encode<T: Serialize>(message: &T) -> Result<String> {
    Ok(serde_json::to_string(message)?)
}
