//! # Relay Protocol Module
//!
//! Wire format of the relay: JSON text frames over a WebSocket.
//!
//! This module handles:
//! - Sensor payload types with lenient numeric parsing
//! - Tagged message enums for the hub and client directions
//! - Presence (`join`/`leave`) bodies with ISO-8601 timestamps

pub mod message;
pub mod sensor;

pub use message::{
    encode, parse_hub_inbound, parse_relay_message, ClientOutbound, HubInbound, HubOutbound,
    Presence, Register, RelayMessage, Role,
};
pub use sensor::SensorFrame;
