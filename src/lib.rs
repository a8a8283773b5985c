//! # Motion Relay Library
//!
//! Relay phone motion sensors to game clients and turn them into game input.
//!
//! A hub accepts WebSocket connections and forwards every `sensor_data`
//! frame to the other participants. Each game runs a client that smooths,
//! calibrates and maps relayed readings into a normalized [`input::GameInput`],
//! and falls back to keyboard/pointer simulation whenever no live sensor
//! stream is available.

pub mod client;
pub mod config;
pub mod error;
pub mod hub;
pub mod input;
pub mod logging;
pub mod protocol;
pub mod signal;
