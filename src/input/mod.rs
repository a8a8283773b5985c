//! # Input Module
//!
//! Turns sensor readings (or keyboard/pointer events) into normalized
//! [`GameInput`].
//!
//! This module handles:
//! - Per-game mapping profiles and presets ([`profile`])
//! - Cooldown-gated pulses ([`pulse`])
//! - Profile execution against one reading ([`mapper`])
//! - The live history/calibration/mapping chain ([`pipeline`])
//! - Keyboard and pointer driven fallback ([`simulation`])

pub mod game_input;
pub mod mapper;
pub mod pipeline;
pub mod profile;
pub mod pulse;
pub mod simulation;

pub use game_input::GameInput;
pub use mapper::{InputMapper, MapperInput};
pub use pipeline::SensorPipeline;
pub use profile::{AngleSource, AxisSpec, MappingProfile, Preset, TriggerChannel, TriggerSpec};
pub use pulse::PulseGate;
pub use simulation::{SimButton, SimKey, SimulationFallback, SimulationSettings};
