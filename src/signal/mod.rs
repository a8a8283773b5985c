//! # Signal Module
//!
//! Numeric building blocks of the sensor pipeline.
//!
//! This module handles:
//! - Sanitizing, clamping, interpolation and deadzones ([`math`])
//! - Rolling sample buffers with moving-average readout ([`history`])
//! - Baseline capture and offset subtraction ([`calibration`])

pub mod calibration;
pub mod history;
pub mod math;

pub use calibration::CalibrationState;
pub use history::SampleHistory;
pub use math::{Angles, Channel, Vec3};
