//! Domain types used throughout the calibration pipeline.
//!
//! This module defines:
//!
//! - configuration enums (`MethodSpec`, `InversionMode`) and `CalibrationConfig`
//! - sample containers (`SampleSet`, `BiasSweep`, `SweepTable`)
//! - the persisted `CalibrationBundle`

pub mod types;

pub use types::*;
