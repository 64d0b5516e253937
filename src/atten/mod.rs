//! Attenuator calibration state and runtime control.
//!
//! - `calibration`: the per-attenuator fitted state and its lookup table
//! - `inverter`: requested attenuation -> control voltage
//! - `attenuator`: actuation with confirmed-state caching

pub mod attenuator;
pub mod calibration;
pub mod inverter;

pub use attenuator::*;
pub use calibration::*;
pub use inverter::*;
