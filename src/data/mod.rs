//! Calibration data acquisition.
//!
//! - `sweep`: drive a voltage source + power meter across biases and a control grid
//! - `simulate`: seeded PIN-diode bench for running the pipeline without hardware

pub mod simulate;
pub mod sweep;

pub use simulate::*;
pub use sweep::*;
