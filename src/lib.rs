//! `pin-atten` library crate.
//!
//! Calibration and control of PIN-diode voltage-controlled attenuators:
//!
//! - sweep bias/control voltage against a power meter (`data`)
//! - fit attenuation curves and pick the best bias (`fit`)
//! - invert the fit to set a requested attenuation (`atten`)
//!
//! The binary (`pincal`) is a thin wrapper around this library.

pub mod app;
pub mod atten;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod fit;
pub mod instrument;
pub mod io;
pub mod math;
pub mod models;
pub mod report;
