//! Input/output helpers.
//!
//! - sweep tables as CSV + calibration report text (`sweep`)
//! - calibration bundles as JSON (`bundle`)

pub mod bundle;
pub mod sweep;

pub use bundle::*;
pub use sweep::*;
