//! Reporting utilities: calibration report text and terminal summaries.

pub mod format;

pub use format::*;
