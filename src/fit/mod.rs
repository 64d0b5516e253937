//! Curve fitting orchestration.
//!
//! Responsibilities:
//!
//! - generate sampling grids (`SamplePlan`)
//! - fit voltage/power curves (polynomial or spline)
//! - select the best bias by useful attenuation range
//! - validate fits by resampled forward differences

pub mod derivative;
pub mod fitter;
pub mod sample_plan;
pub mod selection;

pub use derivative::*;
pub use fitter::*;
pub use sample_plan::*;
pub use selection::*;
