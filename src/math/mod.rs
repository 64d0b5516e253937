//! Numerical utilities: least squares, cubic splines and root finding.

pub mod ols;
pub mod roots;
pub mod spline;

pub use ols::*;
pub use roots::*;
pub use spline::*;
