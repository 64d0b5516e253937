//! Fitted interpolants.
//!
//! Interpolants are plain data (serializable) with small, pure evaluation
//! functions so that fitting and inversion code can stay generic.

pub mod model;

pub use model::*;
