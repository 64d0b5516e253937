//! Error types.
//!
//! Library code returns [`CalibrationError`]; the `pincal` binary converts it
//! into an [`AppError`] carrying a process exit code:
//!
//! - `2`: usage, configuration and file errors
//! - `3`: calibration data the fitter cannot use
//! - `4`: numeric or actuation failures

use thiserror::Error;

/// Failures raised by the fitting, inversion and actuation core.
///
/// Every variant is recoverable by the caller. Nothing in this crate retries
/// internally or substitutes a default for a rejected input.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CalibrationError {
    #[error("invalid sampling range: min={min}, max={max}, step={step}")]
    InvalidRange { min: f64, max: f64, step: f64 },

    #[error("{x} is outside the fitted domain [{min}, {max}]")]
    OutOfDomain { x: f64, min: f64, max: f64 },

    #[error("no bias candidate yields a positive useful range")]
    DegenerateFit,

    #[error("requested attenuation {requested} dB is outside [0, {max}] dB")]
    AttenuationOutOfRange { requested: f64, max: f64 },

    #[error("cannot bracket a root for {target} dB on [{lo}, {hi}] V")]
    RootFinding { target: f64, lo: f64, hi: f64 },

    #[error("need at least {needed} samples, got {got}")]
    InsufficientSamples { needed: usize, got: usize },

    #[error("voltage source did not confirm {volts} V")]
    ActuationFailed { volts: f64 },

    #[error("sample vectors differ in length: x={x}, y={y}")]
    LengthMismatch { x: usize, y: usize },

    #[error("non-finite sample at index {index}")]
    InvalidSample { index: usize },

    #[error("{0} is not strictly monotonic")]
    NonMonotonic(String),

    #[error("polynomial degree {0} is outside 1..=7")]
    UnsupportedDegree(usize),

    #[error("least-squares system for a degree {degree} polynomial is singular")]
    SingularFit { degree: usize },

    #[error("inverse-spline inversion selected but the calibration has no inverse fit")]
    MissingInverse,

    #[error("no calibration for channel '{0}'")]
    UnknownChannel(String),

    #[error("instrument error: {0}")]
    Instrument(String),
}

pub type Result<T, E = CalibrationError> = std::result::Result<T, E>;

impl CalibrationError {
    /// Exit code used when this error terminates the binary.
    pub fn exit_code(&self) -> u8 {
        match self {
            CalibrationError::InvalidRange { .. }
            | CalibrationError::AttenuationOutOfRange { .. }
            | CalibrationError::UnknownChannel(_)
            | CalibrationError::UnsupportedDegree(_)
            | CalibrationError::MissingInverse => 2,
            CalibrationError::DegenerateFit
            | CalibrationError::InsufficientSamples { .. }
            | CalibrationError::LengthMismatch { .. }
            | CalibrationError::InvalidSample { .. }
            | CalibrationError::NonMonotonic(_) => 3,
            CalibrationError::OutOfDomain { .. }
            | CalibrationError::RootFinding { .. }
            | CalibrationError::ActuationFailed { .. }
            | CalibrationError::SingularFit { .. }
            | CalibrationError::Instrument(_) => 4,
        }
    }
}

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl From<CalibrationError> for AppError {
    fn from(err: CalibrationError) -> Self {
        AppError::new(err.exit_code(), err.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn calibration_errors_map_to_exit_codes() {
        let app: AppError = CalibrationError::DegenerateFit.into();
        assert_eq!(app.exit_code(), 3);

        let app: AppError = CalibrationError::ActuationFailed { volts: 1.0 }.into();
        assert_eq!(app.exit_code(), 4);
        assert!(app.to_string().contains("1 V"));
    }
}
