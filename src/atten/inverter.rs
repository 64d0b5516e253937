//! Requested attenuation -> control voltage.
//!
//! Public attenuation values are non-negative dB magnitudes measured from the
//! reference gain, the forward fit at the low end of its domain. An
//! attenuation `a` is therefore the relative gain `reference - a`. Legacy
//! callers pass attenuation as a negative gain delta; those requests are
//! negated on the way in.
//!
//! Two inversion paths exist and the caller picks one explicitly:
//! - `Bisection` solves `forward(v) = reference - a` over the forward domain
//! - `InverseSpline` evaluates a directly fitted gain -> voltage spline at
//!   `reference - a`

use crate::domain::InversionMode;
use crate::error::{CalibrationError, Result};
use crate::math::{BISECT_TOL, bisect};
use crate::models::FittedCurve;

/// Gain slack (dB) absorbed at the ends of a fit.
const GAIN_TOL: f64 = 1e-9;

/// Borrowed view of the fits needed to invert one calibration.
#[derive(Debug, Clone, Copy)]
pub struct AttenuationInverter<'a> {
    forward: &'a FittedCurve,
    inverse: Option<&'a FittedCurve>,
    mode: InversionMode,
    max_attenuation: f64,
}

impl<'a> AttenuationInverter<'a> {
    pub fn new(
        forward: &'a FittedCurve,
        inverse: Option<&'a FittedCurve>,
        mode: InversionMode,
        max_attenuation: f64,
    ) -> Self {
        Self {
            forward,
            inverse,
            mode,
            max_attenuation,
        }
    }

    pub fn max_attenuation(&self) -> f64 {
        self.max_attenuation
    }

    /// Normalize the sign of `requested` and check it against the ceiling.
    pub fn normalize(&self, requested: f64) -> Result<f64> {
        let a = requested.abs();
        if !a.is_finite() || a > self.max_attenuation {
            return Err(CalibrationError::AttenuationOutOfRange {
                requested,
                max: self.max_attenuation,
            });
        }
        Ok(a)
    }

    /// Relative gain (dB) that zero attenuation maps to.
    pub fn reference_gain(&self) -> f64 {
        self.forward.endpoints().0
    }

    /// Largest attenuation (dB) the selected inversion path can realize,
    /// independent of the configured ceiling.
    pub fn reachable(&self) -> Result<f64> {
        let reference = self.reference_gain();
        let floor = match self.mode {
            InversionMode::Bisection => self.forward.endpoints().1,
            InversionMode::InverseSpline => {
                self.inverse.ok_or(CalibrationError::MissingInverse)?.domain.min
            }
        };
        Ok((reference - floor).max(0.0))
    }

    /// Control voltage realizing `requested` dB of attenuation.
    pub fn voltage_for(&self, requested: f64) -> Result<f64> {
        let a = self.normalize(requested)?;
        let target = self.reference_gain() - a;
        match self.mode {
            InversionMode::Bisection => self.solve_forward(a, target),
            InversionMode::InverseSpline => self.eval_inverse(requested, target),
        }
    }

    fn solve_forward(&self, a: f64, target: f64) -> Result<f64> {
        let lo = self.forward.domain.min;
        let hi = self.forward.domain.max;
        let forward = self.forward;
        if let Some(v) = bisect(|v| Ok(forward.eval(v)? - target), lo, hi, BISECT_TOL)? {
            return Ok(v);
        }
        // Requests at either end of the range can miss the bracket by rounding.
        let (at_lo, at_hi) = forward.endpoints();
        if (at_hi - target).abs() <= GAIN_TOL {
            Ok(hi)
        } else if (at_lo - target).abs() <= GAIN_TOL {
            Ok(lo)
        } else {
            Err(CalibrationError::RootFinding { target: a, lo, hi })
        }
    }

    fn eval_inverse(&self, requested: f64, target: f64) -> Result<f64> {
        let inverse = self.inverse.ok_or(CalibrationError::MissingInverse)?;
        if target < inverse.domain.min - GAIN_TOL {
            return Err(CalibrationError::AttenuationOutOfRange {
                requested,
                max: self.reachable()?.min(self.max_attenuation),
            });
        }
        // A polynomial reference can sit above the highest measured gain by
        // its residual; the top of the inverse fit is the least attenuation.
        let gain = target.clamp(inverse.domain.min, inverse.domain.max);
        inverse.eval(gain)
    }
}
