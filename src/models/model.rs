//! Interpolant evaluation for polynomial and spline calibrations.
//!
//! The fitter produces one of two interpolant kinds:
//! - `Polynomial`: ascending coefficients in `u = (x - origin) / scale`
//! - `Spline`: natural cubic spline knots + second derivatives
//!
//! A `FittedCurve` pairs an interpolant with the domain it was fit on and
//! refuses to extrapolate.

use serde::{Deserialize, Serialize};

use crate::domain::{Domain, SampleSet};
use crate::error::{CalibrationError, Result};
use crate::fit::SamplePlan;
use crate::math::{eval_spline, polyval};

/// Polynomial in a centred, scaled abscissa.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polynomial {
    /// Ascending coefficients: `c[0] + c[1] u + c[2] u^2 + ...`.
    pub coefficients: Vec<f64>,
    pub origin: f64,
    pub scale: f64,
}

impl Polynomial {
    pub fn degree(&self) -> usize {
        self.coefficients.len().saturating_sub(1)
    }

    /// Map a raw abscissa onto the fitting coordinate.
    pub fn to_unit(&self, x: f64) -> f64 {
        (x - self.origin) / self.scale
    }

    pub fn eval(&self, x: f64) -> f64 {
        polyval(&self.coefficients, self.to_unit(x))
    }
}

/// Natural cubic interpolating spline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CubicSpline {
    pub knots_x: Vec<f64>,
    pub knots_y: Vec<f64>,
    pub second_derivatives: Vec<f64>,
}

impl CubicSpline {
    pub fn eval(&self, x: f64) -> f64 {
        eval_spline(&self.knots_x, &self.knots_y, &self.second_derivatives, x)
    }
}

/// Tagged-variant interpolant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Interpolant {
    Polynomial(Polynomial),
    Spline(CubicSpline),
}

impl Interpolant {
    pub fn eval(&self, x: f64) -> f64 {
        match self {
            Interpolant::Polynomial(p) => p.eval(x),
            Interpolant::Spline(s) => s.eval(x),
        }
    }

    pub fn display_name(&self) -> String {
        match self {
            Interpolant::Polynomial(p) => format!("polynomial (degree {})", p.degree()),
            Interpolant::Spline(s) => format!("cubic spline ({} knots)", s.knots_x.len()),
        }
    }
}

/// An interpolant plus the closed domain over which it is valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedCurve {
    pub interpolant: Interpolant,
    pub domain: Domain,
}

impl FittedCurve {
    pub fn new(interpolant: Interpolant, domain: Domain) -> Self {
        Self { interpolant, domain }
    }

    /// Evaluate the curve at `x`.
    ///
    /// PIN-diode response is strongly nonlinear near saturation, so anything
    /// outside the fitted domain is an error rather than an extrapolation.
    pub fn eval(&self, x: f64) -> Result<f64> {
        if !self.domain.contains(x) {
            return Err(CalibrationError::OutOfDomain {
                x,
                min: self.domain.min,
                max: self.domain.max,
            });
        }
        Ok(self.interpolant.eval(x))
    }

    /// Curve values at both domain extremes: `(f(min), f(max))`.
    pub fn endpoints(&self) -> (f64, f64) {
        (
            self.interpolant.eval(self.domain.min),
            self.interpolant.eval(self.domain.max),
        )
    }

    /// Re-sample the curve on the abscissas of `plan`.
    ///
    /// Degenerate (reverse-traversal) plans may step outside the domain; those
    /// points fail with `OutOfDomain`.
    pub fn resample(&self, plan: &SamplePlan) -> Result<SampleSet> {
        let x = plan.values();
        let y = x.iter().map(|&xi| self.eval(xi)).collect::<Result<Vec<f64>>>()?;
        SampleSet::canonical(&x, &y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line() -> FittedCurve {
        FittedCurve::new(
            Interpolant::Polynomial(Polynomial {
                coefficients: vec![1.0, 2.0],
                origin: 0.0,
                scale: 1.0,
            }),
            Domain::new(-1.0, 1.0),
        )
    }

    #[test]
    fn eval_inside_domain() {
        let c = line();
        assert_eq!(c.eval(0.5).unwrap(), 2.0);
        assert_eq!(c.eval(-1.0).unwrap(), -1.0);
        assert_eq!(c.endpoints(), (-1.0, 3.0));
    }

    #[test]
    fn eval_outside_domain_fails() {
        let err = line().eval(1.5).unwrap_err();
        assert_eq!(
            err,
            CalibrationError::OutOfDomain {
                x: 1.5,
                min: -1.0,
                max: 1.0
            }
        );
    }

    #[test]
    fn polynomial_evaluates_in_scaled_coordinate() {
        let p = Polynomial {
            coefficients: vec![0.0, 1.0],
            origin: 2.0,
            scale: 4.0,
        };
        assert_eq!(p.eval(6.0), 1.0);
        assert_eq!(p.degree(), 1);
    }

    #[test]
    fn curve_serializes_with_kind_tag() {
        let json = serde_json::to_string(&line()).unwrap();
        assert!(json.contains("\"kind\":\"polynomial\""));
        let back: FittedCurve = serde_json::from_str(&json).unwrap();
        assert_eq!(back, line());
    }
}
