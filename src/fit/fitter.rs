//! Low-level fitting routines for a single sample set.
//!
//! Given:
//! - abscissas `x_i` (ascending or descending)
//! - observed values `y_i`
//! - a fit method (polynomial of degree ≤ 7, or natural cubic spline)
//!
//! we canonicalize the samples to ascending `x`, fit the interpolant, and
//! return it together with the domain `[min(x), max(x)]` it is valid on.

use crate::domain::{Domain, FitMethod, MAX_POLY_DEGREE, SampleSet};
use crate::error::{CalibrationError, Result};
use crate::math::{natural_second_derivatives, polyfit};
use crate::models::{CubicSpline, FittedCurve, Interpolant, Polynomial};

/// Fit `y` as a function of `x`.
pub fn fit_curve(x: &[f64], y: &[f64], method: FitMethod) -> Result<FittedCurve> {
    let samples = SampleSet::canonical(x, y)?;
    fit_samples(&samples, method)
}

/// Fit an already canonical sample set.
pub fn fit_samples(samples: &SampleSet, method: FitMethod) -> Result<FittedCurve> {
    let needed = method.min_samples();
    if samples.len() < needed {
        return Err(CalibrationError::InsufficientSamples {
            needed,
            got: samples.len(),
        });
    }
    let Some(domain) = samples.domain() else {
        return Err(CalibrationError::InsufficientSamples { needed, got: 0 });
    };

    let interpolant = match method {
        FitMethod::Polynomial { degree } => fit_polynomial(samples, domain, degree)?,
        FitMethod::Spline => fit_spline(samples),
    };

    Ok(FittedCurve::new(interpolant, domain))
}

fn fit_polynomial(samples: &SampleSet, domain: Domain, degree: usize) -> Result<Interpolant> {
    if degree == 0 || degree > MAX_POLY_DEGREE {
        return Err(CalibrationError::UnsupportedDegree(degree));
    }

    // Map the domain onto [-1, 1] to keep the Vandermonde matrix conditioned.
    let origin = 0.5 * (domain.min + domain.max);
    let half_span = 0.5 * domain.span();
    let scale = if half_span > 0.0 { half_span } else { 1.0 };

    let u: Vec<f64> = samples.x().iter().map(|&x| (x - origin) / scale).collect();
    let coefficients =
        polyfit(&u, samples.y(), degree).ok_or(CalibrationError::SingularFit { degree })?;

    Ok(Interpolant::Polynomial(Polynomial {
        coefficients,
        origin,
        scale,
    }))
}

fn fit_spline(samples: &SampleSet) -> Interpolant {
    let knots_x = samples.x().to_vec();
    let knots_y = samples.y().to_vec();
    let second_derivatives = natural_second_derivatives(&knots_x, &knots_y);
    Interpolant::Spline(CubicSpline {
        knots_x,
        knots_y,
        second_derivatives,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cubic(v: f64) -> f64 {
        -0.05 * v * v * v + 0.2 * v * v - 2.0 * v - 10.0
    }

    #[test]
    fn polynomial_recovers_exact_cubic() {
        let x: Vec<f64> = (0..28).map(|i| -5.0 + 0.25 * i as f64).collect();
        let y: Vec<f64> = x.iter().map(|&v| cubic(v)).collect();

        let curve = fit_curve(&x, &y, FitMethod::Polynomial { degree: 3 }).unwrap();
        for v in [-4.9, -2.0, 0.0, 1.7] {
            assert!((curve.eval(v).unwrap() - cubic(v)).abs() < 1e-8);
        }
    }

    #[test]
    fn spline_reproduces_knots() {
        let x = [0.0, 0.5, 1.0, 2.0, 3.0];
        let y = [-10.0, -10.5, -12.0, -18.0, -25.0];
        let curve = fit_curve(&x, &y, FitMethod::Spline).unwrap();
        for (&xi, &yi) in x.iter().zip(y.iter()) {
            assert!((curve.eval(xi).unwrap() - yi).abs() < 1e-12);
        }
    }

    #[test]
    fn descending_input_gives_same_domain() {
        let x: Vec<f64> = (0..10).map(|i| i as f64 * 0.5).collect();
        let y: Vec<f64> = x.iter().map(|&v| cubic(v)).collect();
        let mut xr = x.clone();
        let mut yr = y.clone();
        xr.reverse();
        yr.reverse();

        for method in [FitMethod::Spline, FitMethod::Polynomial { degree: 3 }] {
            let fwd = fit_curve(&x, &y, method).unwrap();
            let rev = fit_curve(&xr, &yr, method).unwrap();
            assert_eq!(fwd.domain, rev.domain);
            assert_eq!(fwd.domain, Domain::new(0.0, 4.5));
            assert!((fwd.eval(2.2).unwrap() - rev.eval(2.2).unwrap()).abs() < 1e-9);
        }
    }

    #[test]
    fn evaluation_outside_domain_is_rejected() {
        let curve = fit_curve(&[0.0, 1.0, 2.0], &[0.0, 1.0, 4.0], FitMethod::Spline).unwrap();
        assert!(matches!(
            curve.eval(2.01),
            Err(CalibrationError::OutOfDomain { .. })
        ));
    }

    #[test]
    fn too_few_samples_for_degree() {
        let err = fit_curve(&[0.0, 1.0, 2.0], &[0.0, 1.0, 4.0], FitMethod::Polynomial { degree: 7 })
            .unwrap_err();
        assert_eq!(err, CalibrationError::InsufficientSamples { needed: 8, got: 3 });
    }

    #[test]
    fn degree_above_seven_is_rejected() {
        let x: Vec<f64> = (0..20).map(|i| i as f64).collect();
        let err = fit_curve(&x, &x, FitMethod::Polynomial { degree: 8 }).unwrap_err();
        assert_eq!(err, CalibrationError::UnsupportedDegree(8));
    }

    #[test]
    fn length_mismatch_is_rejected() {
        let err = fit_curve(&[0.0, 1.0], &[0.0], FitMethod::Spline).unwrap_err();
        assert_eq!(err, CalibrationError::LengthMismatch { x: 2, y: 1 });
    }
}
