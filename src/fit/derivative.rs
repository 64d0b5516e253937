//! Forward-difference slopes for fit validation.
//!
//! Offline only: a fitted curve is resampled on a uniform grid and its slopes
//! checked for sign consistency (monotonicity) and smoothness.

use crate::error::{CalibrationError, Result};
use crate::fit::SamplePlan;
use crate::models::FittedCurve;

/// `n - 1` forward-difference slopes `(y[i+1] - y[i]) / step`.
pub fn derivatives(values: &[f64], step: f64) -> Result<Vec<f64>> {
    if values.len() < 2 {
        return Err(CalibrationError::InsufficientSamples {
            needed: 2,
            got: values.len(),
        });
    }
    if !step.is_finite() || step == 0.0 {
        return Err(CalibrationError::InvalidRange {
            min: 0.0,
            max: 0.0,
            step,
        });
    }
    Ok(values.windows(2).map(|w| (w[1] - w[0]) / step).collect())
}

/// Slope summary of a resampled curve.
#[derive(Debug, Clone)]
pub struct CurveValidation {
    pub step: f64,
    pub slopes: Vec<f64>,
    pub min_slope: f64,
    pub max_slope: f64,
    /// All slopes share one sign (zero slopes count as breaking monotonicity).
    pub monotonic: bool,
}

/// Resample `curve` across its domain and summarize its slopes.
pub fn validate_curve(curve: &FittedCurve, step: Option<f64>) -> Result<CurveValidation> {
    let plan = SamplePlan::new(curve.domain.min, curve.domain.max, step)?;
    let samples = curve.resample(&plan)?;
    let step = plan.step().abs();
    let slopes = derivatives(samples.y(), step)?;

    let min_slope = slopes.iter().copied().fold(f64::INFINITY, f64::min);
    let max_slope = slopes.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let monotonic = max_slope < 0.0 || min_slope > 0.0;

    Ok(CurveValidation {
        step,
        slopes,
        min_slope,
        max_slope,
        monotonic,
    })
}
