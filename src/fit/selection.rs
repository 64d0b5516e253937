//! Bias selection by useful attenuation range.
//!
//! For every candidate bias the tool fits power vs. control voltage and
//! computes the useful range from the fit's values at the domain extremes:
//!
//! - `lower = ceil(f(v_max) * 10) / 10`
//! - `upper = floor(f(v_min) * 10) / 10`
//!
//! Both bounds are rounded inward to 0.1 dB so curve-fit noise at the
//! boundaries never reports spurious range.
//!
//! Selection rules:
//! 1. Pick the candidate with the strictly largest `upper - lower`
//!    (the first candidate wins ties).
//! 2. If no candidate has a positive range, the sweep is degenerate (e.g. the
//!    meter saturated everywhere) and nothing is committed.
//! 3. Re-fit the winner against `power - upper` so its output is relative gain.

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::domain::{BiasSweep, FitMethod};
use crate::error::{CalibrationError, Result};
use crate::fit::fitter::fit_curve;
use crate::models::FittedCurve;

/// A bias voltage with its fit and useful range (dBm).
#[derive(Debug, Clone)]
pub struct BiasCandidate {
    pub bias: f64,
    pub curve: FittedCurve,
    pub lower: f64,
    pub upper: f64,
}

impl BiasCandidate {
    /// Fit one bias sweep and derive its useful range.
    pub fn from_sweep(sweep: &BiasSweep, method: FitMethod) -> Result<Self> {
        let curve = fit_curve(&sweep.volts, &sweep.powers, method)?;
        let (lower, upper) = useful_range(&curve);
        Ok(Self {
            bias: sweep.bias,
            curve,
            lower,
            upper,
        })
    }

    pub fn useful_range(&self) -> f64 {
        self.upper - self.lower
    }
}

/// Output of fitting + selection.
#[derive(Debug, Clone)]
pub struct BiasSelection {
    /// Index into `candidates` of the winning bias.
    pub best: usize,
    /// Every bias that produced a fit, in sweep order.
    pub candidates: Vec<BiasCandidate>,
    /// Biases whose fit failed and why (for diagnostics).
    pub skipped: Vec<(f64, String)>,
    /// Winning sweep re-fit as relative gain (`power - upper`).
    pub refit: FittedCurve,
    /// Relative-gain samples behind `refit`, kept for inverse fitting.
    pub relative_gain: Vec<f64>,
    pub volts: Vec<f64>,
}

impl BiasSelection {
    pub fn winner(&self) -> &BiasCandidate {
        &self.candidates[self.best]
    }
}

/// Useful range `(lower, upper)` of a power-vs-voltage fit, rounded inward.
pub fn useful_range(curve: &FittedCurve) -> (f64, f64) {
    let (at_min, at_max) = curve.endpoints();
    let lower = (at_max * 10.0).ceil() / 10.0;
    let upper = (at_min * 10.0).floor() / 10.0;
    (lower, upper)
}

/// Index of the candidate with the strictly largest positive useful range.
pub fn pick_widest(candidates: &[BiasCandidate]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (idx, c) in candidates.iter().enumerate() {
        let range = c.useful_range();
        if !(range.is_finite() && range > 0.0) {
            continue;
        }
        match best {
            Some(b) if candidates[b].useful_range() >= range => {}
            _ => best = Some(idx),
        }
    }
    best
}

/// Fit every bias sweep, select the widest useful range, and re-fit it.
pub fn select_bias(sweeps: &[BiasSweep], method: FitMethod) -> Result<BiasSelection> {
    // Fit each bias independently (parallel); collect keeps sweep order.
    let fits: Vec<(f64, Result<BiasCandidate>)> = sweeps
        .par_iter()
        .map(|sweep| (sweep.bias, BiasCandidate::from_sweep(sweep, method)))
        .collect();

    let mut candidates = Vec::new();
    let mut sweep_index = Vec::new();
    let mut skipped = Vec::new();
    for (idx, (bias, fit)) in fits.into_iter().enumerate() {
        match fit {
            Ok(c) => {
                debug!(
                    bias = c.bias,
                    lower = c.lower,
                    upper = c.upper,
                    "fitted bias candidate"
                );
                candidates.push(c);
                sweep_index.push(idx);
            }
            Err(e) => {
                warn!(bias, error = %e, "skipping bias candidate");
                skipped.push((bias, e.to_string()));
            }
        }
    }

    let Some(best) = pick_widest(&candidates) else {
        return Err(CalibrationError::DegenerateFit);
    };

    let winner = &candidates[best];
    let sweep = &sweeps[sweep_index[best]];

    let relative_gain: Vec<f64> = sweep.powers.iter().map(|p| p - winner.upper).collect();
    let refit = fit_curve(&sweep.volts, &relative_gain, method)?;

    info!(
        bias = winner.bias,
        range_db = winner.useful_range(),
        "selected bias"
    );

    Ok(BiasSelection {
        best,
        volts: sweep.volts.clone(),
        relative_gain,
        refit,
        candidates,
        skipped,
    })
}
