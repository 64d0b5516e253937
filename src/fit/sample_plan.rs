//! Sampling grid generation.
//!
//! Both calibration sweeps and fit validation sample on step-aligned grids:
//! every abscissa is an integer multiple of the step. Calibration tables then
//! carry round, reproducible voltages (`-1.25`, `-1.00`, ...) rather than
//! arbitrary fractions of the requested range.

use crate::error::{CalibrationError, Result};

/// Number of samples targeted when the step is derived automatically.
const AUTO_SAMPLES: f64 = 100.0;

/// Upper bound on the number of samples in one plan.
const MAX_SAMPLES: f64 = 10_000_000.0;

/// Slack (in units of one step) when snapping bounds onto step multiples.
const TICK_EPS: f64 = 1e-9;

/// An ordered, step-aligned set of abscissas.
///
/// A negative `step` marks a plan that was expanded outward because the
/// requested range held no interior interval; it is traversed high to low.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplePlan {
    start: f64,
    stop: f64,
    step: f64,
    first_tick: f64,
    count: usize,
}

impl SamplePlan {
    /// Plan samples covering `[min, max]`.
    ///
    /// With `step = None` the step is derived from the range (see [`auto_step`]).
    pub fn new(min: f64, max: f64, step: Option<f64>) -> Result<Self> {
        let invalid = |step: f64| CalibrationError::InvalidRange { min, max, step };

        if !(min.is_finite() && max.is_finite()) || max < min {
            return Err(invalid(step.unwrap_or(f64::NAN)));
        }
        let step = match step {
            Some(s) => s,
            None => auto_step(min, max)?,
        };
        if !step.is_finite() || step <= 0.0 {
            return Err(invalid(step));
        }

        let k_lo = (min / step - TICK_EPS).ceil();
        let k_hi = (max / step + TICK_EPS).floor();

        let ticks = k_hi - k_lo + 1.0;
        if !(ticks.is_finite() && ticks <= MAX_SAMPLES) {
            return Err(invalid(step));
        }

        if k_lo < k_hi {
            let count = ticks as usize;
            return Ok(Self {
                start: (k_lo * step).clamp(min, max),
                stop: (k_hi * step).clamp(min, max),
                step,
                first_tick: k_lo,
                count,
            });
        }

        // No interior interval: anchor on the aligned tick nearest zero and add
        // one tick further from zero, then walk the pair downward.
        let anchor = if k_lo.abs() <= k_hi.abs() { k_lo } else { k_hi };
        let far = if anchor >= 0.0 { anchor + 1.0 } else { anchor - 1.0 };
        let (hi, lo) = if far > anchor { (far, anchor) } else { (anchor, far) };
        Ok(Self {
            start: hi * step,
            stop: lo * step,
            step: -step,
            first_tick: hi,
            count: 2,
        })
    }

    pub fn start(&self) -> f64 {
        self.start
    }

    pub fn stop(&self) -> f64 {
        self.stop
    }

    /// Signed step; negative for an expanded, reverse-traversal plan.
    pub fn step(&self) -> f64 {
        self.step
    }

    pub fn is_reversed(&self) -> bool {
        self.step < 0.0
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Materialize the abscissas in traversal order.
    pub fn values(&self) -> Vec<f64> {
        let dir = self.step.signum();
        let magnitude = self.step.abs();
        (0..self.count)
            .map(|i| {
                if i == 0 {
                    self.start
                } else if i + 1 == self.count {
                    self.stop
                } else {
                    (self.first_tick + dir * i as f64) * magnitude
                }
            })
            .collect()
    }
}

/// Derive a "nice" step for `[min, max]`.
///
/// Targets roughly 100 samples and rounds the implied step down to a power of
/// ten, e.g. a range of 3.4 (raw step 0.034) gives 0.01.
pub fn auto_step(min: f64, max: f64) -> Result<f64> {
    let raw = (max - min) / AUTO_SAMPLES;
    if !(raw.is_finite() && raw > 0.0) {
        return Err(CalibrationError::InvalidRange { min, max, step: 0.0 });
    }
    Ok(10f64.powi(raw.log10().floor() as i32))
}
