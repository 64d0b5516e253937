//! Shared domain types.
//!
//! These types are kept lightweight and serializable so they can be:
//!
//! - used in-memory during fitting and actuation
//! - exported to CSV/JSON
//! - reloaded later to drive an attenuator

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::atten::AttenuatorCalibration;
use crate::error::{CalibrationError, Result};

/// Bias voltages tried when none are given.
pub const DEFAULT_BIASES: [f64; 5] = [2.0, 2.5, 3.0, 3.5, 4.0];

/// Control-voltage sweep limits (V) when none are given.
pub const DEFAULT_CONTROL_LIMITS: (f64, f64) = (-5.0, 1.75);

/// Control-voltage sweep step (V).
pub const DEFAULT_CONTROL_STEP: f64 = 0.25;

/// Attenuation ceiling (dB) for polynomial calibrations.
pub const DEFAULT_MAX_ATTENUATION: f64 = 15.0;

/// Attenuation applied by `PinAttenuator::set_default` (dB).
pub const DEFAULT_ATTENUATION: f64 = 5.0;

/// Highest polynomial degree the fitter accepts.
pub const MAX_POLY_DEGREE: usize = 7;

/// Which interpolant family to fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum MethodSpec {
    /// Global least-squares polynomial (the older per-channel calibration).
    Polynomial,
    /// Natural cubic interpolating spline.
    Spline,
}

/// Concrete fit method handed to the curve fitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum FitMethod {
    Polynomial { degree: usize },
    Spline,
}

impl FitMethod {
    pub fn from_spec(spec: MethodSpec, degree: usize) -> Self {
        match spec {
            MethodSpec::Polynomial => FitMethod::Polynomial { degree },
            MethodSpec::Spline => FitMethod::Spline,
        }
    }

    /// Minimum number of samples needed to fit this method.
    pub fn min_samples(self) -> usize {
        match self {
            FitMethod::Polynomial { degree } => degree + 1,
            FitMethod::Spline => 2,
        }
    }

    /// Human-readable label for terminal output.
    pub fn display_name(self) -> String {
        match self {
            FitMethod::Polynomial { degree } => format!("polynomial (degree {degree})"),
            FitMethod::Spline => "cubic spline".to_string(),
        }
    }
}

/// How a requested attenuation is turned into a control voltage.
///
/// Selected explicitly by configuration; never inferred from which fits happen
/// to be present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum InversionMode {
    /// Bisection on the forward (voltage -> gain) fit.
    Bisection,
    /// Direct evaluation of an independently fitted gain -> voltage spline.
    InverseSpline,
}

/// Closed validity interval of a fitted curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Domain {
    pub min: f64,
    pub max: f64,
}

impl Domain {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, x: f64) -> bool {
        x >= self.min && x <= self.max
    }

    pub fn span(&self) -> f64 {
        self.max - self.min
    }
}

/// Ordered `(x, y)` samples with strictly increasing `x`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleSet {
    x: Vec<f64>,
    y: Vec<f64>,
}

impl SampleSet {
    /// Build a canonical sample set.
    ///
    /// If `x` runs from high to low, both vectors are reversed in lock-step.
    /// The result must then be strictly increasing in `x`.
    pub fn canonical(x: &[f64], y: &[f64]) -> Result<Self> {
        if x.len() != y.len() {
            return Err(CalibrationError::LengthMismatch {
                x: x.len(),
                y: y.len(),
            });
        }
        if let Some(index) = x
            .iter()
            .zip(y.iter())
            .position(|(a, b)| !(a.is_finite() && b.is_finite()))
        {
            return Err(CalibrationError::InvalidSample { index });
        }

        let mut x = x.to_vec();
        let mut y = y.to_vec();
        if x.len() > 1 && x[0] > x[x.len() - 1] {
            x.reverse();
            y.reverse();
        }
        if x.windows(2).any(|w| w[1] <= w[0]) {
            return Err(CalibrationError::NonMonotonic("sample abscissa".to_string()));
        }

        Ok(Self { x, y })
    }

    pub fn x(&self) -> &[f64] {
        &self.x
    }

    pub fn y(&self) -> &[f64] {
        &self.y
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// Domain `[x_first, x_last]`, or `None` for an empty set.
    pub fn domain(&self) -> Option<Domain> {
        Some(Domain::new(*self.x.first()?, *self.x.last()?))
    }

    pub fn iter(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.x.iter().copied().zip(self.y.iter().copied())
    }
}

/// Power readings for one bias across the control-voltage grid.
#[derive(Debug, Clone, PartialEq)]
pub struct BiasSweep {
    pub bias: f64,
    pub volts: Vec<f64>,
    pub powers: Vec<f64>,
}

/// Raw calibration table: one power column per bias over a shared voltage grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepTable {
    pub biases: Vec<f64>,
    pub volts: Vec<f64>,
    /// `powers[b][i]` is the reading for `biases[b]` at `volts[i]` (dBm).
    pub powers: Vec<Vec<f64>>,
}

impl SweepTable {
    /// Check that every power column matches the voltage grid.
    pub fn validate(&self) -> Result<()> {
        if self.biases.len() != self.powers.len() {
            return Err(CalibrationError::LengthMismatch {
                x: self.biases.len(),
                y: self.powers.len(),
            });
        }
        for column in &self.powers {
            if column.len() != self.volts.len() {
                return Err(CalibrationError::LengthMismatch {
                    x: self.volts.len(),
                    y: column.len(),
                });
            }
        }
        Ok(())
    }

    /// Split the table into one sweep per bias.
    pub fn bias_sweeps(&self) -> Vec<BiasSweep> {
        self.biases
            .iter()
            .zip(self.powers.iter())
            .map(|(&bias, powers)| BiasSweep {
                bias,
                volts: self.volts.clone(),
                powers: powers.clone(),
            })
            .collect()
    }

    /// Report rows: control voltage followed by one reading per bias.
    pub fn rows(&self) -> Vec<(f64, Vec<f64>)> {
        self.volts
            .iter()
            .enumerate()
            .map(|(i, &v)| {
                let readings = self
                    .powers
                    .iter()
                    .map(|col| col.get(i).copied().unwrap_or(f64::NAN))
                    .collect();
                (v, readings)
            })
            .collect()
    }
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus defaults).
#[derive(Debug, Clone)]
pub struct CalibrationConfig {
    pub method: FitMethod,
    pub inversion: InversionMode,
    /// Attenuation ceiling (dB) applied to polynomial calibrations.
    pub max_attenuation: f64,

    pub biases: Vec<f64>,
    pub control_min: f64,
    pub control_max: f64,
    pub control_step: f64,
    /// Wait between setting a voltage and reading the power meter.
    pub settle: Duration,

    /// Step used when resampling a fit for validation (`None` = automatic).
    pub validation_step: Option<f64>,

    /// Simulated bench RNG seed.
    pub seed: u64,
    /// Simulated meter noise standard deviation (dB).
    pub noise_db: f64,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            method: FitMethod::Spline,
            inversion: InversionMode::Bisection,
            max_attenuation: DEFAULT_MAX_ATTENUATION,
            biases: DEFAULT_BIASES.to_vec(),
            control_min: DEFAULT_CONTROL_LIMITS.0,
            control_max: DEFAULT_CONTROL_LIMITS.1,
            control_step: DEFAULT_CONTROL_STEP,
            settle: Duration::from_secs(1),
            validation_step: None,
            seed: 42,
            noise_db: 0.01,
        }
    }
}

/// A saved calibration file (JSON), keyed by channel id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalibrationBundle {
    pub tool: String,
    pub created: DateTime<Utc>,
    pub channels: BTreeMap<String, AttenuatorCalibration>,
}

impl CalibrationBundle {
    pub fn new() -> Self {
        Self {
            tool: "pincal".to_string(),
            created: Utc::now(),
            channels: BTreeMap::new(),
        }
    }

    pub fn channel(&self, id: &str) -> Result<&AttenuatorCalibration> {
        self.channels
            .get(id)
            .ok_or_else(|| CalibrationError::UnknownChannel(id.to_string()))
    }
}

impl Default for CalibrationBundle {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_reverses_descending_input() {
        let set = SampleSet::canonical(&[3.0, 2.0, 1.0], &[30.0, 20.0, 10.0]).unwrap();
        assert_eq!(set.x(), &[1.0, 2.0, 3.0]);
        assert_eq!(set.y(), &[10.0, 20.0, 30.0]);
        assert_eq!(set.domain(), Some(Domain::new(1.0, 3.0)));
    }

    #[test]
    fn canonical_rejects_repeated_abscissa() {
        let err = SampleSet::canonical(&[1.0, 2.0, 2.0], &[0.0, 1.0, 2.0]).unwrap_err();
        assert!(matches!(err, CalibrationError::NonMonotonic(_)));
    }

    #[test]
    fn canonical_rejects_non_finite_samples() {
        let err = SampleSet::canonical(&[1.0, 2.0], &[0.0, f64::NAN]).unwrap_err();
        assert_eq!(err, CalibrationError::InvalidSample { index: 1 });
    }

    #[test]
    fn sweep_table_rows_interleave_bias_columns() {
        let table = SweepTable {
            biases: vec![2.0, 3.0],
            volts: vec![-1.0, 0.0],
            powers: vec![vec![-10.0, -12.0], vec![-11.0, -15.0]],
        };
        table.validate().unwrap();
        let rows = table.rows();
        assert_eq!(rows[1], (0.0, vec![-12.0, -15.0]));
        assert_eq!(table.bias_sweeps()[1].powers, vec![-11.0, -15.0]);
    }

    #[test]
    fn sweep_table_validate_catches_short_column() {
        let table = SweepTable {
            biases: vec![2.0],
            volts: vec![-1.0, 0.0],
            powers: vec![vec![-10.0]],
        };
        assert!(table.validate().is_err());
    }
}
