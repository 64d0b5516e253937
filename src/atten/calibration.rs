//! Committed per-attenuator calibration.
//!
//! Built once from a [`BiasSelection`] and then treated as read-only: it is
//! what gets saved to a bundle and later drives a [`PinAttenuator`].
//!
//! [`PinAttenuator`]: crate::atten::PinAttenuator

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::atten::inverter::AttenuationInverter;
use crate::domain::{CalibrationConfig, FitMethod, InversionMode};
use crate::error::{CalibrationError, Result};
use crate::fit::{BiasSelection, fit_curve};
use crate::models::FittedCurve;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttenuatorCalibration {
    /// Selected bias voltage (V).
    pub bias: f64,
    pub method: FitMethod,
    /// Control voltage -> relative gain (dB, <= 0 across the useful range).
    pub forward: FittedCurve,
    /// Relative gain -> control voltage, present for inverse-spline inversion.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inverse: Option<FittedCurve>,
    /// Useful range bounds (dBm) of the selected bias.
    pub lower: f64,
    pub upper: f64,
    pub inversion: InversionMode,
    pub max_attenuation: f64,
    /// Whole-dB attenuation -> control voltage.
    pub atten_table: BTreeMap<u32, f64>,
}

impl AttenuatorCalibration {
    /// Commit the winning bias of `selection` under `config`.
    pub fn from_selection(selection: &BiasSelection, config: &CalibrationConfig) -> Result<Self> {
        let winner = selection.winner();

        let inverse = match config.inversion {
            InversionMode::InverseSpline => Some(fit_curve(
                &selection.relative_gain,
                &selection.volts,
                FitMethod::Spline,
            )?),
            InversionMode::Bisection => None,
        };

        // The configured ceiling only applies to polynomial fits and never
        // exceeds what the chosen inversion path can realize.
        let reachable = AttenuationInverter::new(
            &selection.refit,
            inverse.as_ref(),
            config.inversion,
            f64::INFINITY,
        )
        .reachable()?;
        let max_attenuation = match config.method {
            FitMethod::Polynomial { .. } => config.max_attenuation.min(reachable),
            FitMethod::Spline => reachable,
        };
        if !(max_attenuation > 0.0) {
            return Err(CalibrationError::DegenerateFit);
        }

        let mut cal = Self {
            bias: winner.bias,
            method: config.method,
            forward: selection.refit.clone(),
            inverse,
            lower: winner.lower,
            upper: winner.upper,
            inversion: config.inversion,
            max_attenuation,
            atten_table: BTreeMap::new(),
        };
        cal.atten_table = build_atten_table(&cal.inverter(), cal.table_span())?;

        debug!(
            bias = cal.bias,
            max_attenuation = cal.max_attenuation,
            entries = cal.atten_table.len(),
            "built attenuation table"
        );
        Ok(cal)
    }

    pub fn useful_range(&self) -> f64 {
        self.upper - self.lower
    }

    /// Largest attenuation covered by the lookup table.
    fn table_span(&self) -> f64 {
        self.useful_range().min(self.max_attenuation)
    }

    pub fn inverter(&self) -> AttenuationInverter<'_> {
        AttenuationInverter::new(
            &self.forward,
            self.inverse.as_ref(),
            self.inversion,
            self.max_attenuation,
        )
    }

    pub fn voltage_for(&self, requested: f64) -> Result<f64> {
        self.inverter().voltage_for(requested)
    }

    /// Absolute power (dBm) that zero attenuation corresponds to.
    pub fn reference_power(&self) -> f64 {
        self.upper + self.inverter().reference_gain()
    }

    /// Tabulated voltage for a whole-dB attenuation.
    pub fn table_voltage(&self, db: u32) -> Option<f64> {
        self.atten_table.get(&db).copied()
    }

    /// Consistency checks for a calibration loaded from disk.
    pub fn validate(&self) -> Result<()> {
        if !(self.useful_range() > 0.0) {
            return Err(CalibrationError::DegenerateFit);
        }
        if self.inversion == InversionMode::InverseSpline && self.inverse.is_none() {
            return Err(CalibrationError::MissingInverse);
        }
        check_table_monotonic(&self.atten_table)
    }
}

/// Tabulate control voltage at every whole dB in `0..=floor(span)`.
pub fn build_atten_table(
    inverter: &AttenuationInverter<'_>,
    span: f64,
) -> Result<BTreeMap<u32, f64>> {
    if !(span.is_finite() && span >= 0.0) {
        return Err(CalibrationError::DegenerateFit);
    }
    let top = (span + 1e-9).floor() as u32;

    let mut table = BTreeMap::new();
    for db in 0..=top {
        table.insert(db, inverter.voltage_for(f64::from(db))?);
    }
    check_table_monotonic(&table)?;
    Ok(table)
}

/// Table voltages must move strictly one way as attenuation increases.
pub fn check_table_monotonic(table: &BTreeMap<u32, f64>) -> Result<()> {
    let volts: Vec<f64> = table.values().copied().collect();
    let rising = volts.windows(2).all(|w| w[1] > w[0]);
    let falling = volts.windows(2).all(|w| w[1] < w[0]);
    if rising || falling {
        Ok(())
    } else {
        Err(CalibrationError::NonMonotonic("attenuation table".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::BiasSweep;
    use crate::fit::select_bias;

    /// Logistic roll-off from about -10.6 dBm to about -29.3 dBm.
    fn sweep(bias: f64, depth: f64) -> BiasSweep {
        let volts: Vec<f64> = (0..28).map(|i| -5.0 + 0.25 * i as f64).collect();
        let powers = volts
            .iter()
            .map(|&v| -10.0 - depth / (1.0 + (-(v + 1.5) / 1.0).exp()))
            .collect();
        BiasSweep {
            bias,
            volts,
            powers,
        }
    }

    fn config(method: FitMethod, inversion: InversionMode) -> CalibrationConfig {
        CalibrationConfig {
            method,
            inversion,
            ..CalibrationConfig::default()
        }
    }

    #[test]
    fn spline_calibration_table_is_monotonic_and_consistent() {
        let sel = select_bias(&[sweep(2.0, 12.0), sweep(3.0, 20.0)], FitMethod::Spline).unwrap();
        let cal =
            AttenuatorCalibration::from_selection(&sel, &config(FitMethod::Spline, InversionMode::Bisection))
                .unwrap();

        assert_eq!(cal.bias, 3.0);
        assert!(cal.max_attenuation > cal.useful_range() - 0.2);
        assert_eq!(
            cal.atten_table.len() as f64,
            cal.table_span().floor() + 1.0
        );
        check_table_monotonic(&cal.atten_table).unwrap();

        let v10 = cal.table_voltage(10).unwrap();
        assert!((cal.voltage_for(10.0).unwrap() - v10).abs() < 1e-12);
        // Realized gain at the tabulated voltage matches the request.
        let reference = cal.inverter().reference_gain();
        assert!((cal.forward.eval(v10).unwrap() - (reference - 10.0)).abs() < 1e-6);
        // The advertised ceiling itself is reachable.
        assert!(cal.voltage_for(cal.max_attenuation).is_ok());
        cal.validate().unwrap();
    }

    #[test]
    fn polynomial_calibration_uses_configured_ceiling() {
        let method = FitMethod::Polynomial { degree: 7 };
        let sel = select_bias(&[sweep(3.0, 20.0)], method).unwrap();
        let cal =
            AttenuatorCalibration::from_selection(&sel, &config(method, InversionMode::Bisection))
                .unwrap();
        assert_eq!(cal.max_attenuation, 15.0);
        assert_eq!(*cal.atten_table.keys().last().unwrap(), 15);
        assert!(matches!(
            cal.voltage_for(16.0),
            Err(CalibrationError::AttenuationOutOfRange { .. })
        ));
    }

    #[test]
    fn inverse_spline_calibration_carries_inverse_fit() {
        let sel = select_bias(&[sweep(3.0, 20.0)], FitMethod::Spline).unwrap();
        let cal = AttenuatorCalibration::from_selection(
            &sel,
            &config(FitMethod::Spline, InversionMode::InverseSpline),
        )
        .unwrap();
        let inverse = cal.inverse.as_ref().unwrap();
        assert!((cal.max_attenuation - inverse.domain.span()).abs() < 1e-9);

        // Inverse and bisection agree to within interpolation error.
        let bisection = AttenuationInverter::new(
            &cal.forward,
            None,
            InversionMode::Bisection,
            cal.max_attenuation,
        );
        for a in [0.0, 8.0] {
            let v_inv = cal.voltage_for(a).unwrap();
            let v_bis = bisection.voltage_for(a).unwrap();
            assert!((v_inv - v_bis).abs() < 0.05, "{a} dB: {v_inv} vs {v_bis}");
        }
    }

    #[test]
    fn polynomial_inverse_spline_ceiling_is_capped_by_measured_span() {
        let method = FitMethod::Polynomial { degree: 7 };
        let sel = select_bias(&[sweep(3.0, 8.0)], method).unwrap();
        let cal = AttenuatorCalibration::from_selection(
            &sel,
            &config(method, InversionMode::InverseSpline),
        )
        .unwrap();

        let span = cal.inverse.as_ref().unwrap().domain.span();
        assert!(cal.max_attenuation < 8.0);
        assert!((cal.max_attenuation - span).abs() < 0.1);
        assert!(cal.voltage_for(cal.max_attenuation).is_ok());
        for a in [12.0, 14.0] {
            assert!(matches!(
                cal.voltage_for(a),
                Err(CalibrationError::AttenuationOutOfRange { .. })
            ));
        }
    }

    #[test]
    fn non_monotonic_table_is_rejected() {
        let table = BTreeMap::from([(0, -5.0), (1, -2.0), (2, -3.0)]);
        assert!(matches!(
            check_table_monotonic(&table),
            Err(CalibrationError::NonMonotonic(_))
        ));
    }

    #[test]
    fn loaded_calibration_missing_inverse_fails_validation() {
        let sel = select_bias(&[sweep(3.0, 20.0)], FitMethod::Spline).unwrap();
        let mut cal =
            AttenuatorCalibration::from_selection(&sel, &config(FitMethod::Spline, InversionMode::Bisection))
                .unwrap();
        cal.inversion = InversionMode::InverseSpline;
        assert_eq!(cal.validate().unwrap_err(), CalibrationError::MissingInverse);
    }
}
