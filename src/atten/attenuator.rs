//! Runtime attenuator control.

use tracing::{info, warn};

use crate::atten::calibration::AttenuatorCalibration;
use crate::domain::DEFAULT_ATTENUATION;
use crate::error::{CalibrationError, Result};
use crate::instrument::VoltageSource;

/// One calibrated PIN attenuator behind a voltage source.
///
/// The cached attenuation only ever reflects a setting the hardware
/// confirmed. A failed actuation leaves the previous value in place.
#[derive(Debug)]
pub struct PinAttenuator<V> {
    name: String,
    source: V,
    calibration: AttenuatorCalibration,
    current: Option<f64>,
}

impl<V: VoltageSource> PinAttenuator<V> {
    /// Wrap `source` with a calibration (typically loaded from a bundle).
    pub fn new(
        name: impl Into<String>,
        source: V,
        calibration: AttenuatorCalibration,
    ) -> Result<Self> {
        calibration.validate()?;
        Ok(Self {
            name: name.into(),
            source,
            calibration,
            current: None,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn calibration(&self) -> &AttenuatorCalibration {
        &self.calibration
    }

    /// Drive the bias input to the calibrated bias voltage.
    pub fn apply_bias(&mut self) -> Result<()> {
        let volts = self.calibration.bias;
        if !self.source.set_bias(volts) {
            warn!(attenuator = %self.name, volts, "bias not confirmed");
            return Err(CalibrationError::ActuationFailed { volts });
        }
        Ok(())
    }

    /// Set the attenuation (dB); returns the control voltage applied.
    ///
    /// Negative requests are treated as their magnitude.
    pub fn set_atten(&mut self, requested: f64) -> Result<f64> {
        let inverter = self.calibration.inverter();
        let atten = inverter.normalize(requested)?;
        let volts = inverter.voltage_for(atten)?;

        if !self.source.set_voltage(volts) {
            warn!(attenuator = %self.name, atten, volts, "control voltage not confirmed");
            return Err(CalibrationError::ActuationFailed { volts });
        }

        self.current = Some(atten);
        info!(attenuator = %self.name, atten, volts, "attenuation set");
        Ok(volts)
    }

    /// Bias the attenuator and set the power-on default attenuation.
    pub fn set_default(&mut self) -> Result<f64> {
        self.apply_bias()?;
        self.set_atten(DEFAULT_ATTENUATION)
    }

    /// Last confirmed attenuation (dB), if any.
    pub fn get_atten(&self) -> Option<f64> {
        self.current
    }

    pub fn into_source(self) -> V {
        self.source
    }
}
