//! Hardware seam: voltage sources and power meters.
//!
//! The calibration core never talks to a bus directly. Transport (GPIB, DAC
//! registers, remote device servers) lives behind these traits.

use crate::error::Result;

/// A DAC-backed source driving the attenuator's bias and control inputs.
///
/// Both setters report whether the hardware confirmed the new voltage.
/// Anything other than `true` is a failed actuation.
pub trait VoltageSource {
    fn set_voltage(&mut self, volts: f64) -> bool;

    fn set_bias(&mut self, volts: f64) -> bool;
}

/// A power meter returning one settled, parsed reading (dBm).
pub trait PowerMeter {
    fn read_power(&mut self) -> Result<f64>;
}

impl<T: VoltageSource + ?Sized> VoltageSource for &mut T {
    fn set_voltage(&mut self, volts: f64) -> bool {
        (**self).set_voltage(volts)
    }

    fn set_bias(&mut self, volts: f64) -> bool {
        (**self).set_bias(volts)
    }
}

impl<T: VoltageSource + ?Sized> VoltageSource for Box<T> {
    fn set_voltage(&mut self, volts: f64) -> bool {
        (**self).set_voltage(volts)
    }

    fn set_bias(&mut self, volts: f64) -> bool {
        (**self).set_bias(volts)
    }
}

impl<T: PowerMeter + ?Sized> PowerMeter for &mut T {
    fn read_power(&mut self) -> Result<f64> {
        (**self).read_power()
    }
}
