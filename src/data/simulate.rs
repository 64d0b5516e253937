//! Simulated PIN-diode bench.
//!
//! Power through the attenuator is modelled as a logistic drop with control
//! voltage:
//!
//! `P(bias, v) = reference - depth(bias) / (1 + exp(-(v - center(bias)) / width))`
//!
//! with the drop deepest near a 3.0 V bias and shallower either side. The
//! source and meter handles share one bench state, so a reading always
//! reflects the last confirmed voltages. Meter noise is Gaussian and seeded.

use std::cell::RefCell;
use std::rc::Rc;

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::error::{CalibrationError, Result};
use crate::instrument::{PowerMeter, VoltageSource};

/// Bias at which the attenuation depth peaks (V).
const PEAK_BIAS: f64 = 3.0;

/// Shallowest drop the model produces at any bias (dB).
const MIN_DEPTH: f64 = 2.0;

/// Parameters of the simulated response.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BenchModel {
    /// Unattenuated power at the meter (dBm).
    pub reference_dbm: f64,
    /// Drop at the peak bias (dB).
    pub peak_depth: f64,
    /// Logistic width in control volts.
    pub width: f64,
    /// Meter noise standard deviation (dB).
    pub noise_db: f64,
}

impl Default for BenchModel {
    fn default() -> Self {
        Self {
            reference_dbm: -10.0,
            peak_depth: 20.0,
            width: 0.8,
            noise_db: 0.01,
        }
    }
}

impl BenchModel {
    pub fn depth(&self, bias: f64) -> f64 {
        let off = bias - PEAK_BIAS;
        (self.peak_depth - 6.0 * off * off).max(MIN_DEPTH)
    }

    pub fn center(&self, bias: f64) -> f64 {
        -1.5 + 0.5 * (bias - PEAK_BIAS)
    }

    /// Noise-free power (dBm) at the given bias and control voltage.
    pub fn power(&self, bias: f64, control: f64) -> f64 {
        let z = (control - self.center(bias)) / self.width;
        self.reference_dbm - self.depth(bias) / (1.0 + (-z).exp())
    }
}

#[derive(Debug)]
struct BenchState {
    model: BenchModel,
    bias: f64,
    control: f64,
    rng: StdRng,
    noise: Normal<f64>,
    confirmed: usize,
    fail_after: Option<usize>,
}

impl BenchState {
    fn accept(&mut self) -> bool {
        if self.fail_after.is_some_and(|n| self.confirmed >= n) {
            return false;
        }
        self.confirmed += 1;
        true
    }
}

/// Shared bench handing out a source and a meter.
#[derive(Debug, Clone)]
pub struct SimulatedBench {
    state: Rc<RefCell<BenchState>>,
}

impl SimulatedBench {
    pub fn new(model: BenchModel, seed: u64) -> Result<Self> {
        let noise = Normal::new(0.0, model.noise_db)
            .map_err(|e| CalibrationError::Instrument(format!("noise distribution: {e}")))?;
        let state = BenchState {
            model,
            bias: 0.0,
            control: 0.0,
            rng: StdRng::seed_from_u64(seed),
            noise,
            confirmed: 0,
            fail_after: None,
        };
        Ok(Self {
            state: Rc::new(RefCell::new(state)),
        })
    }

    pub fn source(&self) -> SimulatedSource {
        SimulatedSource {
            state: Rc::clone(&self.state),
        }
    }

    pub fn meter(&self) -> SimulatedMeter {
        SimulatedMeter {
            state: Rc::clone(&self.state),
        }
    }

    /// Reject every voltage set after `n` more confirmed sets.
    pub fn fail_after(&self, n: usize) {
        let mut state = self.state.borrow_mut();
        state.fail_after = Some(state.confirmed + n);
    }

    pub fn model(&self) -> BenchModel {
        self.state.borrow().model
    }

    pub fn bias(&self) -> f64 {
        self.state.borrow().bias
    }

    pub fn control(&self) -> f64 {
        self.state.borrow().control
    }
}

/// `VoltageSource` half of a [`SimulatedBench`].
#[derive(Debug, Clone)]
pub struct SimulatedSource {
    state: Rc<RefCell<BenchState>>,
}

impl VoltageSource for SimulatedSource {
    fn set_voltage(&mut self, volts: f64) -> bool {
        let mut state = self.state.borrow_mut();
        if !state.accept() {
            return false;
        }
        state.control = volts;
        true
    }

    fn set_bias(&mut self, volts: f64) -> bool {
        let mut state = self.state.borrow_mut();
        if !state.accept() {
            return false;
        }
        state.bias = volts;
        true
    }
}

/// `PowerMeter` half of a [`SimulatedBench`].
#[derive(Debug, Clone)]
pub struct SimulatedMeter {
    state: Rc<RefCell<BenchState>>,
}

impl PowerMeter for SimulatedMeter {
    fn read_power(&mut self) -> Result<f64> {
        let mut state = self.state.borrow_mut();
        let clean = state.model.power(state.bias, state.control);
        let noise = state.noise;
        let jitter = noise.sample(&mut state.rng);
        Ok(clean + jitter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn depth_peaks_at_three_volts() {
        let m = BenchModel::default();
        assert_eq!(m.depth(3.0), 20.0);
        assert!(m.depth(2.5) < m.depth(3.0));
        assert!(m.depth(3.5) < m.depth(3.0));
        assert_eq!(m.depth(10.0), MIN_DEPTH);
    }

    #[test]
    fn power_falls_with_control_voltage() {
        let m = BenchModel::default();
        let p_lo = m.power(3.0, -5.0);
        let p_hi = m.power(3.0, 1.75);
        assert!(p_lo > p_hi);
        assert!(p_lo < m.reference_dbm);
        assert!(p_hi > m.reference_dbm - m.depth(3.0));
    }

    #[test]
    fn same_seed_same_readings() {
        let read = |seed| {
            let bench = SimulatedBench::new(BenchModel::default(), seed).unwrap();
            let (mut src, mut meter) = (bench.source(), bench.meter());
            src.set_bias(3.0);
            src.set_voltage(-1.0);
            (0..5).map(|_| meter.read_power().unwrap()).collect::<Vec<_>>()
        };
        assert_eq!(read(11), read(11));
        assert_ne!(read(11), read(12));
    }

    #[test]
    fn noiseless_meter_reads_model() {
        let model = BenchModel {
            noise_db: 0.0,
            ..BenchModel::default()
        };
        let bench = SimulatedBench::new(model, 1).unwrap();
        let (mut src, mut meter) = (bench.source(), bench.meter());
        assert!(src.set_bias(2.5));
        assert!(src.set_voltage(0.25));
        assert_eq!(meter.read_power().unwrap(), model.power(2.5, 0.25));
    }

    #[test]
    fn failure_injection_rejects_later_sets() {
        let bench = SimulatedBench::new(BenchModel::default(), 1).unwrap();
        let mut src = bench.source();
        bench.fail_after(1);
        assert!(src.set_voltage(-2.0));
        assert!(!src.set_voltage(-1.0));
        assert!(!src.set_bias(3.0));
        assert_eq!(bench.control(), -2.0);
    }

    #[test]
    fn negative_noise_is_rejected() {
        let model = BenchModel {
            noise_db: -1.0,
            ..BenchModel::default()
        };
        assert!(matches!(
            SimulatedBench::new(model, 1),
            Err(CalibrationError::Instrument(_))
        ));
    }
}
