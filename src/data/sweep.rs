//! Bias/control sweep against a power meter.

use std::thread;
use std::time::Duration;

use tracing::{debug, info};

use crate::domain::{CalibrationConfig, SweepTable};
use crate::error::{CalibrationError, Result};
use crate::fit::SamplePlan;
use crate::instrument::{PowerMeter, VoltageSource};

/// Measure power at every `(bias, control)` point of the grid.
///
/// Each point sets the bias, then the control voltage, waits `settle`, and
/// takes one meter reading. The first rejected set aborts the sweep.
pub fn run_sweep<V, M>(
    source: &mut V,
    meter: &mut M,
    biases: &[f64],
    plan: &SamplePlan,
    settle: Duration,
) -> Result<SweepTable>
where
    V: VoltageSource + ?Sized,
    M: PowerMeter + ?Sized,
{
    if biases.is_empty() {
        return Err(CalibrationError::InsufficientSamples { needed: 1, got: 0 });
    }
    let volts = plan.values();

    let mut powers = Vec::with_capacity(biases.len());
    for &bias in biases {
        info!(bias, points = volts.len(), "sweeping bias");
        let mut column = Vec::with_capacity(volts.len());
        for &v in &volts {
            if !source.set_bias(bias) {
                return Err(CalibrationError::ActuationFailed { volts: bias });
            }
            if !source.set_voltage(v) {
                return Err(CalibrationError::ActuationFailed { volts: v });
            }
            if !settle.is_zero() {
                thread::sleep(settle);
            }
            let p = meter.read_power()?;
            debug!(bias, volts = v, power = p, "read power");
            column.push(p);
        }
        powers.push(column);
    }

    Ok(SweepTable {
        biases: biases.to_vec(),
        volts,
        powers,
    })
}

/// Sweep with the grid, biases and settle delay taken from `config`.
pub fn sweep_with_config<V, M>(
    source: &mut V,
    meter: &mut M,
    config: &CalibrationConfig,
) -> Result<SweepTable>
where
    V: VoltageSource + ?Sized,
    M: PowerMeter + ?Sized,
{
    let plan = SamplePlan::new(
        config.control_min,
        config.control_max,
        Some(config.control_step),
    )?;
    run_sweep(source, meter, &config.biases, &plan, config.settle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::simulate::{BenchModel, SimulatedBench};

    struct DeadMeter;

    impl PowerMeter for DeadMeter {
        fn read_power(&mut self) -> Result<f64> {
            Err(CalibrationError::Instrument("meter timed out".to_string()))
        }
    }

    fn quick_config() -> CalibrationConfig {
        CalibrationConfig {
            settle: Duration::ZERO,
            ..CalibrationConfig::default()
        }
    }

    #[test]
    fn sweep_fills_one_column_per_bias() {
        let bench = SimulatedBench::new(BenchModel::default(), 7).unwrap();
        let (mut src, mut meter) = (bench.source(), bench.meter());
        let table = sweep_with_config(&mut src, &mut meter, &quick_config()).unwrap();

        table.validate().unwrap();
        assert_eq!(table.biases, vec![2.0, 2.5, 3.0, 3.5, 4.0]);
        assert_eq!(table.volts.len(), 28);
        assert!((table.volts[0] - -5.0).abs() < 1e-12);
        assert!((table.volts[27] - 1.75).abs() < 1e-12);
        // Bench is left at the last grid point.
        assert_eq!(bench.bias(), 4.0);
        assert!((bench.control() - 1.75).abs() < 1e-12);
    }

    #[test]
    fn rejected_voltage_aborts_sweep() {
        let bench = SimulatedBench::new(BenchModel::default(), 7).unwrap();
        bench.fail_after(3);
        let (mut src, mut meter) = (bench.source(), bench.meter());
        let err = sweep_with_config(&mut src, &mut meter, &quick_config()).unwrap_err();
        assert!(matches!(err, CalibrationError::ActuationFailed { .. }));
    }

    #[test]
    fn meter_errors_propagate() {
        let bench = SimulatedBench::new(BenchModel::default(), 7).unwrap();
        let mut src = bench.source();
        let plan = SamplePlan::new(0.0, 1.0, Some(0.5)).unwrap();
        let err = run_sweep(&mut src, &mut DeadMeter, &[3.0], &plan, Duration::ZERO).unwrap_err();
        assert_eq!(err, CalibrationError::Instrument("meter timed out".to_string()));
    }

    #[test]
    fn empty_bias_list_is_rejected() {
        let bench = SimulatedBench::new(BenchModel::default(), 7).unwrap();
        let (mut src, mut meter) = (bench.source(), bench.meter());
        let plan = SamplePlan::new(0.0, 1.0, Some(0.5)).unwrap();
        assert!(run_sweep(&mut src, &mut meter, &[], &plan, Duration::ZERO).is_err());
    }
}
