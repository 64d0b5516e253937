//! Shared calibration pipeline used by the `simulate` and `fit` commands.
//!
//! sweep table -> bias selection -> committed calibration (+ lookup table) ->
//! validation of the forward fit
//!
//! The commands then only differ in where the sweep table comes from.

use tracing::{info, warn};

use crate::atten::AttenuatorCalibration;
use crate::data::{BenchModel, SimulatedBench, sweep_with_config};
use crate::domain::{CalibrationConfig, SweepTable};
use crate::error::AppError;
use crate::fit::{BiasSelection, CurveValidation, select_bias, validate_curve};

/// All computed outputs of one calibration run.
#[derive(Debug, Clone)]
pub struct CalibrationRun {
    pub table: SweepTable,
    pub selection: BiasSelection,
    pub calibration: AttenuatorCalibration,
    pub validation: CurveValidation,
}

/// Calibrate from an already measured sweep table.
pub fn run_calibration(
    table: SweepTable,
    config: &CalibrationConfig,
) -> Result<CalibrationRun, AppError> {
    table.validate()?;

    let selection = select_bias(&table.bias_sweeps(), config.method)?;
    let calibration = AttenuatorCalibration::from_selection(&selection, config)?;
    let validation = validate_curve(&calibration.forward, config.validation_step)?;

    if !validation.monotonic {
        warn!(
            min_slope = validation.min_slope,
            max_slope = validation.max_slope,
            "forward fit is not monotonic"
        );
    }
    info!(
        bias = calibration.bias,
        max_attenuation = calibration.max_attenuation,
        "calibration committed"
    );

    Ok(CalibrationRun {
        table,
        selection,
        calibration,
        validation,
    })
}

/// Build the simulated bench described by `config`.
pub fn simulated_bench(config: &CalibrationConfig) -> Result<SimulatedBench, AppError> {
    let model = BenchModel {
        noise_db: config.noise_db,
        ..BenchModel::default()
    };
    Ok(SimulatedBench::new(model, config.seed)?)
}

/// Sweep a simulated bench, then calibrate from the resulting table.
pub fn run_simulated(config: &CalibrationConfig) -> Result<CalibrationRun, AppError> {
    let bench = simulated_bench(config)?;
    let (mut source, mut meter) = (bench.source(), bench.meter());
    let table = sweep_with_config(&mut source, &mut meter, config)?;
    run_calibration(table, config)
}
