//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and installs logging
//! - parses CLI arguments into a `CalibrationConfig`
//! - runs the calibration pipeline or drives a saved calibration
//! - prints reports and writes optional outputs

use std::time::Duration;

use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::atten::PinAttenuator;
use crate::cli::{CalibrationArgs, Command, FitArgs, SetArgs, SimulateArgs, ValidateArgs};
use crate::domain::{CalibrationConfig, FitMethod};
use crate::error::AppError;
use crate::instrument::PowerMeter;

pub mod pipeline;

/// Entry point for the `pincal` binary.
pub fn run() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    let cli = crate::cli::Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Simulate(args) => handle_simulate(args),
        Command::Fit(args) => handle_fit(args),
        Command::Set(args) => handle_set(args),
        Command::Validate(args) => handle_validate(args),
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn handle_simulate(args: SimulateArgs) -> Result<(), AppError> {
    let config = simulate_config_from_args(&args);
    let run = pipeline::run_simulated(&config)?;

    if let Some(path) = &args.sweep_out {
        crate::io::write_sweep_csv(path, &run.table)?;
    }
    if let Some(path) = &args.report_out {
        crate::io::write_calibration_report(path, &args.calibration.channel, &run.table)?;
    }
    finish_run(&args.calibration, &run)
}

fn handle_fit(args: FitArgs) -> Result<(), AppError> {
    let table = crate::io::read_sweep_csv(&args.sweep)?;
    let config = CalibrationConfig {
        biases: table.biases.clone(),
        ..calibration_config_from_args(&args.calibration)
    };
    let run = pipeline::run_calibration(table, &config)?;
    finish_run(&args.calibration, &run)
}

/// Print the summary and store the calibration if a bundle path was given.
fn finish_run(args: &CalibrationArgs, run: &pipeline::CalibrationRun) -> Result<(), AppError> {
    println!(
        "{}",
        crate::report::format_run_summary(&args.channel, &run.selection, &run.calibration)
    );
    println!("{}", crate::report::format_validation(&run.validation));

    if let Some(path) = &args.bundle {
        crate::io::upsert_channel(path, &args.channel, run.calibration.clone())?;
        println!("Saved channel '{}' to {}", args.channel, path.display());
    }
    Ok(())
}

fn handle_set(args: SetArgs) -> Result<(), AppError> {
    let bundle = crate::io::read_bundle(&args.bundle)?;
    let calibration = bundle.channel(&args.channel)?.clone();
    let reference = calibration.reference_power();

    let config = CalibrationConfig {
        seed: args.seed,
        noise_db: args.noise,
        ..CalibrationConfig::default()
    };
    let bench = pipeline::simulated_bench(&config)?;
    let mut meter = bench.meter();
    let mut attenuator = PinAttenuator::new(args.channel.as_str(), bench.source(), calibration)?;

    attenuator.apply_bias()?;
    let volts = attenuator.set_atten(args.attenuation)?;
    let reading = meter.read_power()?;
    debug!(reading, "simulated meter after set");

    let atten = attenuator.get_atten().unwrap_or_default();
    println!(
        "Channel {}: {:.2} dB -> {:.4} V (bias {:.2} V)",
        attenuator.name(),
        atten,
        volts,
        attenuator.calibration().bias
    );
    println!("Simulated realized attenuation: {:.3} dB", reference - reading);
    Ok(())
}

fn handle_validate(args: ValidateArgs) -> Result<(), AppError> {
    let bundle = crate::io::read_bundle(&args.bundle)?;
    let calibration = bundle.channel(&args.channel)?;
    let validation = crate::fit::validate_curve(&calibration.forward, args.step)?;

    println!(
        "Channel {}: {}",
        args.channel,
        calibration.forward.interpolant.display_name()
    );
    print!("{}", crate::report::format_validation(&validation));
    if !validation.monotonic {
        return Err(AppError::new(
            3,
            format!("Channel '{}' forward fit is not monotonic.", args.channel),
        ));
    }
    Ok(())
}

pub fn calibration_config_from_args(args: &CalibrationArgs) -> CalibrationConfig {
    CalibrationConfig {
        method: FitMethod::from_spec(args.method, args.degree),
        inversion: args.inversion,
        max_attenuation: args.max_atten,
        validation_step: args.validation_step,
        ..CalibrationConfig::default()
    }
}

pub fn simulate_config_from_args(args: &SimulateArgs) -> CalibrationConfig {
    CalibrationConfig {
        biases: args.biases.clone(),
        control_min: args.vmin,
        control_max: args.vmax,
        control_step: args.vstep,
        settle: Duration::from_millis(args.settle_ms),
        seed: args.seed,
        noise_db: args.noise,
        ..calibration_config_from_args(&args.calibration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use crate::domain::InversionMode;

    #[test]
    fn simulate_args_map_to_config() {
        let cli = Cli::try_parse_from([
            "pincal",
            "simulate",
            "--method",
            "polynomial",
            "--degree",
            "4",
            "--inversion",
            "inverse-spline",
            "--settle-ms",
            "250",
            "--vmax",
            "1.5",
        ])
        .unwrap();
        let Command::Simulate(args) = cli.command else {
            panic!("expected simulate");
        };
        let config = simulate_config_from_args(&args);
        assert_eq!(config.method, FitMethod::Polynomial { degree: 4 });
        assert_eq!(config.inversion, InversionMode::InverseSpline);
        assert_eq!(config.settle, Duration::from_millis(250));
        assert_eq!(config.control_max, 1.5);
        assert_eq!(config.control_min, -5.0);
    }
}
