//! Command-line parsing for the PIN attenuator calibration tool.
//!
//! Argument parsing and command dispatch stay separate from the fitting and
//! actuation code.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::{
    DEFAULT_BIASES, DEFAULT_CONTROL_LIMITS, DEFAULT_CONTROL_STEP, DEFAULT_MAX_ATTENUATION,
    InversionMode, MethodSpec,
};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "pincal", version, about = "PIN-diode attenuator calibration")]
pub struct Cli {
    /// Log at debug level (overridden by RUST_LOG).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Sweep a simulated bench, calibrate, and optionally save the results.
    Simulate(SimulateArgs),
    /// Calibrate from a saved sweep CSV.
    Fit(FitArgs),
    /// Set an attenuation from a saved calibration on the simulated bench.
    Set(SetArgs),
    /// Resample a saved forward fit and check its slopes.
    Validate(ValidateArgs),
}

/// Fit and inversion options shared by `simulate` and `fit`.
#[derive(Debug, Args, Clone)]
pub struct CalibrationArgs {
    /// Curve family to fit.
    #[arg(long, value_enum, default_value_t = MethodSpec::Spline)]
    pub method: MethodSpec,

    /// Polynomial degree (1-7) when `--method polynomial`.
    #[arg(long, default_value_t = 7)]
    pub degree: usize,

    /// How attenuation requests are turned into control voltages.
    #[arg(long, value_enum, default_value_t = InversionMode::Bisection)]
    pub inversion: InversionMode,

    /// Attenuation ceiling (dB) for polynomial calibrations.
    #[arg(long, default_value_t = DEFAULT_MAX_ATTENUATION)]
    pub max_atten: f64,

    /// Step (V) for resampling the fit during validation (default: automatic).
    #[arg(long)]
    pub validation_step: Option<f64>,

    /// Channel id under which the calibration is stored.
    #[arg(long, env = "PINCAL_CHANNEL", default_value = "0")]
    pub channel: String,

    /// Calibration bundle JSON to add the channel to.
    #[arg(long, env = "PINCAL_BUNDLE")]
    pub bundle: Option<PathBuf>,
}

/// Options for `pincal simulate`.
#[derive(Debug, Args, Clone)]
pub struct SimulateArgs {
    #[command(flatten)]
    pub calibration: CalibrationArgs,

    /// Bias voltages to sweep (comma-separated).
    #[arg(long, value_delimiter = ',', default_values_t = DEFAULT_BIASES)]
    pub biases: Vec<f64>,

    /// Lowest control voltage.
    #[arg(long, allow_hyphen_values = true, default_value_t = DEFAULT_CONTROL_LIMITS.0)]
    pub vmin: f64,

    /// Highest control voltage.
    #[arg(long, allow_hyphen_values = true, default_value_t = DEFAULT_CONTROL_LIMITS.1)]
    pub vmax: f64,

    /// Control voltage step.
    #[arg(long, default_value_t = DEFAULT_CONTROL_STEP)]
    pub vstep: f64,

    /// Settle delay before each meter read (ms).
    #[arg(long, default_value_t = 0)]
    pub settle_ms: u64,

    /// Random seed for meter noise.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Meter noise standard deviation (dB).
    #[arg(long, default_value_t = 0.01)]
    pub noise: f64,

    /// Write the raw sweep table to CSV.
    #[arg(long)]
    pub sweep_out: Option<PathBuf>,

    /// Write the calibration report text.
    #[arg(long)]
    pub report_out: Option<PathBuf>,
}

/// Options for `pincal fit`.
#[derive(Debug, Args, Clone)]
pub struct FitArgs {
    /// Sweep table CSV (`volts,<bias>...`).
    #[arg(long, value_name = "CSV")]
    pub sweep: PathBuf,

    #[command(flatten)]
    pub calibration: CalibrationArgs,
}

/// Options for `pincal set`.
#[derive(Debug, Args, Clone)]
pub struct SetArgs {
    /// Requested attenuation (dB); negative values are taken as their magnitude.
    #[arg(allow_hyphen_values = true)]
    pub attenuation: f64,

    /// Calibration bundle JSON.
    #[arg(long, env = "PINCAL_BUNDLE")]
    pub bundle: PathBuf,

    /// Channel id in the bundle.
    #[arg(long, env = "PINCAL_CHANNEL", default_value = "0")]
    pub channel: String,

    /// Random seed for simulated meter noise.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Simulated meter noise standard deviation (dB).
    #[arg(long, default_value_t = 0.01)]
    pub noise: f64,
}

/// Options for `pincal validate`.
#[derive(Debug, Args, Clone)]
pub struct ValidateArgs {
    /// Calibration bundle JSON.
    #[arg(long, env = "PINCAL_BUNDLE")]
    pub bundle: PathBuf,

    /// Channel id in the bundle.
    #[arg(long, env = "PINCAL_CHANNEL", default_value = "0")]
    pub channel: String,

    /// Resampling step (V) (default: automatic).
    #[arg(long)]
    pub step: Option<f64>,
}
