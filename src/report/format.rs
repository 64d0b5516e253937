//! Formatted output for sweeps, bias selection and fit validation.
//!
//! Formatting lives in one place so the fitting code stays free of
//! presentation concerns and output changes are localized.

use crate::atten::AttenuatorCalibration;
use crate::domain::SweepTable;
use crate::fit::{BiasSelection, CurveValidation};

/// Calibration report text for one attenuator.
///
/// Two comment lines (`# Attenuator <id>`, `# Biases: [...]`) followed by one
/// row per control voltage: the voltage, then the reading for every bias.
pub fn format_calibration_report(id: &str, table: &SweepTable) -> String {
    let mut out = String::new();
    out.push_str(&format!("# Attenuator {id}\n"));
    let biases: Vec<String> = table.biases.iter().map(|b| b.to_string()).collect();
    out.push_str(&format!("# Biases: [{}]\n", biases.join(", ")));
    for (volts, readings) in table.rows() {
        out.push_str(&format!("{volts:5.2} "));
        for p in readings {
            out.push_str(&format!("  {p:7.3}"));
        }
        out.push('\n');
    }
    out
}

/// Bias candidates, the chosen bias and the committed calibration.
pub fn format_run_summary(
    channel: &str,
    selection: &BiasSelection,
    calibration: &AttenuatorCalibration,
) -> String {
    let mut out = String::new();

    out.push_str("=== pincal - PIN attenuator calibration ===\n");
    out.push_str(&format!("Channel: {channel}\n"));
    out.push_str(&format!(
        "Method: {} | inversion: {:?}\n",
        calibration.method.display_name(),
        calibration.inversion
    ));

    out.push_str("\nBias candidates:\n");
    let best = selection.winner().bias;
    for c in &selection.candidates {
        let chosen = if c.bias == best { "*" } else { " " };
        out.push_str(&format!(
            "{chosen} {:>5.2} V  lower={:>8.1} dBm  upper={:>8.1} dBm  range={:>5.1} dB\n",
            c.bias,
            c.lower,
            c.upper,
            c.useful_range()
        ));
    }
    for (bias, reason) in &selection.skipped {
        out.push_str(&format!("  (skipped {bias:.2} V) {reason}\n"));
    }

    out.push_str("\nCalibration:\n");
    out.push_str(&format!("- bias: {:.2} V\n", calibration.bias));
    out.push_str(&format!(
        "- forward fit: {}\n",
        calibration.forward.interpolant.display_name()
    ));
    out.push_str(&format!(
        "- max attenuation: {:.2} dB\n",
        calibration.max_attenuation
    ));
    out.push('\n');
    out.push_str(&format_atten_table(calibration));

    out
}

/// Whole-dB attenuation -> control voltage table.
pub fn format_atten_table(calibration: &AttenuatorCalibration) -> String {
    let mut out = String::new();
    out.push_str(&format!("{:>6} {:>10}\n", "dB", "volts"));
    out.push_str(&format!("{:-<6} {:-<10}\n", "", ""));
    for (db, volts) in &calibration.atten_table {
        out.push_str(&format!("{db:>6} {volts:>10.4}\n"));
    }
    out
}

/// Slope summary of a resampled forward fit.
pub fn format_validation(validation: &CurveValidation) -> String {
    let verdict = if validation.monotonic {
        "monotonic"
    } else {
        "NOT monotonic"
    };
    format!(
        "Validation: step={} | {} slopes | slope=[{:.4}, {:.4}] dB/V | {verdict}\n",
        validation.step,
        validation.slopes.len(),
        validation.min_slope,
        validation.max_slope,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn calibration_report_layout() {
        let table = SweepTable {
            biases: vec![2.0, 3.5, 3.0],
            volts: vec![-5.0, 0.25],
            powers: vec![vec![-10.1234, -20.5], vec![-9.87, -31.0], vec![-1.0, -2.0]],
        };
        let text = format_calibration_report("7", &table);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "# Attenuator 7");
        assert_eq!(lines[1], "# Biases: [2, 3.5, 3]");
        assert_eq!(lines[2], "-5.00   -10.123   -9.870   -1.000");
        assert_eq!(lines[3], " 0.25   -20.500  -31.000   -2.000");
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn validation_line_flags_non_monotonic() {
        let v = CurveValidation {
            step: 0.01,
            slopes: vec![1.0, -1.0],
            min_slope: -1.0,
            max_slope: 1.0,
            monotonic: false,
        };
        let line = format_validation(&v);
        assert!(line.contains("NOT monotonic"));
        assert!(line.contains("2 slopes"));
    }
}
