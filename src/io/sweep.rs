//! Sweep table CSV and calibration report files.
//!
//! CSV layout: a `volts` column followed by one power column per bias, with
//! the bias voltage as the column header:
//!
//! ```text
//! volts,2,2.5,3
//! -5,-10.31,-10.27,-10.25
//! ```

use std::fs::{self, File};
use std::path::Path;

use crate::domain::SweepTable;
use crate::error::AppError;
use crate::report::format_calibration_report;

/// Write a sweep table as CSV.
pub fn write_sweep_csv(path: &Path, table: &SweepTable) -> Result<(), AppError> {
    table.validate()?;
    let file = File::create(path).map_err(|e| {
        AppError::new(2, format!("Failed to create sweep CSV '{}': {e}", path.display()))
    })?;
    let mut writer = csv::Writer::from_writer(file);

    let header: Vec<String> = std::iter::once("volts".to_string())
        .chain(table.biases.iter().map(|b| b.to_string()))
        .collect();
    writer
        .write_record(&header)
        .map_err(|e| AppError::new(2, format!("Failed to write sweep CSV header: {e}")))?;

    for (volts, readings) in table.rows() {
        let record: Vec<String> = std::iter::once(volts.to_string())
            .chain(readings.iter().map(|p| p.to_string()))
            .collect();
        writer
            .write_record(&record)
            .map_err(|e| AppError::new(2, format!("Failed to write sweep CSV row: {e}")))?;
    }

    writer
        .flush()
        .map_err(|e| AppError::new(2, format!("Failed to flush sweep CSV: {e}")))?;
    Ok(())
}

/// Read a sweep table CSV written by [`write_sweep_csv`] (or by hand).
pub fn read_sweep_csv(path: &Path) -> Result<SweepTable, AppError> {
    let file = File::open(path).map_err(|e| {
        AppError::new(2, format!("Failed to open sweep CSV '{}': {e}", path.display()))
    })?;
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(file);

    let headers = reader
        .headers()
        .map_err(|e| AppError::new(2, format!("Failed to read sweep CSV headers: {e}")))?
        .clone();

    let mut columns = headers.iter();
    let first = columns
        .next()
        .map(|h| h.trim_start_matches('\u{feff}').to_ascii_lowercase())
        .unwrap_or_default();
    if first != "volts" {
        return Err(AppError::new(
            3,
            format!("Sweep CSV must start with a 'volts' column, found '{first}'."),
        ));
    }
    let biases = columns
        .map(|h| {
            h.parse::<f64>()
                .map_err(|_| AppError::new(3, format!("Bias column header '{h}' is not a number.")))
        })
        .collect::<Result<Vec<f64>, AppError>>()?;
    if biases.is_empty() {
        return Err(AppError::new(3, "Sweep CSV has no bias columns."));
    }

    let mut volts = Vec::new();
    let mut powers = vec![Vec::new(); biases.len()];
    for (idx, result) in reader.records().enumerate() {
        let line = idx + 2;
        let record =
            result.map_err(|e| AppError::new(3, format!("Sweep CSV line {line}: {e}")))?;
        let parse = |field: Option<&str>| -> Result<f64, AppError> {
            let field = field.unwrap_or("");
            field
                .parse::<f64>()
                .map_err(|_| AppError::new(3, format!("Sweep CSV line {line}: '{field}' is not a number.")))
        };
        volts.push(parse(record.get(0))?);
        for (col, column) in powers.iter_mut().enumerate() {
            column.push(parse(record.get(col + 1))?);
        }
    }

    let table = SweepTable {
        biases,
        volts,
        powers,
    };
    table.validate()?;
    Ok(table)
}

/// Write the calibration report text for one attenuator.
pub fn write_calibration_report(path: &Path, id: &str, table: &SweepTable) -> Result<(), AppError> {
    fs::write(path, format_calibration_report(id, table)).map_err(|e| {
        AppError::new(2, format!("Failed to write report '{}': {e}", path.display()))
    })
}
