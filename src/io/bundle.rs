//! Read/write calibration bundle JSON files.
//!
//! A bundle is the portable form of one or more committed calibrations, keyed
//! by channel id. The schema is `domain::CalibrationBundle`.

use std::fs::File;
use std::path::Path;

use crate::atten::AttenuatorCalibration;
use crate::domain::CalibrationBundle;
use crate::error::AppError;

/// Write a bundle JSON file.
pub fn write_bundle(path: &Path, bundle: &CalibrationBundle) -> Result<(), AppError> {
    let file = File::create(path).map_err(|e| {
        AppError::new(2, format!("Failed to create bundle JSON '{}': {e}", path.display()))
    })?;
    serde_json::to_writer_pretty(file, bundle)
        .map_err(|e| AppError::new(2, format!("Failed to write bundle JSON: {e}")))?;
    Ok(())
}

/// Read a bundle JSON file and check every channel's calibration.
pub fn read_bundle(path: &Path) -> Result<CalibrationBundle, AppError> {
    let file = File::open(path).map_err(|e| {
        AppError::new(2, format!("Failed to open bundle JSON '{}': {e}", path.display()))
    })?;
    let bundle: CalibrationBundle = serde_json::from_reader(file)
        .map_err(|e| AppError::new(2, format!("Invalid bundle JSON: {e}")))?;

    for (id, cal) in &bundle.channels {
        cal.validate()
            .map_err(|e| AppError::new(e.exit_code(), format!("Channel '{id}': {e}")))?;
    }
    Ok(bundle)
}

/// Insert or replace one channel in the bundle at `path`.
///
/// A missing file starts a fresh bundle.
pub fn upsert_channel(
    path: &Path,
    channel: &str,
    calibration: AttenuatorCalibration,
) -> Result<CalibrationBundle, AppError> {
    let mut bundle = if path.exists() {
        read_bundle(path)?
    } else {
        CalibrationBundle::new()
    };
    bundle.created = chrono::Utc::now();
    bundle.channels.insert(channel.to_string(), calibration);
    write_bundle(path, &bundle)?;
    Ok(bundle)
}
