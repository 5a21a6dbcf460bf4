//! Export fit outputs.
//!
//! Two formats:
//! - a per-point results CSV, easy to consume in spreadsheets or downstream scripts
//! - a fit JSON file carrying the model tag, parameter estimates, and the
//!   observation vectors (the portable representation of one fit)

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::domain::{DecayDataset, FitFile, FitResult};
use crate::error::{AppError, ErrorKind};
use crate::report::FitSummary;

/// Write per-point results to a CSV file.
pub fn write_results_csv(path: &Path, summary: &FitSummary) -> Result<(), AppError> {
    let mut file = File::create(path).map_err(|e| {
        AppError::new(
            ErrorKind::Io,
            format!("Failed to create export CSV '{}': {e}", path.display()),
        )
    })?;

    writeln!(file, "index,gradient_gauss_cm,observed,fitted,residual")
        .map_err(|e| AppError::new(ErrorKind::Io, format!("Failed to write export CSV header: {e}")))?;

    for (i, p) in summary.points.iter().enumerate() {
        writeln!(
            file,
            "{},{:.6},{:.10},{:.10},{:.10}",
            i, p.gradient, p.observed, p.fitted, p.residual
        )
        .map_err(|e| AppError::new(ErrorKind::Io, format!("Failed to write export CSV row: {e}")))?;
    }

    Ok(())
}

/// Write a fit JSON file.
pub fn write_fit_json(path: &Path, fit: &FitResult, dataset: &DecayDataset) -> Result<(), AppError> {
    let file = File::create(path).map_err(|e| {
        AppError::new(
            ErrorKind::Io,
            format!("Failed to create fit JSON '{}': {e}", path.display()),
        )
    })?;

    let out = FitFile {
        tool: "pfg".to_string(),
        nucleus: dataset.nucleus.clone(),
        model: fit.model,
        parameters: fit.parameters.clone(),
        diffusion_coefficients: fit.diffusion_coefficients.clone(),
        standard_deviations: fit.standard_deviations.clone(),
        quality: fit.quality.clone(),
        gradient_values: dataset.gradient_values.clone(),
        normalized_intensity: dataset.normalized.clone(),
    };

    serde_json::to_writer_pretty(file, &out)
        .map_err(|e| AppError::new(ErrorKind::Io, format!("Failed to write fit JSON: {e}")))?;

    Ok(())
}

/// Read a fit JSON file (for comparisons across datasets).
pub fn read_fit_json(path: &Path) -> Result<FitFile, AppError> {
    let file = File::open(path).map_err(|e| {
        AppError::new(
            ErrorKind::Io,
            format!("Failed to open fit JSON '{}': {e}", path.display()),
        )
    })?;
    serde_json::from_reader(file)
        .map_err(|e| AppError::new(ErrorKind::Io, format!("Invalid fit JSON: {e}")))
}
