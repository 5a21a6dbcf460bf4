//! Integration log reading.
//!
//! The integration log (`integ_series.txt` from the processing software) is a
//! text stream of whitespace-delimited records, one measurement set per line.
//! Only the LAST non-empty record carries the final integral series; its
//! first three tokens are metadata (row label, region bounds) and are
//! discarded. The remainder is the intensity series, index-aligned with the
//! gradient level array from procpar.

use std::path::Path;

use crate::error::{AppError, ErrorKind};

/// Number of leading metadata tokens on each record.
const METADATA_TOKENS: usize = 3;

/// Read the final intensity series from an integration log file.
pub fn read_integration_log(path: &Path) -> Result<Vec<f64>, AppError> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        AppError::new(
            ErrorKind::Io,
            format!("Failed to read integration log '{}': {e}", path.display()),
        )
    })?;
    parse_integration_log(&text)
}

/// Parse the last non-empty record of integration log text.
pub fn parse_integration_log(text: &str) -> Result<Vec<f64>, AppError> {
    let record = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .next_back()
        .ok_or_else(|| {
            AppError::new(ErrorKind::EmptyLog, "Integration log has no records.")
        })?;

    let tokens: Vec<&str> = record.split_whitespace().collect();
    if tokens.len() <= METADATA_TOKENS {
        return Err(AppError::new(
            ErrorKind::MalformedRecord,
            format!(
                "Final record has {} tokens; expected at least {} (metadata + intensities).",
                tokens.len(),
                METADATA_TOKENS + 1
            ),
        ));
    }

    tokens[METADATA_TOKENS..]
        .iter()
        .enumerate()
        .map(|(i, token)| {
            token.parse::<f64>().map_err(|_| {
                AppError::new(
                    ErrorKind::MalformedRecord,
                    format!(
                        "Intensity token {} ('{token}') in the final record is not numeric.",
                        i + 1
                    ),
                )
            })
        })
        .collect()
}
