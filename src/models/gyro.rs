//! Gyromagnetic ratio lookup.
//!
//! Values are in Hz/Tesla, taken from the reference data the acquisition
//! software ships with. An unknown nucleus is a hard error: a defaulted ratio
//! would silently corrupt every downstream diffusion coefficient.

use crate::error::{AppError, ErrorKind};

/// Fixed table of supported nuclei, Hz/Tesla.
const GYRO_TABLE: &[(&str, f64)] = &[
    ("H1", 42_577_478.518_18),
    ("F19", 40_052_000.0),
    ("Li7", 16_546_000.0),
    ("Na23", 11_262_000.0),
];

/// Look up the gyromagnetic ratio for a nucleus identifier.
pub fn gyromagnetic_ratio(nucleus: &str) -> Result<f64, AppError> {
    GYRO_TABLE
        .iter()
        .find(|(name, _)| *name == nucleus)
        .map(|(_, gamma)| *gamma)
        .ok_or_else(|| {
            AppError::new(
                ErrorKind::UnsupportedNucleus,
                format!(
                    "Nucleus '{nucleus}' is not in the gyromagnetic ratio table (supported: {}).",
                    supported_nuclei().join(", ")
                ),
            )
        })
}

/// Names of all supported nuclei, in table order.
pub fn supported_nuclei() -> Vec<&'static str> {
    GYRO_TABLE.iter().map(|(name, _)| *name).collect()
}
