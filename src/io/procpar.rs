//! Acquisition parameter (procpar) reading.
//!
//! A Varian/Agilent `procpar` file is a sequence of parameter blocks:
//!
//! ```text
//! name subtype basictype ...        <- header, first token is the name
//! N value1 [value2 ...]             <- N values (strings quoted)
//! 0                                 <- enumeration line
//! ```
//!
//! We parse the subset of this grammar that PFG diffusion runs use: numeric
//! value arrays on the count line, and quoted string values without embedded
//! whitespace (one per line for multi-valued strings). The result is a
//! string-keyed store (`name → value fields`); typed extraction happens in
//! [`acquisition_parameters`].
//!
//! Design goals:
//! - **Strict required fields** with clear errors naming the field
//! - **No silent defaults** (a defaulted timing constant would corrupt every
//!   fitted coefficient downstream)
//! - **Separation of concerns**: no normalization or fitting logic here

use std::collections::HashMap;
use std::path::Path;

use crate::domain::AcquisitionParameters;
use crate::error::{AppError, ErrorKind};

/// Parameter names the pipeline reads, as recorded by the acquisition software.
const PAR_NUCLEUS: &str = "tn";
const PAR_GRADIENT_CAL: &str = "gcal_";
const PAR_GRADIENT_LEVELS: &str = "gzlvl1";
const PAR_BIG_DELTA: &str = "del";
const PAR_LITTLE_DELTA: &str = "gt1";

/// A parsed parameter record store: `name → value fields`.
#[derive(Debug, Clone, Default)]
pub struct ParameterStore {
    entries: HashMap<String, Vec<String>>,
}

impl ParameterStore {
    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.entries.get(name).map(|v| v.as_slice())
    }

    fn require(&self, name: &str) -> Result<&[String], AppError> {
        let values = self.entries.get(name).ok_or_else(|| {
            AppError::new(
                ErrorKind::MissingField,
                format!("Required parameter '{name}' is missing from procpar."),
            )
        })?;
        if values.is_empty() {
            return Err(AppError::new(
                ErrorKind::MissingField,
                format!("Parameter '{name}' has no values."),
            ));
        }
        Ok(values)
    }

    /// First value of `name`, coerced to f64.
    fn require_f64(&self, name: &str) -> Result<f64, AppError> {
        let values = self.require(name)?;
        parse_f64(name, &values[0])
    }

    /// All values of `name`, coerced to f64, in record order.
    fn require_f64_array(&self, name: &str) -> Result<Vec<f64>, AppError> {
        let values = self.require(name)?;
        values.iter().map(|v| parse_f64(name, v)).collect()
    }

    /// First value of `name`, as a string.
    fn require_str(&self, name: &str) -> Result<&str, AppError> {
        Ok(self.require(name)?[0].as_str())
    }
}

fn parse_f64(name: &str, value: &str) -> Result<f64, AppError> {
    value.parse::<f64>().map_err(|_| {
        AppError::new(
            ErrorKind::TypeMismatch,
            format!("Parameter '{name}' value '{value}' is not numeric."),
        )
    })
}

/// Read and parse a procpar file.
pub fn read_procpar(path: &Path) -> Result<ParameterStore, AppError> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        AppError::new(
            ErrorKind::Io,
            format!("Failed to read procpar '{}': {e}", path.display()),
        )
    })?;
    parse_procpar(&text)
}

/// Parse procpar text into a parameter store.
///
/// Lines that do not start a parameter block (value continuations already
/// consumed, enumeration lines) begin with a digit and are skipped at the top
/// level.
pub fn parse_procpar(text: &str) -> Result<ParameterStore, AppError> {
    let lines: Vec<&str> = text.lines().collect();
    let mut entries = HashMap::new();
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i].trim();
        i += 1;

        if !starts_parameter_block(line) {
            continue;
        }
        let name = line.split_whitespace().next().unwrap_or_default().to_string();

        let Some(&value_line) = lines.get(i) else {
            return Err(AppError::new(
                ErrorKind::MalformedRecord,
                format!("Parameter '{name}' is truncated (no value line)."),
            ));
        };
        i += 1;

        let mut tokens = value_line.split_whitespace();
        let count: usize = tokens
            .next()
            .and_then(|t| t.parse().ok())
            .ok_or_else(|| {
                AppError::new(
                    ErrorKind::MalformedRecord,
                    format!("Parameter '{name}' has an invalid value count line."),
                )
            })?;

        let mut values: Vec<String> = tokens.map(strip_quotes).collect();

        // Multi-valued strings continue one per line.
        while values.len() < count {
            let Some(&cont) = lines.get(i) else {
                return Err(AppError::new(
                    ErrorKind::MalformedRecord,
                    format!(
                        "Parameter '{name}' declares {count} values but only {} were found.",
                        values.len()
                    ),
                ));
            };
            i += 1;
            values.extend(cont.split_whitespace().map(strip_quotes));
        }

        if values.len() != count {
            return Err(AppError::new(
                ErrorKind::MalformedRecord,
                format!(
                    "Parameter '{name}' declares {count} values but {} were found.",
                    values.len()
                ),
            ));
        }

        entries.insert(name, values);
    }

    Ok(ParameterStore { entries })
}

fn starts_parameter_block(line: &str) -> bool {
    line.chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
}

fn strip_quotes(token: &str) -> String {
    token.trim_matches('"').to_string()
}

/// Extract the strongly-typed acquisition parameters the pipeline needs.
pub fn acquisition_parameters(store: &ParameterStore) -> Result<AcquisitionParameters, AppError> {
    Ok(AcquisitionParameters {
        nucleus: store.require_str(PAR_NUCLEUS)?.to_string(),
        gradient_calibration: store.require_f64(PAR_GRADIENT_CAL)?,
        gradient_levels: store.require_f64_array(PAR_GRADIENT_LEVELS)?,
        big_delta: store.require_f64(PAR_BIG_DELTA)?,
        little_delta: store.require_f64(PAR_LITTLE_DELTA)?,
    })
}
