//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory during fitting
//! - exported to JSON/CSV
//! - reloaded later for comparisons across datasets

use std::path::PathBuf;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, ErrorKind};

/// Which decay model to fit.
///
/// The variant is chosen by the caller before the fit; the regression engine
/// never infers it from data and never branches on it internally. It only
/// consumes the parameter count, the initial guess, and the model function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    /// Single diffusing species: `I(g) = I0 · exp(-D · E(g))`.
    #[value(name = "one")]
    OneComponent,
    /// Two diffusing species: `I(g) = I1 · exp(-D1 · E(g)) + I2 · exp(-D2 · E(g))`.
    #[value(name = "two")]
    TwoComponent,
}

impl ModelKind {
    /// Human-readable label for terminal output.
    pub fn display_name(self) -> &'static str {
        match self {
            ModelKind::OneComponent => "1-component",
            ModelKind::TwoComponent => "2-component",
        }
    }

    /// Number of free parameters for this model.
    pub fn param_count(self) -> usize {
        match self {
            ModelKind::OneComponent => 2,
            ModelKind::TwoComponent => 4,
        }
    }

    /// The fixed initial parameter vector used when the caller supplies none.
    ///
    /// Parameter order is `[I0, D]` and `[I1, D1, I2, D2]` respectively; every
    /// index mapping below depends on this order staying fixed.
    pub fn initial_guess(self) -> Vec<f64> {
        match self {
            ModelKind::OneComponent => vec![0.99, 1e-11],
            ModelKind::TwoComponent => vec![0.5, 1e-11, 0.5, 1e-11],
        }
    }

    /// Indices of the diffusion coefficients within the parameter vector.
    pub fn diffusion_indices(self) -> &'static [usize] {
        match self {
            ModelKind::OneComponent => &[1],
            ModelKind::TwoComponent => &[1, 3],
        }
    }

    /// Indices of the intensity weights within the parameter vector.
    pub fn weight_indices(self) -> &'static [usize] {
        match self {
            ModelKind::OneComponent => &[0],
            ModelKind::TwoComponent => &[0, 2],
        }
    }
}

/// Acquisition parameters read from a procpar record.
///
/// Timing constants are in seconds; gradient levels are raw instrument units
/// scaled into gauss/cm by `gradient_calibration`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcquisitionParameters {
    /// Nucleus identifier as recorded by the spectrometer (e.g. `H1`).
    pub nucleus: String,
    /// Instrument gradient calibration factor (`gcal_`).
    pub gradient_calibration: f64,
    /// Raw gradient level array (`gzlvl1`), in acquisition order.
    pub gradient_levels: Vec<f64>,
    /// Diffusion time Δ (`del`), seconds.
    pub big_delta: f64,
    /// Gradient pulse duration δ (`gt1`), seconds.
    pub little_delta: f64,
}

impl AcquisitionParameters {
    /// Derived gradient strengths: `gcal · gzlvl[i]`, same order as the levels.
    pub fn gradient_values(&self) -> Vec<f64> {
        self.gradient_levels
            .iter()
            .map(|lvl| self.gradient_calibration * lvl)
            .collect()
    }
}

/// A normalized observation set ready to fit.
///
/// Constructed through [`DecayDataset::new`], which enforces the invariants
/// the regression engine relies on: equal series lengths and a well-defined
/// normalization (max intensity strictly positive, so `normalized` has max
/// 1.0).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecayDataset {
    pub nucleus: String,
    /// Gradient strengths, gauss/cm.
    pub gradient_values: Vec<f64>,
    /// Raw integrated intensities, index-aligned with `gradient_values`.
    pub intensity: Vec<f64>,
    /// `intensity[i] / max(intensity)`.
    pub normalized: Vec<f64>,
}

impl DecayDataset {
    /// Validate and normalize an observation set.
    pub fn new(
        nucleus: impl Into<String>,
        gradient_values: Vec<f64>,
        intensity: Vec<f64>,
    ) -> Result<Self, AppError> {
        if gradient_values.len() != intensity.len() {
            return Err(AppError::new(
                ErrorKind::LengthMismatch,
                format!(
                    "Gradient series has {} values but intensity series has {}.",
                    gradient_values.len(),
                    intensity.len()
                ),
            ));
        }

        let max = intensity.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if !max.is_finite() || max <= 0.0 {
            return Err(AppError::new(
                ErrorKind::DegenerateSeries,
                format!("Intensity maximum is {max}; cannot normalize."),
            ));
        }

        let normalized = intensity.iter().map(|v| v / max).collect();

        Ok(Self {
            nucleus: nucleus.into(),
            gradient_values,
            intensity,
            normalized,
        })
    }

    pub fn len(&self) -> usize {
        self.gradient_values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gradient_values.is_empty()
    }
}

/// Fit quality diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitQuality {
    pub sse: f64,
    pub rmse: f64,
    pub n: usize,
    pub iterations: usize,
}

/// Output of a single regression invocation.
///
/// Parameter order matches [`ModelKind::initial_guess`]. The diffusion
/// coefficients and their standard deviations are the entries at
/// [`ModelKind::diffusion_indices`], with `sigma = sqrt(cov[i][i])`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitResult {
    pub model: ModelKind,
    pub parameters: Vec<f64>,
    /// Row-major `p × p` covariance matrix.
    pub covariance: Vec<Vec<f64>>,
    /// Diffusion coefficients, m²/s.
    pub diffusion_coefficients: Vec<f64>,
    /// Standard deviations of the diffusion coefficients, m²/s.
    pub standard_deviations: Vec<f64>,
    pub quality: FitQuality,
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus defaults).
#[derive(Debug, Clone)]
pub struct FitConfig {
    /// Directory containing `procpar` and the integration log.
    pub dir: PathBuf,
    /// Parameter file name within `dir`.
    pub procpar_name: String,
    /// Integration log file name within `dir`.
    pub integrals_name: String,

    pub model: ModelKind,
    /// Optional initial-guess override (length must match the model).
    pub initial_guess: Option<Vec<f64>>,

    pub max_iterations: usize,
    pub ftol: f64,
    pub xtol: f64,

    pub export_results: Option<PathBuf>,
    pub export_fit: Option<PathBuf>,
}

/// A saved fit file (JSON).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitFile {
    pub tool: String,
    pub nucleus: String,
    pub model: ModelKind,
    pub parameters: Vec<f64>,
    pub diffusion_coefficients: Vec<f64>,
    pub standard_deviations: Vec<f64>,
    pub quality: FitQuality,
    pub gradient_values: Vec<f64>,
    pub normalized_intensity: Vec<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gradient_values_scale_levels_in_order() {
        let params = AcquisitionParameters {
            nucleus: "H1".to_string(),
            gradient_calibration: 10.0,
            gradient_levels: vec![0.0, 1.0, 2.0, 3.0, 4.0],
            big_delta: 0.1,
            little_delta: 0.002,
        };
        assert_eq!(params.gradient_values(), vec![0.0, 10.0, 20.0, 30.0, 40.0]);
    }

    #[test]
    fn dataset_normalizes_by_max() {
        let ds = DecayDataset::new(
            "H1",
            vec![0.0, 10.0, 20.0, 30.0, 40.0],
            vec![100.0, 80.0, 60.0, 40.0, 20.0],
        )
        .unwrap();
        let expected = [1.0, 0.8, 0.6, 0.4, 0.2];
        for (v, e) in ds.normalized.iter().zip(expected.iter()) {
            assert!((v - e).abs() < 1e-12);
        }
    }

    #[test]
    fn normalization_is_idempotent() {
        let ds = DecayDataset::new("H1", vec![0.0, 10.0, 20.0], vec![50.0, 30.0, 10.0]).unwrap();
        let again = DecayDataset::new("H1", ds.gradient_values.clone(), ds.normalized.clone()).unwrap();
        for (a, b) in again.normalized.iter().zip(ds.normalized.iter()) {
            assert!((a - b).abs() < 1e-12);
        }
        let max = again.normalized.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        assert!((max - 1.0).abs() < 1e-12);
    }

    #[test]
    fn dataset_rejects_length_mismatch() {
        let err = DecayDataset::new(
            "H1",
            vec![0.0, 10.0, 20.0, 30.0, 40.0],
            vec![100.0, 80.0, 60.0, 40.0],
        )
        .unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::LengthMismatch);
    }

    #[test]
    fn dataset_rejects_all_zero_intensities() {
        let err = DecayDataset::new("H1", vec![0.0, 10.0], vec![0.0, 0.0]).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::DegenerateSeries);
    }

    #[test]
    fn model_index_maps_follow_parameter_order() {
        assert_eq!(ModelKind::OneComponent.param_count(), 2);
        assert_eq!(ModelKind::TwoComponent.param_count(), 4);
        assert_eq!(ModelKind::OneComponent.diffusion_indices(), &[1]);
        assert_eq!(ModelKind::TwoComponent.diffusion_indices(), &[1, 3]);
        assert_eq!(ModelKind::TwoComponent.weight_indices(), &[0, 2]);
        assert_eq!(
            ModelKind::OneComponent.initial_guess().len(),
            ModelKind::OneComponent.param_count()
        );
        assert_eq!(
            ModelKind::TwoComponent.initial_guess().len(),
            ModelKind::TwoComponent.param_count()
        );
    }
}
