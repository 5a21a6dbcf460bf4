//! Reporting utilities: fit summaries and per-point residuals.
//!
//! The summarizer only extracts and derives; it never re-fits or
//! re-normalizes. Formatting code lives in `format` so output changes stay
//! localized.

use serde::{Deserialize, Serialize};

use crate::domain::{DecayDataset, FitQuality, FitResult, ModelKind};
use crate::models::StejskalTanner;

pub mod format;

pub use format::*;

/// One diffusing species in the fitted model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentEstimate {
    /// Fitted intensity weight (I0 / I1 / I2).
    pub weight: f64,
    /// Fitted diffusion coefficient, m²/s.
    pub d: f64,
    /// Standard deviation of `d`, m²/s.
    pub sigma: f64,
}

/// One observation with its fitted value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitPoint {
    /// Gradient strength, gauss/cm.
    pub gradient: f64,
    /// Normalized observed intensity.
    pub observed: f64,
    /// Model prediction at the fitted parameters.
    pub fitted: f64,
    pub residual: f64,
}

/// Reportable fit output for the calling interface to log or plot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitSummary {
    pub model: ModelKind,
    pub nucleus: String,
    /// One entry per diffusing species, in parameter order.
    pub components: Vec<ComponentEstimate>,
    pub points: Vec<FitPoint>,
    pub quality: FitQuality,
}

/// Derive the reportable summary from a raw fit result.
///
/// Diffusion coefficients and standard deviations are taken from the fit
/// result as-is (index 1 for one component, indices 1 and 3 for two);
/// intensity weights come from the matching weight indices. Fitted values are
/// evaluated at the estimated parameters for display only.
pub fn summarize(fit: &FitResult, dataset: &DecayDataset, constants: &StejskalTanner) -> FitSummary {
    let components = fit
        .model
        .weight_indices()
        .iter()
        .zip(fit.diffusion_coefficients.iter())
        .zip(fit.standard_deviations.iter())
        .map(|((&wi, &d), &sigma)| ComponentEstimate {
            weight: fit.parameters[wi],
            d,
            sigma,
        })
        .collect();

    let points = dataset
        .gradient_values
        .iter()
        .zip(dataset.normalized.iter())
        .map(|(&g, &observed)| {
            let fitted = constants.predict(fit.model, g, &fit.parameters);
            FitPoint {
                gradient: g,
                observed,
                fitted,
                residual: observed - fitted,
            }
        })
        .collect();

    FitSummary {
        model: fit.model,
        nucleus: dataset.nucleus.clone(),
        components,
        points,
        quality: fit.quality.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn proton() -> StejskalTanner {
        StejskalTanner {
            gamma: 42_577_478.518_18,
            big_delta: 0.1,
            little_delta: 0.002,
        }
    }

    fn fake_fit(model: ModelKind, parameters: Vec<f64>, sigmas: Vec<f64>) -> FitResult {
        let p = model.param_count();
        let ds = model
            .diffusion_indices()
            .iter()
            .map(|&i| parameters[i])
            .collect();
        FitResult {
            model,
            parameters,
            covariance: vec![vec![0.0; p]; p],
            diffusion_coefficients: ds,
            standard_deviations: sigmas,
            quality: FitQuality {
                sse: 0.0,
                rmse: 0.0,
                n: 3,
                iterations: 1,
            },
        }
    }

    #[test]
    fn one_component_summary_has_single_entry() {
        let st = proton();
        let ds = DecayDataset::new("H1", vec![0.0, 10.0, 20.0], vec![10.0, 8.0, 6.0]).unwrap();
        let fit = fake_fit(ModelKind::OneComponent, vec![0.95, 2e-10], vec![3e-12]);

        let summary = summarize(&fit, &ds, &st);
        assert_eq!(summary.components.len(), 1);
        assert!((summary.components[0].weight - 0.95).abs() < 1e-15);
        assert!((summary.components[0].d - 2e-10).abs() < 1e-25);
        assert!((summary.components[0].sigma - 3e-12).abs() < 1e-25);
        assert_eq!(summary.points.len(), 3);
    }

    #[test]
    fn two_component_summary_preserves_parameter_order() {
        let st = proton();
        let ds = DecayDataset::new("H1", vec![0.0, 10.0, 20.0], vec![10.0, 8.0, 6.0]).unwrap();
        let fit = fake_fit(
            ModelKind::TwoComponent,
            vec![0.6, 5e-10, 0.4, 5e-11],
            vec![1e-12, 2e-12],
        );

        let summary = summarize(&fit, &ds, &st);
        assert_eq!(summary.components.len(), 2);
        assert!((summary.components[0].weight - 0.6).abs() < 1e-15);
        assert!((summary.components[0].d - 5e-10).abs() < 1e-25);
        assert!((summary.components[1].weight - 0.4).abs() < 1e-15);
        assert!((summary.components[1].d - 5e-11).abs() < 1e-25);
    }

    #[test]
    fn residuals_are_observed_minus_fitted() {
        let st = proton();
        let ds = DecayDataset::new("H1", vec![0.0, 10.0], vec![10.0, 8.0]).unwrap();
        let fit = fake_fit(ModelKind::OneComponent, vec![1.0, 1e-10], vec![0.0]);

        let summary = summarize(&fit, &ds, &st);
        for p in &summary.points {
            let expected = p.observed - st.predict(ModelKind::OneComponent, p.gradient, &fit.parameters);
            assert!((p.residual - expected).abs() < 1e-15);
        }
        // At g = 0 the model equals I0 = 1.0 and the observation is exactly 1.0.
        assert!(summary.points[0].residual.abs() < 1e-15);
    }
}
