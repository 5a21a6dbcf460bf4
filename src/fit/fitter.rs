//! Low-level fitting routine for a single model kind.
//!
//! Given:
//! - a validated, normalized observation set
//! - the acquisition's physical constants (γ, Δ, δ)
//! - a model kind
//!
//! we run the damped least-squares solver and package the estimates, their
//! covariance, and the derived diffusion coefficients into a `FitResult`.
//!
//! The engine is deliberately model-agnostic: it consumes the model's
//! parameter count, initial guess, and function value, and never branches on
//! the model identity itself. Changing the model mid-fit is not a supported
//! operation; callers select the variant once and invoke again for a
//! different one.

use crate::domain::{DecayDataset, FitQuality, FitResult, ModelKind};
use crate::error::{AppError, ErrorKind};
use crate::math::{LmOptions, curve_fit};
use crate::models::StejskalTanner;

/// Fitting options that affect how a model is calibrated.
#[derive(Debug, Clone, Default)]
pub struct FitOptions {
    /// Optional initial-guess override (the `p0` of the underlying solver).
    ///
    /// When unset, the model's fixed guess vector is used. The default
    /// two-component guess starts both components identical; a damped
    /// least-squares step preserves that symmetry, so callers fitting two
    /// well-separated species should seed the components apart.
    pub initial_guess: Option<Vec<f64>>,

    /// Solver tolerances and iteration budget.
    pub lm: LmOptions,
}

/// Fit a single model kind to a normalized decay dataset.
///
/// No constraint enforces physical positivity of diffusion coefficients or
/// intensities; solver-returned negative values are reported as-is.
pub fn fit_model(
    kind: ModelKind,
    dataset: &DecayDataset,
    constants: &StejskalTanner,
    opts: &FitOptions,
) -> Result<FitResult, AppError> {
    let p = kind.param_count();

    let guess = match &opts.initial_guess {
        Some(g) => {
            if g.len() != p {
                return Err(AppError::new(
                    ErrorKind::Usage,
                    format!(
                        "Initial guess has {} values but the {} model has {p} parameters.",
                        g.len(),
                        kind.display_name()
                    ),
                ));
            }
            g.clone()
        }
        None => kind.initial_guess(),
    };

    let model = constants.model_fn(kind);
    let lm = curve_fit(
        model,
        &dataset.gradient_values,
        &dataset.normalized,
        &guess,
        &opts.lm,
    )?;

    let n = dataset.len();
    let covariance: Vec<Vec<f64>> = (0..p)
        .map(|i| (0..p).map(|j| lm.covariance[(i, j)]).collect())
        .collect();

    // Index 1 for one component, indices 1 and 3 for two. The asymmetry is
    // the model's fixed parameter-order convention, not something to
    // generalize over.
    let diffusion_coefficients: Vec<f64> = kind
        .diffusion_indices()
        .iter()
        .map(|&i| lm.parameters[i])
        .collect();
    let standard_deviations: Vec<f64> = kind
        .diffusion_indices()
        .iter()
        .map(|&i| lm.covariance[(i, i)].sqrt())
        .collect();

    let quality = FitQuality {
        sse: lm.sse,
        rmse: (lm.sse / n as f64).sqrt(),
        n,
        iterations: lm.iterations,
    };

    Ok(FitResult {
        model: kind,
        parameters: lm.parameters,
        covariance,
        diffusion_coefficients,
        standard_deviations,
        quality,
    })
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

    fn synthetic_dataset(constants: &StejskalTanner, kind: ModelKind, params: &[f64]) -> DecayDataset {
        let gradients: Vec<f64> = (0..9).map(|i| i as f64 * 5.0).collect();
        let intensity: Vec<f64> = gradients
            .iter()
            .map(|&g| constants.predict(kind, g, params))
            .collect();
        DecayDataset::new("H1", gradients, intensity).unwrap()
    }

    #[test]
    fn one_component_round_trip_is_exact() {
        let st = proton();
        let ds = synthetic_dataset(&st, ModelKind::OneComponent, &[1.0, 1e-10]);

        let fit = fit_model(ModelKind::OneComponent, &ds, &st, &FitOptions::default()).unwrap();

        assert!((fit.parameters[0] - 1.0).abs() < 1e-6);
        assert!((fit.parameters[1] - 1e-10).abs() / 1e-10 < 1e-6);
        assert_eq!(fit.diffusion_coefficients.len(), 1);
        assert!((fit.diffusion_coefficients[0] - fit.parameters[1]).abs() == 0.0);
    }

    #[test]
    fn two_component_recovery_is_order_invariant() {
        let st = proton();
        // Same physical mixture, components summed in both orders.
        let forward = synthetic_dataset(&st, ModelKind::TwoComponent, &[0.6, 5e-10, 0.4, 5e-11]);
        let swapped = synthetic_dataset(&st, ModelKind::TwoComponent, &[0.4, 5e-11, 0.6, 5e-10]);

        // A symmetric start keeps both components identical forever, so seed
        // the diffusion guesses a decade apart.
        let opts = FitOptions {
            initial_guess: Some(vec![0.5, 1e-9, 0.5, 1e-11]),
            lm: LmOptions::default(),
        };

        for ds in [&forward, &swapped] {
            let fit = fit_model(ModelKind::TwoComponent, ds, &st, &opts).unwrap();
            let mut ds_sorted = fit.diffusion_coefficients.clone();
            ds_sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
            assert!((ds_sorted[0] - 5e-11).abs() / 5e-11 < 1e-5, "D_slow = {}", ds_sorted[0]);
            assert!((ds_sorted[1] - 5e-10).abs() / 5e-10 < 1e-5, "D_fast = {}", ds_sorted[1]);
        }
    }

    #[test]
    fn two_component_reports_two_sigmas() {
        let st = proton();
        let ds = synthetic_dataset(&st, ModelKind::TwoComponent, &[0.6, 5e-10, 0.4, 5e-11]);
        let opts = FitOptions {
            initial_guess: Some(vec![0.5, 1e-9, 0.5, 1e-11]),
            lm: LmOptions::default(),
        };
        let fit = fit_model(ModelKind::TwoComponent, &ds, &st, &opts).unwrap();
        assert_eq!(fit.diffusion_coefficients.len(), 2);
        assert_eq!(fit.standard_deviations.len(), 2);
        assert!(fit.standard_deviations.iter().all(|s| s.is_finite()));
    }

    #[test]
    fn concrete_linear_decay_scenario_converges() {
        // Gradient levels [0..4] at calibration 10, intensities stepping
        // 100..20. Not an exact exponential, but a one-component fit must
        // still converge to a positive D with I0 near 1.
        let st = proton();
        let ds = DecayDataset::new(
            "H1",
            vec![0.0, 10.0, 20.0, 30.0, 40.0],
            vec![100.0, 80.0, 60.0, 40.0, 20.0],
        )
        .unwrap();

        let fit = fit_model(ModelKind::OneComponent, &ds, &st, &FitOptions::default()).unwrap();
        let i0 = fit.parameters[0];
        let d = fit.diffusion_coefficients[0];
        assert!(d > 0.0, "expected positive D, got {d}");
        assert!(d > 1e-11 && d < 1e-8, "D out of plausible range: {d}");
        assert!(i0 > 0.8 && i0 < 1.2, "I0 far from 1: {i0}");
        assert!(fit.quality.rmse.is_finite());
        assert!(fit.quality.n == 5);
    }

    #[test]
    fn wrong_guess_length_is_a_usage_error() {
        let st = proton();
        let ds = synthetic_dataset(&st, ModelKind::OneComponent, &[1.0, 1e-10]);
        let opts = FitOptions {
            initial_guess: Some(vec![1.0]),
            lm: LmOptions::default(),
        };
        let err = fit_model(ModelKind::OneComponent, &ds, &st, &opts).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Usage);
    }

    #[test]
    fn too_few_points_fails_before_uncertainty() {
        let st = proton();
        let ds = DecayDataset::new("H1", vec![0.0, 10.0], vec![100.0, 60.0]).unwrap();
        let err = fit_model(ModelKind::OneComponent, &ds, &st, &FitOptions::default()).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::SingularCovariance);
    }
}
