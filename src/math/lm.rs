//! Damped least-squares (Levenberg–Marquardt) curve fitting.
//!
//! In this project we fit a small nonlinear model `f(x, p)` to observation
//! pairs by minimizing:
//!
//! ```text
//! SSE(p) = Σ (y_i - f(x_i, p))²
//! ```
//!
//! Implementation choices:
//! - The Jacobian is estimated by forward differences with a relative step,
//!   so callers only supply the model function itself.
//! - Damping uses Marquardt's diagonal scaling, `(JᵀJ + λ·diag(JᵀJ))·δ = Jᵀr`.
//!   The diagonal scaling keeps the step well-conditioned even though the
//!   parameters differ by ten orders of magnitude (intensities near 1,
//!   diffusion coefficients near 1e-10).
//! - The covariance estimate follows the usual nonlinear-regression
//!   convention: `cov = SSE/(n−p) · (JᵀJ)⁻¹` evaluated at the minimum.

use nalgebra::{DMatrix, DVector};

use crate::error::{AppError, ErrorKind};

/// Relative forward-difference step (≈ sqrt of machine epsilon).
const FD_STEP: f64 = 1.49e-8;

/// Initial damping factor.
const LAMBDA_INIT: f64 = 1e-3;

/// Damping growth/shrink factors on rejected/accepted steps.
const LAMBDA_UP: f64 = 10.0;
const LAMBDA_DOWN: f64 = 0.1;

/// Damping ceiling; exceeding it means no downhill step exists at this point.
const LAMBDA_MAX: f64 = 1e12;

/// Solver tolerances and budget.
#[derive(Debug, Clone, Copy)]
pub struct LmOptions {
    /// Maximum number of accepted iterations (Jacobian evaluations).
    pub max_iterations: usize,
    /// Relative SSE-improvement threshold for convergence.
    pub ftol: f64,
    /// Relative step-size threshold for convergence.
    pub xtol: f64,
}

impl Default for LmOptions {
    fn default() -> Self {
        Self {
            max_iterations: 200,
            ftol: 1e-12,
            xtol: 1e-12,
        }
    }
}

/// Converged solver output.
#[derive(Debug, Clone)]
pub struct LmFit {
    pub parameters: Vec<f64>,
    /// `p × p` covariance of the parameter estimates.
    pub covariance: DMatrix<f64>,
    pub sse: f64,
    pub iterations: usize,
}

/// Fit `model(x, p)` to `(x, y)` pairs starting from `p0`.
///
/// `model` is any plain function value; the solver never inspects what it
/// computes. Returns `FitDidNotConverge` when the iteration budget or the
/// damping ceiling is exhausted, and `SingularCovariance` when the
/// uncertainty of the estimates cannot be computed.
pub fn curve_fit<F>(
    model: F,
    x: &[f64],
    y: &[f64],
    p0: &[f64],
    opts: &LmOptions,
) -> Result<LmFit, AppError>
where
    F: Fn(f64, &[f64]) -> f64,
{
    let n = x.len();
    let p = p0.len();
    debug_assert_eq!(n, y.len());

    if n <= p {
        return Err(AppError::new(
            ErrorKind::SingularCovariance,
            format!("Need more observations than parameters (n={n}, p={p})."),
        ));
    }

    let mut params = p0.to_vec();
    let mut sse = sum_squared_residuals(&model, x, y, &params);
    if !sse.is_finite() {
        return Err(AppError::new(
            ErrorKind::FitDidNotConverge,
            "Initial guess produces non-finite residuals.",
        ));
    }

    let mut lambda = LAMBDA_INIT;
    let mut iterations = 0;
    let mut converged = false;

    while iterations < opts.max_iterations {
        iterations += 1;

        let jac = forward_difference_jacobian(&model, x, &params);
        let residuals = residual_vector(&model, x, y, &params);
        let jtj = jac.transpose() * &jac;
        let jtr = jac.transpose() * &residuals;

        // Escalate damping until a step improves the objective (or the
        // ceiling tells us no improving step exists here).
        let mut accepted = false;
        while lambda <= LAMBDA_MAX {
            let Some(step) = solve_damped(&jtj, &jtr, lambda) else {
                lambda *= LAMBDA_UP;
                continue;
            };

            let candidate: Vec<f64> = params
                .iter()
                .zip(step.iter())
                .map(|(pj, dj)| pj + dj)
                .collect();
            let candidate_sse = sum_squared_residuals(&model, x, y, &candidate);

            if candidate_sse.is_finite() && candidate_sse <= sse {
                let improvement = sse - candidate_sse;
                let step_small = step.norm() <= opts.xtol * (opts.xtol + norm(&params));

                params = candidate;
                sse = candidate_sse;
                lambda = (lambda * LAMBDA_DOWN).max(1e-12);
                accepted = true;

                if improvement <= opts.ftol * sse.max(opts.ftol) || step_small {
                    converged = true;
                }
                break;
            }

            lambda *= LAMBDA_UP;
        }

        if !accepted {
            return Err(AppError::new(
                ErrorKind::FitDidNotConverge,
                format!("No improving step after {iterations} iterations (damping exhausted)."),
            ));
        }
        if converged {
            break;
        }
    }

    if !converged {
        return Err(AppError::new(
            ErrorKind::FitDidNotConverge,
            format!("No stable minimum within {} iterations.", opts.max_iterations),
        ));
    }

    let covariance = estimate_covariance(&model, x, &params, sse, n)?;

    Ok(LmFit {
        parameters: params,
        covariance,
        sse,
        iterations,
    })
}

/// Solve `(JᵀJ + λ·diag(JᵀJ))·δ = Jᵀr` via Cholesky.
///
/// A zero diagonal entry (a parameter the model ignores) falls back to
/// absolute damping so the factorization stays positive definite; the step in
/// that direction is then zero and the covariance stage reports the
/// degeneracy. Returns `None` when the damped normal matrix still is not
/// positive definite (caller escalates λ and retries).
fn solve_damped(jtj: &DMatrix<f64>, jtr: &DVector<f64>, lambda: f64) -> Option<DVector<f64>> {
    let p = jtj.nrows();
    let mut damped = jtj.clone();
    for j in 0..p {
        let d = jtj[(j, j)];
        damped[(j, j)] += lambda * if d > 0.0 { d } else { 1.0 };
    }

    let chol = damped.cholesky()?;
    let step = chol.solve(jtr);
    if step.iter().all(|v| v.is_finite()) {
        Some(step)
    } else {
        None
    }
}

fn residual_vector<F>(model: &F, x: &[f64], y: &[f64], params: &[f64]) -> DVector<f64>
where
    F: Fn(f64, &[f64]) -> f64,
{
    DVector::from_iterator(
        x.len(),
        x.iter().zip(y.iter()).map(|(&xi, &yi)| yi - model(xi, params)),
    )
}

fn sum_squared_residuals<F>(model: &F, x: &[f64], y: &[f64], params: &[f64]) -> f64
where
    F: Fn(f64, &[f64]) -> f64,
{
    x.iter()
        .zip(y.iter())
        .map(|(&xi, &yi)| {
            let r = yi - model(xi, params);
            r * r
        })
        .sum()
}

/// Forward-difference Jacobian of the model, `J[(i, j)] = ∂f(x_i)/∂p_j`.
///
/// The step is relative to each parameter's magnitude so that parameters on
/// wildly different scales are perturbed proportionally.
fn forward_difference_jacobian<F>(model: &F, x: &[f64], params: &[f64]) -> DMatrix<f64>
where
    F: Fn(f64, &[f64]) -> f64,
{
    let n = x.len();
    let p = params.len();

    let base: Vec<f64> = x.iter().map(|&xi| model(xi, params)).collect();
    let mut jac = DMatrix::<f64>::zeros(n, p);
    let mut bumped = params.to_vec();

    for j in 0..p {
        let h = if params[j] != 0.0 {
            FD_STEP * params[j].abs()
        } else {
            FD_STEP
        };
        bumped[j] = params[j] + h;
        for i in 0..n {
            jac[(i, j)] = (model(x[i], &bumped) - base[i]) / h;
        }
        bumped[j] = params[j];
    }

    jac
}

/// `cov = SSE/(n−p) · (JᵀJ)⁻¹` at the converged parameters.
fn estimate_covariance<F>(
    model: &F,
    x: &[f64],
    params: &[f64],
    sse: f64,
    n: usize,
) -> Result<DMatrix<f64>, AppError>
where
    F: Fn(f64, &[f64]) -> f64,
{
    let p = params.len();
    let jac = forward_difference_jacobian(model, x, params);
    let jtj = jac.transpose() * &jac;

    let inverse = jtj.try_inverse().ok_or_else(|| {
        AppError::new(
            ErrorKind::SingularCovariance,
            "JᵀJ is singular at the converged parameters (degenerate Jacobian).",
        )
    })?;

    let scale = sse / (n - p) as f64;
    let covariance = inverse * scale;

    let diag_ok = (0..p).all(|j| {
        let v = covariance[(j, j)];
        v.is_finite() && v >= 0.0
    });
    if !covariance.iter().all(|v| v.is_finite()) || !diag_ok {
        return Err(AppError::new(
            ErrorKind::SingularCovariance,
            "Covariance estimate is non-finite (near-degenerate Jacobian).",
        ));
    }

    Ok(covariance)
}

fn norm(values: &[f64]) -> f64 {
    values.iter().map(|v| v * v).sum::<f64>().sqrt()
}
