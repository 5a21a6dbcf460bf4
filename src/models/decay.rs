//! Stejskal–Tanner decay model evaluation.
//!
//! The fitter relies on two primitive operations:
//! - predict `I(g)` given a model kind and a parameter vector
//! - expose the model as a plain `(g, params) -> I` function value
//!
//! Both components share the physical envelope term
//!
//! ```text
//! E(g) = (γ · 2π · δ · g / 100)² · (Δ − δ/3)
//! ```
//!
//! where γ is the gyromagnetic ratio (Hz/T), δ the gradient pulse duration
//! (s), Δ the diffusion time (s), and `g` the gradient strength (gauss/cm).

use crate::domain::ModelKind;

/// Gradient unit conversion: gauss/cm into the tesla-consistent scale used by
/// the envelope. This is a fixed instrument calibration constant; do not
/// re-derive it.
const GRADIENT_UNIT_SCALE: f64 = 100.0;

/// The physical constants of one acquisition, fixed for every model
/// evaluation within a fit.
#[derive(Debug, Clone, Copy)]
pub struct StejskalTanner {
    /// Gyromagnetic ratio, Hz/Tesla.
    pub gamma: f64,
    /// Diffusion time Δ, seconds.
    pub big_delta: f64,
    /// Gradient pulse duration δ, seconds.
    pub little_delta: f64,
}

impl StejskalTanner {
    /// The shared envelope `E(g)`.
    ///
    /// `D · E(g)` is dimensionless when `D` is in m²/s.
    pub fn envelope(&self, g: f64) -> f64 {
        let q = self.gamma * std::f64::consts::TAU * self.little_delta * g / GRADIENT_UNIT_SCALE;
        q * q * (self.big_delta - self.little_delta / 3.0)
    }

    /// `I(g) = I0 · exp(-D · E(g))`.
    pub fn one_component(&self, g: f64, i0: f64, d: f64) -> f64 {
        i0 * (-d * self.envelope(g)).exp()
    }

    /// `I(g) = I1 · exp(-D1 · E(g)) + I2 · exp(-D2 · E(g))`.
    pub fn two_component(&self, g: f64, i1: f64, d1: f64, i2: f64, d2: f64) -> f64 {
        let e = self.envelope(g);
        i1 * (-d1 * e).exp() + i2 * (-d2 * e).exp()
    }

    /// Predict `I(g)` for the given model kind.
    ///
    /// # Panics
    /// Panics if `params` does not have length `kind.param_count()`. Callers
    /// should size the parameter vector correctly.
    pub fn predict(&self, kind: ModelKind, g: f64, params: &[f64]) -> f64 {
        match kind {
            ModelKind::OneComponent => self.one_component(g, params[0], params[1]),
            ModelKind::TwoComponent => {
                self.two_component(g, params[0], params[1], params[2], params[3])
            }
        }
    }

    /// The model as a first-class function value.
    ///
    /// The regression engine is parameterized over this closure so it never
    /// branches on the model identity itself.
    pub fn model_fn(&self, kind: ModelKind) -> impl Fn(f64, &[f64]) -> f64 + '_ {
        move |g, params| self.predict(kind, g, params)
    }
}
