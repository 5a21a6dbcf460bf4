//! Curve fitting.
//!
//! Responsibilities:
//!
//! - run the damped least-squares solver for the selected model kind
//! - derive diffusion coefficients and their uncertainties from the raw fit

pub mod fitter;

pub use fitter::*;
