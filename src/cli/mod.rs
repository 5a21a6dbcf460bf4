//! Command-line parsing for the PFG diffusion fitter.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the modeling/math code.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::data::SampleComponent;
use crate::domain::ModelKind;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "pfg", version, about = "PFG-NMR Diffusion Curve Fitter")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fit the Stejskal–Tanner decay to a dataset directory and print the summary.
    Fit(FitArgs),
    /// Generate a synthetic dataset (procpar + integ_series.txt) from known components.
    Sample(SampleArgs),
}

/// Options for fitting.
#[derive(Debug, Parser, Clone)]
pub struct FitArgs {
    /// Directory containing procpar and the integration log.
    #[arg(short = 'd', long)]
    pub dir: PathBuf,

    /// Which decay model to fit (one or two components).
    #[arg(short = 'm', long, value_enum, default_value_t = ModelKind::OneComponent)]
    pub model: ModelKind,

    /// Parameter file name within the directory.
    #[arg(long, default_value = "procpar")]
    pub procpar: String,

    /// Integration log file name within the directory.
    #[arg(long, default_value = "integ_series.txt")]
    pub integrals: String,

    /// Comma-separated initial-guess override (length must match the model).
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    pub init: Option<Vec<f64>>,

    /// Maximum solver iterations.
    #[arg(long, default_value_t = 200)]
    pub max_iterations: usize,

    /// Relative SSE-improvement convergence threshold.
    #[arg(long, default_value_t = 1e-12)]
    pub ftol: f64,

    /// Relative step-size convergence threshold.
    #[arg(long, default_value_t = 1e-12)]
    pub xtol: f64,

    /// Export per-point results to CSV.
    #[arg(long)]
    pub export: Option<PathBuf>,

    /// Export the fit (model + parameters + observations) to JSON.
    #[arg(long = "export-fit")]
    pub export_fit: Option<PathBuf>,
}

/// Options for synthetic dataset generation.
#[derive(Debug, Parser, Clone)]
pub struct SampleArgs {
    /// Output directory for procpar + integ_series.txt (created if absent).
    #[arg(short = 'o', long)]
    pub out: PathBuf,

    /// Nucleus identifier (must be in the gyromagnetic table).
    #[arg(long, default_value = "H1")]
    pub nucleus: String,

    /// Gradient calibration factor written to procpar.
    #[arg(long, default_value_t = 10.0)]
    pub gcal: f64,

    /// Number of gradient levels (evenly spaced from 0).
    #[arg(short = 'n', long, default_value_t = 16)]
    pub levels: usize,

    /// Largest raw gradient level.
    #[arg(long, default_value_t = 4.0)]
    pub max_level: f64,

    /// Diffusion time Delta, seconds.
    #[arg(long, default_value_t = 0.1)]
    pub big_delta: f64,

    /// Gradient pulse duration delta, seconds.
    #[arg(long, default_value_t = 0.002)]
    pub little_delta: f64,

    /// Mixture component as WEIGHT:D (repeatable; default is 1.0:1e-10).
    #[arg(long = "component", value_parser = parse_component)]
    pub components: Vec<SampleComponent>,

    /// Relative Gaussian noise level (0 disables noise).
    #[arg(long, default_value_t = 0.0)]
    pub noise: f64,

    /// Random seed for noise generation.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Raw intensity scale of the strongest point.
    #[arg(long, default_value_t = 1000.0)]
    pub amplitude: f64,
}

/// Parse a `WEIGHT:D` component spec (e.g. `0.6:5e-10`).
fn parse_component(s: &str) -> Result<SampleComponent, String> {
    let (weight, d) = s
        .split_once(':')
        .ok_or_else(|| format!("expected WEIGHT:D, got '{s}'"))?;
    let weight: f64 = weight
        .trim()
        .parse()
        .map_err(|_| format!("invalid weight '{weight}'"))?;
    let d: f64 = d.trim().parse().map_err(|_| format!("invalid D '{d}'"))?;
    Ok(SampleComponent { weight, d })
}
