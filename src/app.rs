//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - runs the fit pipeline
//! - prints reports
//! - writes optional exports
//! - generates synthetic datasets

use clap::Parser;

use crate::cli::{Command, FitArgs, SampleArgs};
use crate::data::{SampleComponent, SampleConfig};
use crate::domain::FitConfig;
use crate::error::AppError;

pub mod pipeline;

/// Entry point for the `pfg` binary.
pub fn run() -> Result<(), AppError> {
    let cli = crate::cli::Cli::parse();

    match cli.command {
        Command::Fit(args) => handle_fit(args),
        Command::Sample(args) => handle_sample(args),
    }
}

fn handle_fit(args: FitArgs) -> Result<(), AppError> {
    let config = fit_config_from_args(&args);
    let run = pipeline::run_fit(&config)?;

    println!(
        "{}",
        crate::report::format_run_summary(&run.acquisition, run.gamma, &run.summary)
    );

    if let Some(path) = &config.export_results {
        crate::io::write_results_csv(path, &run.summary)?;
    }
    if let Some(path) = &config.export_fit {
        crate::io::write_fit_json(path, &run.fit, &run.dataset)?;
    }

    Ok(())
}

fn handle_sample(args: SampleArgs) -> Result<(), AppError> {
    let components = if args.components.is_empty() {
        vec![SampleComponent { weight: 1.0, d: 1e-10 }]
    } else {
        args.components.clone()
    };

    let config = SampleConfig {
        nucleus: args.nucleus.clone(),
        gradient_calibration: args.gcal,
        levels: args.levels,
        max_level: args.max_level,
        big_delta: args.big_delta,
        little_delta: args.little_delta,
        components,
        noise: args.noise,
        seed: args.seed,
        amplitude: args.amplitude,
    };

    let files = crate::data::generate_sample(&config)?;
    crate::data::write_sample(&args.out, &files)?;

    println!(
        "Wrote synthetic dataset ({} levels, {} component(s), noise={}) to {}",
        config.levels,
        config.components.len(),
        config.noise,
        args.out.display()
    );

    Ok(())
}

pub fn fit_config_from_args(args: &FitArgs) -> FitConfig {
    FitConfig {
        dir: args.dir.clone(),
        procpar_name: args.procpar.clone(),
        integrals_name: args.integrals.clone(),
        model: args.model,
        initial_guess: args.init.clone(),
        max_iterations: args.max_iterations,
        ftol: args.ftol,
        xtol: args.xtol,
        export_results: args.export.clone(),
        export_fit: args.export_fit.clone(),
    }
}
