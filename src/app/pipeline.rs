//! Shared fit pipeline.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! read procpar -> gyromagnetic lookup -> load/normalize integrals ->
//! dataset assembly -> fit -> summarize
//!
//! The CLI front-end then only handles presentation (printing and exports).
//! The sequencing here is the pipeline's legal order: normalization happens
//! when the dataset is assembled, before any fit, and the model variant is
//! fixed in the config before the regression call.

use crate::domain::{AcquisitionParameters, DecayDataset, FitConfig, FitResult};
use crate::error::AppError;
use crate::fit::{FitOptions, fit_model};
use crate::io::{acquisition_parameters, read_integration_log, read_procpar};
use crate::math::LmOptions;
use crate::models::{StejskalTanner, gyromagnetic_ratio};
use crate::report::FitSummary;

/// All computed outputs of a single `pfg fit` run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub acquisition: AcquisitionParameters,
    /// Gyromagnetic ratio of the dataset's nucleus, Hz/T.
    pub gamma: f64,
    pub dataset: DecayDataset,
    pub fit: FitResult,
    pub summary: FitSummary,
}

/// Execute the full fitting pipeline and return the computed outputs.
pub fn run_fit(config: &FitConfig) -> Result<RunOutput, AppError> {
    let store = read_procpar(&config.dir.join(&config.procpar_name))?;
    let acquisition = acquisition_parameters(&store)?;
    let gamma = gyromagnetic_ratio(&acquisition.nucleus)?;

    let intensity = read_integration_log(&config.dir.join(&config.integrals_name))?;
    let dataset = DecayDataset::new(
        acquisition.nucleus.clone(),
        acquisition.gradient_values(),
        intensity,
    )?;

    let constants = StejskalTanner {
        gamma,
        big_delta: acquisition.big_delta,
        little_delta: acquisition.little_delta,
    };

    let opts = FitOptions {
        initial_guess: config.initial_guess.clone(),
        lm: LmOptions {
            max_iterations: config.max_iterations,
            ftol: config.ftol,
            xtol: config.xtol,
        },
    };
    let fit = fit_model(config.model, &dataset, &constants, &opts)?;
    let summary = crate::report::summarize(&fit, &dataset, &constants);

    Ok(RunOutput {
        acquisition,
        gamma,
        dataset,
        fit,
        summary,
    })
}
