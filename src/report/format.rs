//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the math/fitting code stays clean and testable
//! - output changes are localized (important for future snapshot tests)

use crate::domain::AcquisitionParameters;
use crate::report::FitSummary;

/// Format the full run summary (acquisition context + fit diagnostics +
/// fitted coefficients).
pub fn format_run_summary(
    acquisition: &AcquisitionParameters,
    gamma: f64,
    summary: &FitSummary,
) -> String {
    let mut out = String::new();

    out.push_str("=== pfg - PFG-NMR Diffusion Fit ===\n");
    out.push_str(&format!(
        "Nucleus: {} (gamma = {:.6e} Hz/T)\n",
        summary.nucleus, gamma
    ));
    out.push_str(&format!(
        "Timing: Delta = {:.4} s | delta = {:.4} s | gcal = {}\n",
        acquisition.big_delta, acquisition.little_delta, acquisition.gradient_calibration
    ));
    out.push_str(&format!(
        "Points: n={} | model: {}\n",
        summary.quality.n,
        summary.model.display_name()
    ));
    out.push_str(&format!(
        "Solver: SSE={:.3e} RMSE={:.3e} iterations={}\n",
        summary.quality.sse, summary.quality.rmse, summary.quality.iterations
    ));

    out.push_str("\nFit complete.\n");
    for (i, c) in summary.components.iter().enumerate() {
        let label = if summary.components.len() == 1 {
            String::new()
        } else {
            format!("{}", i + 1)
        };
        out.push_str(&format!(
            "- I{label} = {:.3}, D{label} = {:.2e} m^2/s, sigma{label} = {:.1e} m^2/s\n",
            c.weight, c.d, c.sigma
        ));
    }
    out.push('\n');

    out.push_str(&format_observation_table(summary));
    out
}

/// Format the per-point observation table.
pub fn format_observation_table(summary: &FitSummary) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "{:>12} {:>12} {:>12} {:>12}\n",
        "gradient", "observed", "fitted", "residual"
    ));
    out.push_str(&format!(
        "{:->12} {:->12} {:->12} {:->12}\n",
        "", "", "", ""
    ));

    for p in &summary.points {
        out.push_str(&format!(
            "{:>12.3} {:>12.5} {:>12.5} {:>12.2e}\n",
            p.gradient, p.observed, p.fitted, p.residual
        ));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DecayDataset, FitQuality, FitResult, ModelKind};
    use crate::models::StejskalTanner;
    use crate::report::summarize;

    #[test]
    fn summary_output_names_nucleus_and_coefficients() {
        let st = StejskalTanner {
            gamma: 42_577_478.518_18,
            big_delta: 0.1,
            little_delta: 0.002,
        };
        let acquisition = AcquisitionParameters {
            nucleus: "H1".to_string(),
            gradient_calibration: 10.0,
            gradient_levels: vec![0.0, 1.0, 2.0],
            big_delta: 0.1,
            little_delta: 0.002,
        };
        let ds = DecayDataset::new("H1", vec![0.0, 10.0, 20.0], vec![10.0, 8.0, 6.0]).unwrap();
        let fit = FitResult {
            model: ModelKind::OneComponent,
            parameters: vec![1.0, 2e-10],
            covariance: vec![vec![0.0, 0.0], vec![0.0, 0.0]],
            diffusion_coefficients: vec![2e-10],
            standard_deviations: vec![3e-12],
            quality: FitQuality {
                sse: 1e-4,
                rmse: 5.8e-3,
                n: 3,
                iterations: 12,
            },
        };
        let summary = summarize(&fit, &ds, &st);

        let text = format_run_summary(&acquisition, st.gamma, &summary);
        assert!(text.contains("H1"));
        assert!(text.contains("1-component"));
        assert!(text.contains("2e-10") || text.contains("2.00e-10"));
        assert!(text.contains("residual"));
    }
}
