//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - the model selector (`ModelKind`) with its fixed parameter conventions
//! - acquisition parameters and normalized observation sets
//! - fit outputs (`FitResult`, `FitQuality`, `FitFile`)

pub mod types;

pub use types::*;
