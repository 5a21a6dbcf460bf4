//! Input/output helpers.
//!
//! - procpar parameter reading (`procpar`)
//! - integration log reading (`integrals`)
//! - result exports (CSV/JSON) (`export`)

pub mod export;
pub mod integrals;
pub mod procpar;

pub use export::*;
pub use integrals::*;
pub use procpar::*;
