//! Mathematical utilities: damped least-squares fitting.

pub mod lm;

pub use lm::*;
