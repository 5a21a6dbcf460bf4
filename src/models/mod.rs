//! Physical model implementations.
//!
//! Models are implemented as small, pure functions so that fitting code can
//! stay generic.

pub mod decay;
pub mod gyro;

pub use decay::*;
pub use gyro::*;
