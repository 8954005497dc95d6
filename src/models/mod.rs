//! Linear mass model and its persisted artifact.

pub mod linear;

pub use linear::*;
