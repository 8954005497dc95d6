//! Model fitting.
//!
//! Responsibilities:
//!
//! - seeded hold-out and k-fold splits
//! - OLS fit and scoring (MSE, R²)
//! - training workflow with parallel cross-validation and VIF

pub mod evaluate;
pub mod regression;
pub mod split;

pub use evaluate::*;
pub use regression::*;
pub use split::*;
