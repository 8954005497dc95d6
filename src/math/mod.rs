//! Mathematical utilities: unit conversions, least squares, statistics, PCA.

pub mod ols;
pub mod pca;
pub mod stats;
pub mod units;

pub use ols::*;
pub use pca::*;
pub use stats::*;
pub use units::*;
