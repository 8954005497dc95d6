//! Reporting: EDA tables and formatted terminal output.

pub mod eda;
pub mod format;

pub use eda::*;
pub use format::*;
