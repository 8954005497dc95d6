//! External and generated data sources.

pub mod synthetic;
pub mod tap;

pub use synthetic::{generate_catalog, SyntheticConfig};
pub use tap::{TapClient, TapConfig};
