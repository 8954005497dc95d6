//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - catalog records at each stage (`NeaRecord`, `NeaStar`, `GaiaStar`, `JoinedStar`, `Star`)
//! - the modeled features and their units (`Feature`, `Features`)
//! - run configuration (`PrepareConfig`, `TrainConfig`, `ServeConfig`)

pub mod types;

pub use types::*;
