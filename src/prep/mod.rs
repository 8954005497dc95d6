//! Catalog cleaning: per-source processing, cross-catalog join, outlier removal.
//!
//! Everything here is pure (no I/O); the pipeline in `app::pipeline` wires the
//! stages to ingest, TAP fetches and exports.

pub mod gaia;
pub mod join;
pub mod nea;
pub mod outliers;

pub use join::{EVOLSTAGE_WINDOW, JoinStats};
pub use nea::NeaStats;
pub use outliers::DEFAULT_Z_THRESHOLD;

/// Row counts through the whole preparation pipeline.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PrepStats {
    pub nea: NeaStats,
    pub nea_row_errors: usize,
    pub crossmatches: usize,
    pub gaia_rows: usize,
    pub join: JoinStats,
    /// `None` when outlier removal was disabled.
    pub outliers_removed: Option<usize>,
    pub final_rows: usize,
}
