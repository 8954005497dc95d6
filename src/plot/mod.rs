//! Plotting: terminal ASCII diagram and SVG charts.

pub mod ascii;
pub mod charts;

pub use ascii::{render_mass_luminosity, Diagram};
pub use charts::{histogram_bins, write_eda_charts, write_source_comparison};
