//! `stellar-mass` library crate.
//!
//! The binary (`stellar`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes
//! - the batch pipeline and the HTTP server share the same model code
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod logging;
pub mod math;
pub mod models;
pub mod plot;
pub mod prep;
pub mod report;
pub mod server;
