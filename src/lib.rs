//! `lab-analysis` library crate.
//!
//! The binary (`lab`) is a thin wrapper around this library so that:
//!
//! - the data model, fitting and plotting are testable without spawning processes
//! - analysis scripts can use the same `DataSet` / `PlotSession` API directly

pub mod app;
pub mod cli;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod math;
pub mod models;
pub mod plot;
pub mod report;
