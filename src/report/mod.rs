//! Reporting: measurement tables and fit summaries.

pub mod format;

pub use format::*;
