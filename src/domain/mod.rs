//! Experimental data model.
//!
//! This module defines:
//!
//! - value types shared across the crate (`Kind`, `Slice`, `Selector`, `FitResult`, ...)
//! - the `Variable` series and its `make_variable` factory
//! - `DataSet`, which keeps parameters and measurements index-aligned
//! - physical quantity presets for column specs

pub mod dataset;
pub mod quantities;
pub mod types;
pub mod variable;

pub use dataset::*;
pub use quantities::*;
pub use types::*;
pub use variable::*;
