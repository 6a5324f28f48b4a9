//! Analytic fit functions and the registry that resolves them by name.

pub mod model;
pub mod registry;

pub use model::*;
pub use registry::*;
