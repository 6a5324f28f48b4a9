//! Mathematical utilities: linear least squares and numerical derivatives.

pub mod gradient;
pub mod ols;

pub use gradient::*;
pub use ols::*;
