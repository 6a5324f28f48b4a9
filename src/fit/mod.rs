//! Curve fitting.
//!
//! Responsibilities:
//!
//! - expand a fit request (guess, sigma, bounds) into a solver problem
//! - run bounded Levenberg–Marquardt
//! - report parameters with standard errors

pub mod fitter;
pub mod solver;

pub use fitter::*;
pub use solver::*;
