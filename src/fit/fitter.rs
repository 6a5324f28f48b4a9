//! Fit a named analytic function to `(x, y)` samples.
//!
//! The engine validates and expands the request (initial guess, bounds,
//! per-point sigma), hands a [`CurveProblem`] to the solver, and turns the
//! returned covariance diagonal into standard errors.

use log::debug;

use crate::domain::FitResult;
use crate::error::{Error, Result};
use crate::fit::solver::{CurveProblem, LeastSquaresSolver, LevenbergMarquardt};
use crate::models::{FitFunction, FitRegistry};

/// A lower or upper bound: one value for all parameters, or one per parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum Bound {
    All(f64),
    Each(Vec<f64>),
}

impl Bound {
    fn expand(&self, p: usize, which: &str) -> Result<Vec<f64>> {
        match self {
            Bound::All(v) => Ok(vec![*v; p]),
            Bound::Each(v) if v.len() == p => Ok(v.clone()),
            Bound::Each(v) => Err(Error::solver(format!(
                "{which} bounds have {} entries for {p} parameters",
                v.len()
            ))),
        }
    }
}

/// Parameter box `(lower, upper)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Bounds {
    pub lower: Bound,
    pub upper: Bound,
}

impl Default for Bounds {
    /// `(-∞, +∞)`
    fn default() -> Self {
        Self {
            lower: Bound::All(f64::NEG_INFINITY),
            upper: Bound::All(f64::INFINITY),
        }
    }
}

/// Optional knobs for a fit request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FitOptions {
    /// Starting point; defaults to ones, moved inside any finite bounds.
    pub initial_guess: Option<Vec<f64>>,
    /// Per-point standard deviation of `y`, used to weight residuals.
    pub sigma: Option<Vec<f64>>,
    pub bounds: Bounds,
}

/// Default starting point inside the box `[lower, upper]`.
///
/// One for a free parameter, one step in from a single finite bound, the
/// midpoint when both bounds are finite.
fn feasible_start(lower: &[f64], upper: &[f64]) -> Vec<f64> {
    lower
        .iter()
        .zip(upper)
        .map(|(&lb, &ub)| match (lb.is_finite(), ub.is_finite()) {
            (false, false) => 1.0,
            (true, false) => lb + 1.0,
            (false, true) => ub - 1.0,
            (true, true) => 0.5 * (lb + ub),
        })
        .collect()
}

/// Runs fits through a [`LeastSquaresSolver`].
#[derive(Debug, Clone, Default)]
pub struct FitEngine<S = LevenbergMarquardt> {
    solver: S,
}

impl<S: LeastSquaresSolver> FitEngine<S> {
    pub fn with_solver(solver: S) -> Self {
        Self { solver }
    }

    /// Best-fit parameters of `function` and their standard errors.
    pub fn fit(&self, function: &FitFunction, x: &[f64], y: &[f64], opts: &FitOptions) -> Result<FitResult> {
        if x.len() != y.len() {
            return Err(Error::mismatch(format!(
                "cannot fit {} y values against {} x values",
                y.len(),
                x.len()
            )));
        }
        let p = function.param_count();
        let lower = opts.bounds.lower.expand(p, "lower")?;
        let upper = opts.bounds.upper.expand(p, "upper")?;
        let guess = match &opts.initial_guess {
            Some(g) if g.len() == p => g.clone(),
            Some(g) => {
                return Err(Error::solver(format!(
                    "initial guess has {} values but `{}` takes {p} parameters",
                    g.len(),
                    function.name
                )));
            }
            None => feasible_start(&lower, &upper),
        };
        if let Some(sigma) = &opts.sigma {
            if sigma.len() != y.len() {
                return Err(Error::solver(format!(
                    "sigma has {} values for {} data points",
                    sigma.len(),
                    y.len()
                )));
            }
            if sigma.iter().any(|&s| !(s.is_finite() && s > 0.0)) {
                return Err(Error::solver("sigma values must be finite and positive"));
            }
        }

        let problem = CurveProblem {
            function,
            x,
            y,
            initial_guess: &guess,
            sigma: opts.sigma.as_deref(),
            lower: &lower,
            upper: &upper,
        };
        let solution = self.solver.solve(&problem)?;
        debug!(
            "fit `{}` converged after {} steps: {:?}",
            function.name, solution.iterations, solution.params
        );

        let errors = solution.covariance.diagonal().iter().map(|v| v.sqrt()).collect();
        Ok(FitResult {
            function: function.name.to_string(),
            params: solution.params,
            errors,
        })
    }

    /// Resolve `name` in the built-in registry and fit it.
    pub fn fit_named(&self, name: &str, x: &[f64], y: &[f64], opts: &FitOptions) -> Result<FitResult> {
        let function = FitRegistry::builtin().resolve(name)?;
        self.fit(function, x, y, opts)
    }
}

/// Fit with the default engine.
pub fn fit(function: &FitFunction, x: &[f64], y: &[f64], opts: &FitOptions) -> Result<FitResult> {
    FitEngine::<LevenbergMarquardt>::default().fit(function, x, y, opts)
}

/// Straight-line fit `a·x + b`.
pub fn linear_fit(x: &[f64], y: &[f64], opts: &FitOptions) -> Result<FitResult> {
    FitEngine::<LevenbergMarquardt>::default().fit_named("linear", x, y, opts)
}

/// Exponential fit `a·exp(b·x)`.
pub fn exponential_fit(x: &[f64], y: &[f64], opts: &FitOptions) -> Result<FitResult> {
    FitEngine::<LevenbergMarquardt>::default().fit_named("exponential", x, y, opts)
}
