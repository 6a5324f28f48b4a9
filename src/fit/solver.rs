//! Nonlinear least-squares solver.
//!
//! The fit engine talks to the solver only through [`LeastSquaresSolver`]:
//! a curve problem goes in, best-fit parameters and their covariance come out.
//! The bundled implementation is a bounded Levenberg–Marquardt:
//!
//! - residuals `r_i = (f(x_i, p) - y_i) / σ_i`
//! - forward-difference Jacobian
//! - each step solves the damped system `[J; √λ D] δ = [-r; 0]` by SVD
//! - trial points are clamped into the bounds
//! - covariance `(JᵀJ)⁺ · SSR / (n - p)` at the solution

use log::{debug, warn};
use nalgebra::{DMatrix, DVector};

use crate::error::{Error, Result};
use crate::math::{normal_covariance, solve_least_squares};
use crate::models::FitFunction;

/// A fully specified curve-fitting problem.
///
/// `initial_guess`, `lower` and `upper` have one entry per function parameter;
/// `sigma`, when present, one entry per data point.
#[derive(Debug, Clone, Copy)]
pub struct CurveProblem<'a> {
    pub function: &'a FitFunction,
    pub x: &'a [f64],
    pub y: &'a [f64],
    pub initial_guess: &'a [f64],
    pub sigma: Option<&'a [f64]>,
    pub lower: &'a [f64],
    pub upper: &'a [f64],
}

/// Solver output.
#[derive(Debug, Clone)]
pub struct Solution {
    pub params: Vec<f64>,
    pub covariance: DMatrix<f64>,
    pub iterations: usize,
}

pub trait LeastSquaresSolver {
    fn solve(&self, problem: &CurveProblem<'_>) -> Result<Solution>;
}

/// Bounded Levenberg–Marquardt.
#[derive(Debug, Clone)]
pub struct LevenbergMarquardt {
    /// Maximum accepted-or-rejected steps per parameter (scaled by `p + 1`).
    pub max_steps_per_param: usize,
    /// Relative cost reduction below which an accepted step ends the search.
    pub ftol: f64,
    /// Relative step size below which the search ends.
    pub xtol: f64,
    /// Infinity norm of the gradient below which the search ends.
    pub gtol: f64,
}

impl Default for LevenbergMarquardt {
    fn default() -> Self {
        Self {
            max_steps_per_param: 200,
            ftol: 1e-12,
            xtol: 1e-12,
            gtol: 1e-14,
        }
    }
}

const LAMBDA_INIT: f64 = 1e-3;
const LAMBDA_MAX: f64 = 1e16;

impl LeastSquaresSolver for LevenbergMarquardt {
    fn solve(&self, problem: &CurveProblem<'_>) -> Result<Solution> {
        let n = problem.x.len();
        let p = problem.initial_guess.len();
        if n < p {
            return Err(Error::solver(format!(
                "{n} data points cannot determine {p} parameters"
            )));
        }
        for j in 0..p {
            if problem.lower[j] >= problem.upper[j] {
                return Err(Error::solver(format!(
                    "lower bound {} is not below upper bound {} for parameter `{}`",
                    problem.lower[j], problem.upper[j], problem.function.params[j]
                )));
            }
            let p0 = problem.initial_guess[j];
            if !(problem.lower[j] <= p0 && p0 <= problem.upper[j]) {
                return Err(Error::solver(format!(
                    "initial guess {p0} for `{}` is outside its bounds",
                    problem.function.params[j]
                )));
            }
        }

        let mut params = DVector::from_column_slice(problem.initial_guess);
        let mut r = residuals(problem, &params);
        if r.iter().any(|v| !v.is_finite()) {
            return Err(Error::solver("residuals are not finite at the initial guess"));
        }
        let mut cost = 0.5 * r.norm_squared();

        let max_steps = self.max_steps_per_param * (p + 1);
        let mut lambda = LAMBDA_INIT;
        let mut steps = 0usize;
        let mut converged = false;

        'outer: while steps < max_steps {
            let jac = jacobian(problem, &params, &r);
            let grad = jac.transpose() * &r;
            if grad.amax() <= self.gtol {
                converged = true;
                break;
            }

            let scale: Vec<f64> = (0..p).map(|j| jac.column(j).norm().max(1e-12)).collect();

            loop {
                steps += 1;
                let delta = damped_step(&jac, &r, &scale, lambda)
                    .ok_or_else(|| Error::solver("damped system could not be solved"))?;
                let trial = clamp(&(&params + &delta), problem.lower, problem.upper);
                let step_norm = (&trial - &params).norm();
                let r_trial = residuals(problem, &trial);
                let cost_trial = 0.5 * r_trial.norm_squared();

                if cost_trial.is_finite() && cost_trial < cost {
                    let reduction = cost - cost_trial;
                    let small_step = step_norm <= self.xtol * (params.norm() + self.xtol);
                    params = trial;
                    r = r_trial;
                    cost = cost_trial;
                    lambda = (lambda / 10.0).max(1e-15);
                    debug!("lm step {steps}: cost={cost:.6e} lambda={lambda:.1e}");
                    if reduction <= self.ftol * (cost + reduction) || small_step {
                        converged = true;
                        break 'outer;
                    }
                    break;
                }

                if step_norm <= self.xtol * (params.norm() + self.xtol) {
                    converged = true;
                    break 'outer;
                }
                lambda *= 10.0;
                if lambda > LAMBDA_MAX {
                    // No descent direction left at any damping: a stationary point.
                    converged = true;
                    break 'outer;
                }
                if steps >= max_steps {
                    break 'outer;
                }
            }
        }

        if !converged {
            return Err(Error::solver(format!(
                "optimal parameters not found after {steps} steps"
            )));
        }

        let jac = jacobian(problem, &params, &r);
        let mut covariance = normal_covariance(&jac)
            .ok_or_else(|| Error::solver("covariance could not be computed"))?;
        if n > p {
            covariance *= 2.0 * cost / (n - p) as f64;
        } else {
            warn!("covariance of `{}` cannot be estimated with n == p", problem.function.name);
            covariance.fill(f64::INFINITY);
        }

        Ok(Solution {
            params: params.iter().copied().collect(),
            covariance,
            iterations: steps,
        })
    }
}

fn residuals(problem: &CurveProblem<'_>, params: &DVector<f64>) -> DVector<f64> {
    let p = params.as_slice();
    DVector::from_iterator(
        problem.x.len(),
        problem.x.iter().zip(problem.y).enumerate().map(|(i, (&x, &y))| {
            let s = problem.sigma.map_or(1.0, |s| s[i]);
            (problem.function.eval(x, p) - y) / s
        }),
    )
}

fn jacobian(problem: &CurveProblem<'_>, params: &DVector<f64>, r0: &DVector<f64>) -> DMatrix<f64> {
    let n = r0.len();
    let p = params.len();
    let mut jac = DMatrix::<f64>::zeros(n, p);
    let rel = f64::EPSILON.sqrt();
    for j in 0..p {
        let mut h = rel * params[j].abs().max(1.0);
        // Step inward when the forward point would leave the box.
        if params[j] + h > problem.upper[j] {
            h = -h;
        }
        let mut shifted = params.clone();
        shifted[j] += h;
        let r1 = residuals(problem, &shifted);
        jac.set_column(j, &((r1 - r0) / h));
    }
    jac
}

fn damped_step(jac: &DMatrix<f64>, r: &DVector<f64>, scale: &[f64], lambda: f64) -> Option<DVector<f64>> {
    let n = jac.nrows();
    let p = jac.ncols();
    let mut a = DMatrix::<f64>::zeros(n + p, p);
    a.rows_mut(0, n).copy_from(jac);
    let mut b = DVector::<f64>::zeros(n + p);
    b.rows_mut(0, n).copy_from(&(-r));
    let sqrt_lambda = lambda.sqrt();
    for j in 0..p {
        a[(n + j, j)] = sqrt_lambda * scale[j];
    }
    solve_least_squares(&a, &b)
}

fn clamp(params: &DVector<f64>, lower: &[f64], upper: &[f64]) -> DVector<f64> {
    DVector::from_iterator(
        params.len(),
        params.iter().enumerate().map(|(j, &v)| v.clamp(lower[j], upper[j])),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FitRegistry;
    use approx::assert_relative_eq;

    fn problem<'a>(name: &str, x: &'a [f64], y: &'a [f64], guess: &'a [f64], lo: &'a [f64], hi: &'a [f64]) -> CurveProblem<'a> {
        CurveProblem {
            function: FitRegistry::builtin().resolve(name).unwrap(),
            x,
            y,
            initial_guess: guess,
            sigma: None,
            lower: lo,
            upper: hi,
        }
    }

    const FREE: [f64; 2] = [f64::NEG_INFINITY, f64::NEG_INFINITY];
    const FREE_HI: [f64; 2] = [f64::INFINITY, f64::INFINITY];

    #[test]
    fn recovers_exponential() {
        let x: Vec<f64> = (0..12).map(|i| i as f64 * 0.25).collect();
        let y: Vec<f64> = x.iter().map(|&t| 2.5 * (-0.8 * t).exp()).collect();
        let sol = LevenbergMarquardt::default()
            .solve(&problem("exponential", &x, &y, &[1.0, -0.5], &FREE, &FREE_HI))
            .unwrap();
        assert_relative_eq!(sol.params[0], 2.5, epsilon = 1e-6);
        assert_relative_eq!(sol.params[1], -0.8, epsilon = 1e-6);
    }

    #[test]
    fn respects_bounds() {
        let x = [0.0, 1.0, 2.0, 3.0];
        let y = [0.0, 2.0, 4.0, 6.0];
        let sol = LevenbergMarquardt::default()
            .solve(&problem("linear", &x, &y, &[1.0, 0.5], &[0.0, 0.5], &[1.5, 10.0]))
            .unwrap();
        assert!(sol.params[0] <= 1.5);
        assert!(sol.params[1] >= 0.5);
    }

    #[test]
    fn rejects_infeasible_guess() {
        let x = [0.0, 1.0, 2.0];
        let y = [0.0, 1.0, 2.0];
        let err = LevenbergMarquardt::default()
            .solve(&problem("linear", &x, &y, &[5.0, 0.0], &[0.0, -1.0], &[1.0, 1.0]))
            .unwrap_err();
        assert!(matches!(err, Error::SolverFailure(_)));
    }

    #[test]
    fn rejects_underdetermined_problem() {
        let x = [1.0];
        let y = [1.0];
        let err = LevenbergMarquardt::default()
            .solve(&problem("linear", &x, &y, &[1.0, 1.0], &FREE, &FREE_HI))
            .unwrap_err();
        assert!(matches!(err, Error::SolverFailure(_)));
    }

    #[test]
    fn exactly_determined_problem_has_infinite_covariance() {
        let x = [0.0, 1.0];
        let y = [1.0, 3.0];
        let sol = LevenbergMarquardt::default()
            .solve(&problem("linear", &x, &y, &[1.0, 1.0], &FREE, &FREE_HI))
            .unwrap();
        assert_relative_eq!(sol.params[0], 2.0, epsilon = 1e-8);
        assert!(sol.covariance[(0, 0)].is_infinite());
    }
}
