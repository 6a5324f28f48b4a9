//! Analytic functions available for fitting.
//!
//! Each function is a pure `(x, params) -> y` evaluation. The fitter only
//! needs that primitive plus the declared parameter names (which fix the
//! parameter count and the default initial guess).

use std::f64::consts::FRAC_PI_2;

/// Evaluation signature shared by every catalog entry.
pub type ModelFn = fn(f64, &[f64]) -> f64;

/// A named analytic function.
#[derive(Debug, Clone, Copy)]
pub struct FitFunction {
    pub name: &'static str,
    /// Parameter names in evaluation order.
    pub params: &'static [&'static str],
    /// Human-readable formula.
    pub formula: &'static str,
    eval: ModelFn,
}

impl FitFunction {
    pub const fn new(
        name: &'static str,
        params: &'static [&'static str],
        formula: &'static str,
        eval: ModelFn,
    ) -> Self {
        Self {
            name,
            params,
            formula,
            eval,
        }
    }

    pub fn param_count(&self) -> usize {
        self.params.len()
    }

    /// Evaluate at a single point.
    ///
    /// # Panics
    /// Panics if `params` is shorter than `param_count()`. The fitter always
    /// passes a correctly sized slice.
    pub fn eval(&self, x: f64, params: &[f64]) -> f64 {
        (self.eval)(x, params)
    }

    /// Evaluate over a domain.
    pub fn eval_all(&self, xs: &[f64], params: &[f64]) -> Vec<f64> {
        xs.iter().map(|&x| self.eval(x, params)).collect()
    }
}

/// `a·x + b`
pub fn linear(x: f64, p: &[f64]) -> f64 {
    p[0] * x + p[1]
}

/// `a·(x² + b) + c`
pub fn quadratic(x: f64, p: &[f64]) -> f64 {
    p[0] * (x * x + p[1]) + p[2]
}

/// `a·exp(b·x)`
pub fn exponential(x: f64, p: &[f64]) -> f64 {
    p[0] * (p[1] * x).exp()
}

/// `a·sin(w·t + phi) + b`, angles in radians.
pub fn sinus(t: f64, p: &[f64]) -> f64 {
    p[0] * (p[1] * t + p[2]).sin() + p[3]
}

/// `a·cos(w·t + phi) + b`, expressed as a phase-shifted `sinus`.
pub fn cosinus(t: f64, p: &[f64]) -> f64 {
    sinus(t, &[p[0], p[1], p[2] + FRAC_PI_2, p[3]])
}

/// Like [`sinus`] but `w` and `phi` are given in degrees.
pub fn sinus_deg(t: f64, p: &[f64]) -> f64 {
    sinus(t, &[p[0], p[1].to_radians(), p[2].to_radians(), p[3]])
}

/// The full catalog, in registry order.
pub const CATALOG: &[FitFunction] = &[
    FitFunction::new("linear", &["a", "b"], "a*x + b", linear),
    FitFunction::new("quadratic", &["a", "b", "c"], "a*(x^2 + b) + c", quadratic),
    FitFunction::new("exponential", &["a", "b"], "a*exp(b*x)", exponential),
    FitFunction::new("sinus", &["a", "w", "phi", "b"], "a*sin(w*t + phi) + b", sinus),
    FitFunction::new("cosinus", &["a", "w", "phi", "b"], "a*cos(w*t + phi) + b", cosinus),
    FitFunction::new(
        "sinus_deg",
        &["a", "w", "phi", "b"],
        "a*sin(w*t + phi) + b (degrees)",
        sinus_deg,
    ),
];
