//! Numerical derivative of sampled data.
//!
//! Interior points use the second-order central difference for non-uniform
//! spacing:
//!
//! `f'(x_i) ≈ (h_s² f_{i+1} + (h_d² - h_s²) f_i - h_d² f_{i-1}) / (h_s h_d (h_s + h_d))`
//!
//! with `h_s = x_i - x_{i-1}` and `h_d = x_{i+1} - x_i`. The two end points use
//! first-order one-sided differences.

use crate::error::{Error, Result};

/// Derivative of `y` with respect to `x`, one value per sample.
pub fn gradient(y: &[f64], x: &[f64]) -> Result<Vec<f64>> {
    if y.len() != x.len() {
        return Err(Error::mismatch(format!(
            "cannot differentiate {} values against {} coordinates",
            y.len(),
            x.len()
        )));
    }
    let n = y.len();
    if n < 2 {
        return Err(Error::invalid(
            "at least two samples are needed to estimate a derivative",
        ));
    }

    let mut out = vec![0.0; n];
    out[0] = (y[1] - y[0]) / (x[1] - x[0]);
    out[n - 1] = (y[n - 1] - y[n - 2]) / (x[n - 1] - x[n - 2]);
    for i in 1..n - 1 {
        let hs = x[i] - x[i - 1];
        let hd = x[i + 1] - x[i];
        out[i] = (hs * hs * y[i + 1] + (hd * hd - hs * hs) * y[i] - hd * hd * y[i - 1])
            / (hs * hd * (hs + hd));
    }
    Ok(out)
}
