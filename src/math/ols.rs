//! Linear least squares via SVD.
//!
//! The Levenberg–Marquardt step solves a small damped system of the form:
//!
//! ```text
//! minimize ‖J δ + r‖² + λ ‖D δ‖²
//! ```
//!
//! which is an ordinary least squares problem on the stacked matrix
//! `[J; √λ D]`. We solve it with SVD so tall and rank-deficient systems are
//! handled without special cases. (Nalgebra's `QR::solve` is intended for
//! square systems and will panic for non-square matrices.)

use nalgebra::{DMatrix, DVector};

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);

    // Try progressively looser tolerances if strict solve fails.
    for &tol in &[1e-12, 1e-10, 1e-8] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}

/// Unscaled parameter covariance `(JᵀJ)⁺` computed from the SVD of `J`.
///
/// Singular values below `ε · max(n, p) · σ_max` are discarded, so a
/// rank-deficient Jacobian yields a finite (pseudo-inverse) covariance.
pub fn normal_covariance(jac: &DMatrix<f64>) -> Option<DMatrix<f64>> {
    let p = jac.ncols();
    let svd = jac.clone().svd(false, true);
    let v_t = svd.v_t?;
    let s_max = svd.singular_values.iter().copied().fold(0.0_f64, f64::max);
    let threshold = f64::EPSILON * jac.nrows().max(p) as f64 * s_max;

    let mut cov = DMatrix::<f64>::zeros(p, p);
    for (k, &s) in svd.singular_values.iter().enumerate() {
        if s <= threshold {
            continue;
        }
        let row = v_t.row(k);
        cov += row.transpose() * row / (s * s);
    }
    Some(cov)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn least_squares_solves_simple_system() {
        // Fit y = 2 + 3x on x = [0,1,2]
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        let y = DVector::from_row_slice(&[2.0, 5.0, 8.0]);

        let beta = solve_least_squares(&x, &y).unwrap();
        assert!((beta[0] - 2.0).abs() < 1e-10);
        assert!((beta[1] - 3.0).abs() < 1e-10);
    }

    #[test]
    fn covariance_of_straight_line_design() {
        // J = [x 1] for x = [0,1,2]: JᵀJ = [[5,3],[3,3]], inverse = [[0.5,-0.5],[-0.5,5/6]]
        let j = DMatrix::from_row_slice(3, 2, &[0.0, 1.0, 1.0, 1.0, 2.0, 1.0]);
        let cov = normal_covariance(&j).unwrap();
        assert!((cov[(0, 0)] - 0.5).abs() < 1e-12);
        assert!((cov[(0, 1)] + 0.5).abs() < 1e-12);
        assert!((cov[(1, 1)] - 5.0 / 6.0).abs() < 1e-12);
    }

    #[test]
    fn covariance_drops_null_directions() {
        let j = DMatrix::from_row_slice(2, 2, &[1.0, 0.0, 1.0, 0.0]);
        let cov = normal_covariance(&j).unwrap();
        assert!((cov[(0, 0)] - 0.5).abs() < 1e-12);
        assert!(cov[(1, 1)].abs() < 1e-20);
    }
}
