//! Ordinary least squares solver.
//!
//! Every regression in this crate (the mass model, cross-validation folds,
//! variance inflation factors, pairwise trend lines) reduces to:
//!
//! ```text
//! minimize Σ (y_i - x_i^T β)^2
//! ```
//!
//! We solve with SVD so the tall (many rows, few columns) design matrix is
//! handled robustly even when two predictors are nearly collinear.
//! (Nalgebra's `QR::solve` is intended for square systems and will panic for
//! non-square matrices.)

use nalgebra::{DMatrix, DVector};

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    if x.nrows() != y.len() || x.nrows() == 0 {
        return None;
    }

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

/// Build a design matrix with a leading intercept column.
pub fn design_with_intercept(rows: &[Vec<f64>]) -> DMatrix<f64> {
    let n = rows.len();
    let k = rows.first().map(|r| r.len()).unwrap_or(0);
    DMatrix::from_fn(n, k + 1, |i, j| if j == 0 { 1.0 } else { rows[i][j - 1] })
}
