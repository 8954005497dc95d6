//! Principal component analysis on standardized columns.
//!
//! The columns are z-scored first, so the decomposition is of the correlation
//! matrix. Components are sorted by explained variance, largest first, and each
//! loading vector is sign-normalized so its largest-magnitude entry is positive
//! (eigenvectors are only defined up to sign).

use nalgebra::{DMatrix, SymmetricEigen};

use crate::math::stats::correlation_matrix;

#[derive(Debug, Clone)]
pub struct PcaResult {
    /// Eigenvalues of the correlation matrix, descending.
    pub eigenvalues: Vec<f64>,
    /// Fraction of total variance explained by each component.
    pub explained_ratio: Vec<f64>,
    /// `loadings[c][f]`: weight of feature `f` in component `c`.
    pub loadings: Vec<Vec<f64>>,
}

/// Returns `None` when fewer than two columns or rows, or any column is constant.
pub fn pca(columns: &[Vec<f64>]) -> Option<PcaResult> {
    let k = columns.len();
    let n = columns.first()?.len();
    if k < 2 || n < 2 || columns.iter().any(|c| c.len() != n) {
        return None;
    }

    let corr: DMatrix<f64> = correlation_matrix(columns);
    if corr.iter().any(|v| !v.is_finite()) {
        return None;
    }

    let eig = SymmetricEigen::new(corr);
    let mut order: Vec<usize> = (0..k).collect();
    order.sort_by(|&a, &b| {
        eig.eigenvalues[b]
            .partial_cmp(&eig.eigenvalues[a])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let total: f64 = eig.eigenvalues.iter().map(|v| v.max(0.0)).sum();
    let mut eigenvalues = Vec::with_capacity(k);
    let mut explained_ratio = Vec::with_capacity(k);
    let mut loadings = Vec::with_capacity(k);

    for idx in order {
        let lambda = eig.eigenvalues[idx].max(0.0);
        eigenvalues.push(lambda);
        explained_ratio.push(if total > 0.0 { lambda / total } else { 0.0 });

        let mut v: Vec<f64> = eig.eigenvectors.column(idx).iter().copied().collect();
        let pivot = v
            .iter()
            .copied()
            .fold(0.0f64, |acc, x| if x.abs() > acc.abs() { x } else { acc });
        if pivot < 0.0 {
            v.iter_mut().for_each(|x| *x = -*x);
        }
        loadings.push(v);
    }

    Some(PcaResult {
        eigenvalues,
        explained_ratio,
        loadings,
    })
}
