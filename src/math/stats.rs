//! Descriptive statistics and simple regression helpers.
//!
//! Conventions follow the usual data-analysis defaults:
//! - `std_sample` uses `n - 1` (summary tables)
//! - `std_population` uses `n` (z-scores)
//! - quantiles interpolate linearly between closest ranks

use nalgebra::{DMatrix, DVector};

use crate::math::ols::{design_with_intercept, solve_least_squares};

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

pub fn std_population(values: &[f64]) -> Option<f64> {
    let m = mean(values)?;
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    Some(var.sqrt())
}

pub fn std_sample(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() as f64 - 1.0);
    Some(var.sqrt())
}

/// Quantile `q ∈ [0, 1]` with linear interpolation between closest ranks.
pub fn quantile(values: &[f64], q: f64) -> Option<f64> {
    if values.is_empty() || !(0.0..=1.0).contains(&q) {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let pos = q * (sorted.len() as f64 - 1.0);
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Some(sorted[lo] + frac * (sorted[hi] - sorted[lo]))
}

/// Population z-scores. A constant column yields all zeros.
pub fn zscores(values: &[f64]) -> Vec<f64> {
    let (Some(m), Some(s)) = (mean(values), std_population(values)) else {
        return Vec::new();
    };
    if s == 0.0 || !s.is_finite() {
        return vec![0.0; values.len()];
    }
    values.iter().map(|v| (v - m) / s).collect()
}

/// Pearson correlation coefficient. `None` for mismatched lengths or zero variance.
pub fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.len() != y.len() || x.len() < 2 {
        return None;
    }
    let mx = mean(x)?;
    let my = mean(y)?;
    let mut sxy = 0.0;
    let mut sxx = 0.0;
    let mut syy = 0.0;
    for (a, b) in x.iter().zip(y) {
        sxy += (a - mx) * (b - my);
        sxx += (a - mx).powi(2);
        syy += (b - my).powi(2);
    }
    if sxx == 0.0 || syy == 0.0 {
        return None;
    }
    Some(sxy / (sxx * syy).sqrt())
}

/// Pairwise Pearson correlations of the given columns (diagonal = 1).
pub fn correlation_matrix(columns: &[Vec<f64>]) -> DMatrix<f64> {
    let k = columns.len();
    DMatrix::from_fn(k, k, |i, j| {
        if i == j {
            1.0
        } else {
            pearson(&columns[i], &columns[j]).unwrap_or(f64::NAN)
        }
    })
}

/// Simple linear regression `y = intercept + slope * x`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineFit {
    pub slope: f64,
    pub intercept: f64,
    pub r: f64,
}

pub fn linregress(x: &[f64], y: &[f64]) -> Option<LineFit> {
    if x.len() != y.len() || x.len() < 2 {
        return None;
    }
    let mx = mean(x)?;
    let my = mean(y)?;
    let sxx: f64 = x.iter().map(|a| (a - mx).powi(2)).sum();
    if sxx == 0.0 {
        return None;
    }
    let sxy: f64 = x.iter().zip(y).map(|(a, b)| (a - mx) * (b - my)).sum();
    let slope = sxy / sxx;
    Some(LineFit {
        slope,
        intercept: my - slope * mx,
        r: pearson(x, y).unwrap_or(0.0),
    })
}

pub fn mean_squared_error(y_true: &[f64], y_pred: &[f64]) -> Option<f64> {
    if y_true.len() != y_pred.len() || y_true.is_empty() {
        return None;
    }
    let sse: f64 = y_true.iter().zip(y_pred).map(|(a, b)| (a - b).powi(2)).sum();
    Some(sse / y_true.len() as f64)
}

/// Coefficient of determination.
///
/// When the target has zero variance the score is 1 for an exact fit and 0
/// otherwise.
pub fn r2_score(y_true: &[f64], y_pred: &[f64]) -> Option<f64> {
    if y_true.len() != y_pred.len() || y_true.is_empty() {
        return None;
    }
    let m = mean(y_true)?;
    let ss_res: f64 = y_true.iter().zip(y_pred).map(|(a, b)| (a - b).powi(2)).sum();
    let ss_tot: f64 = y_true.iter().map(|a| (a - m).powi(2)).sum();
    if ss_tot == 0.0 {
        return Some(if ss_res == 0.0 { 1.0 } else { 0.0 });
    }
    Some(1.0 - ss_res / ss_tot)
}

/// Variance inflation factor of each column against the others.
///
/// `VIF_j = 1 / (1 - R²_j)` where `R²_j` comes from regressing column `j` on
/// the remaining columns plus an intercept. A perfectly explained column gives
/// `+inf`.
pub fn variance_inflation_factors(columns: &[Vec<f64>]) -> Vec<f64> {
    let k = columns.len();
    let n = columns.first().map(|c| c.len()).unwrap_or(0);

    (0..k)
        .map(|j| {
            if k < 2 {
                return 1.0;
            }
            let rows: Vec<Vec<f64>> = (0..n)
                .map(|i| (0..k).filter(|&c| c != j).map(|c| columns[c][i]).collect())
                .collect();
            let x = design_with_intercept(&rows);
            let y = DVector::from_column_slice(&columns[j]);
            let Some(beta) = solve_least_squares(&x, &y) else {
                return f64::NAN;
            };
            let fitted = &x * beta;
            let r2 = r2_score(y.as_slice(), fitted.as_slice()).unwrap_or(0.0);
            if r2 >= 1.0 { f64::INFINITY } else { 1.0 / (1.0 - r2) }
        })
        .collect()
}

/// Variance inflation factor of the intercept column.
///
/// The constant is regressed on the columns without an intercept, so `R²` is
/// uncentered: `VIF = 1 / (1 - R²) = n / SSR`. A constant that the columns
/// reproduce exactly gives `+inf`.
pub fn intercept_vif(columns: &[Vec<f64>]) -> f64 {
    let n = columns.first().map(|c| c.len()).unwrap_or(0);
    if n == 0 {
        return f64::NAN;
    }
    if columns.is_empty() {
        return 1.0;
    }
    let x = DMatrix::from_fn(n, columns.len(), |i, j| columns[j][i]);
    let y = DVector::from_element(n, 1.0);
    let Some(beta) = solve_least_squares(&x, &y) else {
        return f64::NAN;
    };
    let ssr = (&y - &x * beta).norm_squared();
    if ssr <= f64::EPSILON * n as f64 { f64::INFINITY } else { n as f64 / ssr }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_statistics() {
        let v = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(mean(&v), Some(2.5));
        assert!((std_population(&v).unwrap() - 1.118033988749895).abs() < 1e-12);
        assert!((std_sample(&v).unwrap() - 1.2909944487358056).abs() < 1e-12);
        assert_eq!(quantile(&v, 0.5), Some(2.5));
        assert_eq!(quantile(&v, 0.25), Some(1.75));
        assert_eq!(quantile(&v, 1.0), Some(4.0));
        assert_eq!(mean(&[]), None);
    }

    #[test]
    fn zscores_use_population_std() {
        let z = zscores(&[1.0, 2.0, 3.0]);
        let s = (2.0f64 / 3.0).sqrt();
        assert!((z[0] + 1.0 / s).abs() < 1e-12);
        assert!(z[1].abs() < 1e-12);
        assert_eq!(zscores(&[5.0, 5.0]), vec![0.0, 0.0]);
    }

    #[test]
    fn linregress_recovers_line() {
        let x = [0.0, 1.0, 2.0, 3.0];
        let y: Vec<f64> = x.iter().map(|v| 1.5 - 2.0 * v).collect();
        let fit = linregress(&x, &y).unwrap();
        assert!((fit.slope + 2.0).abs() < 1e-12);
        assert!((fit.intercept - 1.5).abs() < 1e-12);
        assert!((fit.r + 1.0).abs() < 1e-12);
    }

    #[test]
    fn r2_and_mse() {
        let y = [1.0, 2.0, 3.0];
        assert_eq!(r2_score(&y, &y), Some(1.0));
        assert_eq!(mean_squared_error(&y, &[1.0, 2.0, 4.0]), Some(1.0 / 3.0));
        assert_eq!(r2_score(&[2.0, 2.0], &[2.0, 2.0]), Some(1.0));
        assert_eq!(r2_score(&[2.0, 2.0], &[2.0, 3.0]), Some(0.0));
    }

    #[test]
    fn vif_is_one_for_uncorrelated_columns() {
        // Orthogonal, zero-mean columns.
        let a = vec![1.0, -1.0, 1.0, -1.0];
        let b = vec![1.0, 1.0, -1.0, -1.0];
        let vif = variance_inflation_factors(&[a, b]);
        assert!((vif[0] - 1.0).abs() < 1e-9);
        assert!((vif[1] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn intercept_vif_uses_uncentered_fit() {
        // ones ~ 1/3 * a leaves residuals (2/3, 1/3, 0, -1/3): SSR = 2/3, VIF = 4 / SSR.
        let vif = intercept_vif(&[vec![1.0, 2.0, 3.0, 4.0]]);
        assert!((vif - 6.0).abs() < 1e-9, "got {vif}");

        let centered = intercept_vif(&[vec![-1.0, 1.0, -1.0, 1.0], vec![-1.0, -1.0, 1.0, 1.0]]);
        assert!((centered - 1.0).abs() < 1e-9);

        assert_eq!(intercept_vif(&[vec![2.0, 2.0, 2.0]]), f64::INFINITY);
    }

    #[test]
    fn vif_grows_with_collinearity() {
        let a = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let b = vec![1.1, 1.9, 3.2, 3.9, 5.1];
        let vif = variance_inflation_factors(&[a, b]);
        assert!(vif[0] > 10.0, "got {}", vif[0]);
    }

    #[test]
    fn correlation_matrix_is_symmetric() {
        let m = correlation_matrix(&[vec![1.0, 2.0, 3.0], vec![3.0, 1.0, 2.0]]);
        assert_eq!(m[(0, 0)], 1.0);
        assert!((m[(0, 1)] - m[(1, 0)]).abs() < 1e-12);
        assert!((m[(0, 1)] + 0.5).abs() < 1e-12);
    }
}
