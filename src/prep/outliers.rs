//! z-score outlier detection and removal on the cleaned catalog.

use crate::domain::{Feature, Star};
use crate::math::stats::zscores;

pub const DEFAULT_Z_THRESHOLD: f64 = 3.0;

/// Outliers found in one column.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnOutliers {
    pub feature: Feature,
    /// Row indices with `|z| > threshold`.
    pub rows: Vec<usize>,
    pub max_abs_z: f64,
}

/// Per-column population z-scores (`Feature::ALL` order).
pub fn column_zscores(stars: &[Star]) -> Vec<(Feature, Vec<f64>)> {
    Feature::ALL
        .into_iter()
        .map(|f| {
            let values: Vec<f64> = stars.iter().map(|s| s.get(f)).collect();
            (f, zscores(&values))
        })
        .collect()
}

/// Report-only detector: outliers per column, nothing removed.
pub fn detect(stars: &[Star], threshold: f64) -> Vec<ColumnOutliers> {
    column_zscores(stars)
        .into_iter()
        .map(|(feature, z)| ColumnOutliers {
            feature,
            rows: z
                .iter()
                .enumerate()
                .filter(|(_, v)| v.abs() > threshold)
                .map(|(i, _)| i)
                .collect(),
            max_abs_z: z.iter().fold(0.0, |acc: f64, v| acc.max(v.abs())),
        })
        .collect()
}

/// Drop rows that are outliers in any column. Returns the kept rows and the
/// number removed.
pub fn remove_outliers(stars: Vec<Star>, threshold: f64) -> (Vec<Star>, usize) {
    let mut flagged = vec![false; stars.len()];
    for column in detect(&stars, threshold) {
        for row in column.rows {
            flagged[row] = true;
        }
    }

    let before = stars.len();
    let kept: Vec<Star> = stars
        .into_iter()
        .zip(flagged)
        .filter(|(_, out)| !out)
        .map(|(s, _)| s)
        .collect();
    let removed = before - kept.len();
    (kept, removed)
}
