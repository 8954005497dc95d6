//! Exploratory data analysis of the catalog.
//!
//! Computes the tables shown in the EDA report; formatting lives in
//! `report::format`.

use std::collections::BTreeMap;

use nalgebra::DMatrix;

use crate::domain::{Feature, JoinedStar, Star, SPECTRAL_ORDER};
use crate::fit::{predictor_vif, Dataset, MODEL_FEATURES, MODEL_TARGET};
use crate::math::{correlation_matrix, mean, pca, quantile, std_sample, PcaResult};
use crate::prep::outliers::{detect, ColumnOutliers};

/// `describe()`-style summary of one numeric column.
#[derive(Debug, Clone, PartialEq)]
pub struct NumericSummary {
    pub name: String,
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation (`NaN` for fewer than two values).
    pub std: f64,
    pub min: f64,
    pub q25: f64,
    pub median: f64,
    pub q75: f64,
    pub max: f64,
}

pub fn describe(name: &str, values: &[f64]) -> Option<NumericSummary> {
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    Some(NumericSummary {
        name: name.to_string(),
        count: values.len(),
        mean: mean(values)?,
        std: std_sample(values).unwrap_or(f64::NAN),
        min,
        q25: quantile(values, 0.25)?,
        median: quantile(values, 0.5)?,
        q75: quantile(values, 0.75)?,
        max,
    })
}

/// Missing-value analysis over named columns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MissingReport {
    /// Columns with at least one missing value, most missing first.
    pub columns: Vec<(String, usize)>,
    pub rows_any: usize,
    pub rows_all: usize,
    pub rows_none: usize,
}

/// Build a report from per-row missing masks (`mask[row][col]`).
pub fn missing_report(names: &[&str], mask: &[Vec<bool>]) -> MissingReport {
    let mut per_column = vec![0usize; names.len()];
    let mut report = MissingReport::default();

    for row in mask {
        for (c, &missing) in row.iter().enumerate() {
            if missing {
                per_column[c] += 1;
            }
        }
        if row.iter().any(|&m| m) {
            report.rows_any += 1;
        } else {
            report.rows_none += 1;
        }
        if !row.is_empty() && row.iter().all(|&m| m) {
            report.rows_all += 1;
        }
    }

    let mut columns: Vec<(String, usize)> = names
        .iter()
        .zip(per_column)
        .filter(|(_, n)| *n > 0)
        .map(|(name, n)| (name.to_string(), n))
        .collect();
    columns.sort_by(|a, b| b.1.cmp(&a.1));
    report.columns = columns;
    report
}

const JOINED_COLUMNS: [&str; 15] = [
    "M_nea", "L_nea", "Teff_nea", "R_nea", "met_nea", "spectype_nea",
    "M_gaia", "L_gaia", "Teff_gaia", "R_gaia", "met_gaia", "spectype_gaia",
    "evolstage_flame", "tic_id", "gaia_id",
];

/// Missing values in the joined set before joined-set cleaning.
pub fn missing_in_joined(joined: &[JoinedStar]) -> MissingReport {
    let mask: Vec<Vec<bool>> = joined
        .iter()
        .map(|j| {
            let mut row: Vec<bool> = Feature::ALL.iter().map(|&f| !j.nea.get(f).is_finite()).collect();
            row.push(j.spectype_nea.trim().is_empty());
            row.extend(Feature::ALL.iter().map(|&f| j.gaia.get(f).is_none()));
            row.push(j.spectype_gaia.is_none());
            row.push(j.evolstage.is_none());
            row.push(j.tic_id.is_empty());
            row.push(false);
            row
        })
        .collect();
    missing_report(&JOINED_COLUMNS, &mask)
}

/// Spectral class counts, Harvard order first, other labels alphabetically.
/// Stars without a class are not counted.
pub fn category_counts(stars: &[Star]) -> Vec<(String, usize)> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for s in stars.iter().filter(|s| !s.spectype.is_empty()) {
        *counts.entry(s.spectype.as_str()).or_default() += 1;
    }

    let rank = |label: &str| SPECTRAL_ORDER.iter().position(|c| *c == label).unwrap_or(SPECTRAL_ORDER.len());
    let mut out: Vec<(String, usize)> = counts.into_iter().map(|(k, v)| (k.to_string(), v)).collect();
    out.sort_by(|a, b| rank(&a.0).cmp(&rank(&b.0)).then_with(|| a.0.cmp(&b.0)));
    out
}

/// Everything the EDA report prints.
#[derive(Debug, Clone)]
pub struct EdaReport {
    pub rows: usize,
    pub numeric: Vec<NumericSummary>,
    pub categories: Vec<(String, usize)>,
    pub missing: MissingReport,
    pub threshold: f64,
    pub outliers: Vec<ColumnOutliers>,
    pub correlation: DMatrix<f64>,
    pub vif: Vec<(&'static str, f64)>,
    pub pca: Option<PcaResult>,
}

pub fn feature_columns(stars: &[Star]) -> Vec<Vec<f64>> {
    Feature::ALL
        .iter()
        .map(|&f| stars.iter().map(|s| s.get(f)).collect())
        .collect()
}

pub fn build_eda(stars: &[Star], threshold: f64) -> EdaReport {
    let columns = feature_columns(stars);
    let numeric = Feature::ALL
        .iter()
        .zip(&columns)
        .filter_map(|(f, values)| describe(f.column(), values))
        .collect();

    // The cleaned catalog has no missing values by construction; the report
    // still checks for non-finite entries.
    let mask: Vec<Vec<bool>> = stars
        .iter()
        .map(|s| Feature::ALL.iter().map(|&f| !s.get(f).is_finite()).collect())
        .collect();
    let names: Vec<&str> = Feature::ALL.iter().map(|f| f.column()).collect();

    EdaReport {
        rows: stars.len(),
        numeric,
        categories: category_counts(stars),
        missing: missing_report(&names, &mask),
        threshold,
        outliers: detect(stars, threshold),
        correlation: correlation_matrix(&columns),
        vif: predictor_vif(&Dataset::from_stars(stars, &MODEL_FEATURES, MODEL_TARGET)),
        pca: pca(&columns),
    }
}

/// NEA vs Gaia summaries of one feature across the joined set.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceComparison {
    pub feature: Feature,
    pub nea: Option<NumericSummary>,
    pub gaia: Option<NumericSummary>,
}

pub fn compare_sources(joined: &[JoinedStar]) -> Vec<SourceComparison> {
    Feature::ALL
        .iter()
        .map(|&feature| {
            let nea: Vec<f64> = joined.iter().map(|j| j.nea.get(feature)).collect();
            let gaia: Vec<f64> = joined.iter().filter_map(|j| j.gaia.get(feature)).collect();
            SourceComparison {
                feature,
                nea: describe("NEA", &nea),
                gaia: describe("Gaia", &gaia),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::synthetic::{generate_catalog, SyntheticConfig};
    use crate::domain::{Features, PartialFeatures};

    #[test]
    fn describe_matches_pandas_conventions() {
        let s = describe("x", &[1.0, 2.0, 3.0, 4.0]).unwrap();
        assert_eq!(s.count, 4);
        assert_eq!(s.mean, 2.5);
        assert!((s.std - 1.2909944487358056).abs() < 1e-12);
        assert_eq!((s.min, s.q25, s.median, s.q75, s.max), (1.0, 1.75, 2.5, 3.25, 4.0));
        assert!(describe("empty", &[]).is_none());
    }

    #[test]
    fn missing_report_counts_rows_and_columns() {
        let mask = vec![
            vec![false, false, false],
            vec![true, false, true],
            vec![true, true, true],
            vec![false, false, true],
        ];
        let r = missing_report(&["a", "b", "c"], &mask);
        assert_eq!(
            r.columns,
            vec![("c".to_string(), 3), ("a".to_string(), 2), ("b".to_string(), 1)]
        );
        assert_eq!((r.rows_any, r.rows_all, r.rows_none), (3, 1, 1));
    }

    #[test]
    fn joined_missing_tracks_gaia_gaps() {
        let j = JoinedStar {
            tic_id: "TIC 1".to_string(),
            gaia_id: 1,
            nea: Features {
                mass: 30.0,
                luminosity: 26.5,
                teff: 5700.0,
                radius: 1.0,
                metallicity: -4.5,
            },
            gaia: PartialFeatures {
                teff: Some(5800.0),
                ..PartialFeatures::default()
            },
            spectype_nea: "G2 V".to_string(),
            spectype_gaia: None,
            evolstage: Some(200.0),
        };
        let r = missing_in_joined(&[j]);
        let names: Vec<&str> = r.columns.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names.len(), 5);
        assert!(names.contains(&"M_gaia"));
        assert!(names.contains(&"spectype_gaia"));
        assert!(!names.contains(&"Teff_gaia"));
        assert_eq!((r.rows_any, r.rows_all), (1, 0));
    }

    #[test]
    fn categories_follow_harvard_order() {
        let mut stars = generate_catalog(&SyntheticConfig {
            count: 3,
            ..SyntheticConfig::default()
        })
        .unwrap();
        stars[0].spectype = "K".to_string();
        stars[1].spectype = "F".to_string();
        stars[2].spectype = "CSTAR".to_string();
        let labels: Vec<String> = category_counts(&stars).into_iter().map(|(k, _)| k).collect();
        assert_eq!(labels, vec!["F", "K", "CSTAR"]);
    }

    #[test]
    fn unclassified_stars_are_not_a_category() {
        let mut stars = generate_catalog(&SyntheticConfig {
            count: 3,
            ..SyntheticConfig::default()
        })
        .unwrap();
        stars[0].spectype = "G".to_string();
        stars[1].spectype = String::new();
        stars[2].spectype = "G".to_string();
        assert_eq!(category_counts(&stars), vec![("G".to_string(), 2)]);
    }

    #[test]
    fn eda_report_covers_all_features() {
        let stars = generate_catalog(&SyntheticConfig::default()).unwrap();
        let report = build_eda(&stars, 3.0);
        assert_eq!(report.rows, 400);
        assert_eq!(report.numeric.len(), 5);
        assert_eq!(report.correlation.nrows(), 5);
        assert!((report.correlation[(0, 0)] - 1.0).abs() < 1e-12);
        assert_eq!(report.missing.rows_none, 400);
        let pca = report.pca.unwrap();
        let total: f64 = pca.explained_ratio.iter().sum();
        assert!((total - 1.0).abs() < 1e-9);
    }
}
