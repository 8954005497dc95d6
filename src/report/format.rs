//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the math/fitting code stays clean and testable
//! - output changes are localized

use crate::domain::{Feature, ReferenceStar};
use crate::fit::Training;
use crate::models::LinearModel;
use crate::prep::PrepStats;
use crate::report::eda::{EdaReport, MissingReport, NumericSummary, SourceComparison};

/// Row counts through `stellar prepare`.
pub fn format_prep_summary(stats: &PrepStats) -> String {
    let mut out = String::new();

    out.push_str("=== stellar - catalog preparation ===\n");
    out.push_str("NEA stellar hosts:\n");
    out.push_str(&format!("  rows read            {:>7}\n", stats.nea.read));
    if stats.nea_row_errors > 0 {
        out.push_str(&format!("  unparseable rows     {:>7}\n", stats.nea_row_errors));
    }
    out.push_str(&format!("  main sequence        {:>7}\n", stats.nea.main_sequence));
    out.push_str(&format!("  complete rows        {:>7}\n", stats.nea.complete));
    out.push_str(&format!("  unique TIC ids       {:>7}\n", stats.nea.deduplicated));
    out.push_str(&format!("  [Fe/H] metallicity   {:>7}\n", stats.nea.feh));
    out.push_str(&format!("  converted            {:>7}\n", stats.nea.converted));

    out.push_str("Cross-match:\n");
    out.push_str(&format!("  TIC -> Gaia DR3      {:>7}\n", stats.crossmatches));
    out.push_str(&format!("  Gaia DR3 rows        {:>7}\n", stats.gaia_rows));

    out.push_str("Joined catalog:\n");
    out.push_str(&format!("  joined               {:>7}\n", stats.join.joined));
    out.push_str(&format!("  evolstage 100..=360  {:>7}\n", stats.join.in_window));
    out.push_str(&format!("  complete features    {:>7}\n", stats.join.complete));
    out.push_str(&format!("  spectype != unknown  {:>7}\n", stats.join.known_spectype));
    match stats.outliers_removed {
        Some(n) => out.push_str(&format!("  z-score outliers     {:>7}\n", n)),
        None => out.push_str("  z-score outliers         off\n"),
    }
    out.push_str(&format!("Final rows: {}\n", stats.final_rows));

    out
}

/// Coefficients and evaluation scores of a training run.
pub fn format_training(training: &Training, seed: u64) -> String {
    let m = &training.metrics;
    let mut out = String::new();

    out.push_str("=== stellar - linear mass model ===\n");
    out.push_str(&format_model(&training.model));
    out.push_str(&format!(
        "\nHold-out (seed={seed}): n_train={} n_test={}\n  MSE={:.3}\n  r2={:.3}\n",
        m.n_train, m.n_test, m.test_mse, m.test_r2
    ));
    out.push_str(&format!(
        "Cross validation ({} folds):\n  MSE={:.3}, r2={:.3}\n",
        m.cv_folds, m.cv_mse, m.cv_r2
    ));
    out.push('\n');
    out.push_str(&format_vif(&training.vif));

    out
}

pub fn format_model(model: &LinearModel) -> String {
    let mut out = String::new();
    out.push_str(&format!("Target: {} ({})\n", model.target.column(), model.target.unit_label()));
    out.push_str(&format!("Intercept: {:.8}\n", model.intercept));
    for (f, c) in model.features.iter().zip(&model.coefficients) {
        out.push_str(&format!("Coefficient {:<4} {:>12.8}  ({})\n", f.column(), c, f.unit_label()));
    }
    out
}

pub fn format_vif(vif: &[(&str, f64)]) -> String {
    let mut out = String::new();
    out.push_str(format!("{:<9} {:>10}\n", "Pred", "VIF").trim_end());
    out.push('\n');
    out.push_str(format!("{:-<9} {:-<10}\n", "", "").trim_end());
    out.push('\n');
    for (name, v) in vif {
        out.push_str(&format!("{:<9} {:>10.4}\n", name, v));
    }
    out
}

/// Single prediction with the reference stars for context.
pub fn format_prediction(luminosity: f64, metallicity: f64, mass: f64, references: &[ReferenceStar]) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "L = {luminosity} L_sun, [Fe/H] = {metallicity} dex  ->  M = {mass:.4} M_sun\n"
    ));
    out.push_str("\nReference stars:\n");
    for r in references {
        out.push_str(&format!("  {:<22} L={:>10.6} L_sun  M={:>7.4} M_sun\n", r.name, r.luminosity, r.mass));
    }
    out
}

fn summary_header() -> String {
    let mut out = String::new();
    out.push_str(
        format!(
            "{:<6} {:>6} {:>12} {:>12} {:>12} {:>12} {:>12} {:>12} {:>12}\n",
            "", "count", "mean", "std", "min", "25%", "50%", "75%", "max"
        )
        .trim_end(),
    );
    out.push('\n');
    out
}

fn summary_row(label: &str, s: &NumericSummary) -> String {
    format!(
        "{:<6} {:>6} {:>12.4} {:>12.4} {:>12.4} {:>12.4} {:>12.4} {:>12.4} {:>12.4}\n",
        label, s.count, s.mean, s.std, s.min, s.q25, s.median, s.q75, s.max
    )
}

pub fn format_missing(missing: &MissingReport) -> String {
    let mut out = String::new();
    out.push_str("Columns with missing values:\n");
    if missing.columns.is_empty() {
        out.push_str("  (none)\n");
    }
    for (name, n) in &missing.columns {
        out.push_str(&format!("  {:<16} {:>6}\n", name, n));
    }
    out.push_str("Rows with missing values:\n");
    out.push_str(&format!("Rows with at least one missing value: {}\n", missing.rows_any));
    out.push_str(&format!("Rows with all values missing: {}\n", missing.rows_all));
    out.push_str(&format!("Rows with no missing values: {}\n", missing.rows_none));
    out
}

/// Plain-text EDA report (written to `eda_report.txt`).
pub fn format_eda(report: &EdaReport) -> String {
    let mut out = String::new();

    out.push_str("===== EDA Report: =====\n");
    out.push_str(&format!("Rows: {}\n", report.rows));

    out.push_str("\nSummary Statistics (Numerical Variables):\n\n");
    out.push_str(&summary_header());
    for s in &report.numeric {
        out.push_str(&summary_row(&s.name, s));
    }

    out.push_str("\nSummary Statistics (Categorical Variables):\n\n");
    let total: usize = report.categories.iter().map(|(_, n)| n).sum();
    out.push_str(&format!(
        "spectype: count={total} unique={} top={}\n",
        report.categories.len(),
        report
            .categories
            .iter()
            .max_by_key(|(_, n)| *n)
            .map_or("-", |(k, _)| k.as_str())
    ));
    for (label, n) in &report.categories {
        out.push_str(&format!("  {:<8} {:>6}\n", label, n));
    }

    out.push_str("\nMissing Values Analysis:\n\n");
    out.push_str(&format_missing(&report.missing));

    out.push_str(&format!(
        "\nZ-Score Based Outlier Detection (threshold = {}):\n\n",
        report.threshold
    ));
    for column in &report.outliers {
        out.push_str(&format!("Column: {}\n", column.feature.column()));
        if column.rows.is_empty() {
            out.push_str("No outliers\n");
        } else {
            let rows: Vec<String> = column.rows.iter().map(|r| r.to_string()).collect();
            out.push_str(&format!(
                "{} outlier(s), max |z| = {:.2}, rows: {}\n",
                column.rows.len(),
                column.max_abs_z,
                rows.join(", ")
            ));
        }
    }

    out.push_str("\nCorrelation Matrix:\n\n");
    out.push_str(&format!("{:<6}", ""));
    for f in Feature::ALL {
        out.push_str(&format!(" {:>7}", f.column()));
    }
    out.push('\n');
    for (i, f) in Feature::ALL.iter().enumerate() {
        out.push_str(&format!("{:<6}", f.column()));
        for j in 0..Feature::ALL.len() {
            out.push_str(&format!(" {:>7.2}", report.correlation[(i, j)]));
        }
        out.push('\n');
    }

    out.push_str("\nVariance Inflation Factors (model predictors):\n\n");
    out.push_str(&format_vif(&report.vif));

    out.push_str("\nPrincipal Component Analysis (standardized features):\n\n");
    match &report.pca {
        None => out.push_str("PCA unavailable (constant or too few columns).\n"),
        Some(pca) => {
            out.push_str(&format!("{:<6} {:>10} {:>10}", "PC", "eigen", "explained"));
            for f in Feature::ALL {
                out.push_str(&format!(" {:>7}", f.column()));
            }
            out.push('\n');
            for (c, loadings) in pca.loadings.iter().enumerate() {
                out.push_str(&format!(
                    "{:<6} {:>10.4} {:>9.1}%",
                    format!("PC{}", c + 1),
                    pca.eigenvalues[c],
                    pca.explained_ratio[c] * 100.0
                ));
                for w in loadings {
                    out.push_str(&format!(" {:>7.3}", w));
                }
                out.push('\n');
            }
        }
    }

    out
}

/// NEA vs Gaia per-feature summaries (before joined-set cleaning).
pub fn format_comparison(rows: &[SourceComparison], missing: &MissingReport) -> String {
    let mut out = String::new();
    out.push_str("===== NEA vs Gaia Feature Distributions =====\n");
    for row in rows {
        out.push_str(&format!(
            "\n{} ({})\n",
            row.feature.column(),
            row.feature.unit_label()
        ));
        out.push_str(&summary_header());
        for summary in [&row.nea, &row.gaia].into_iter().flatten() {
            out.push_str(&summary_row(&summary.name, summary));
        }
    }
    out.push_str("\nMissing Values Analysis (joined, before cleaning):\n\n");
    out.push_str(&format_missing(missing));
    out
}
