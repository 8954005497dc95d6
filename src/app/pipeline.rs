//! Shared batch workflows used by the CLI subcommands.
//!
//! Keeping these in one place lets `run` chain `prepare` and `train` without
//! duplicating either:
//! NEA ingest -> NEA clean -> TIC/Gaia cross-match -> Gaia clean -> join ->
//! joined clean -> outliers -> cleaned catalog -> training -> model artifact

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::data::TapClient;
use crate::domain::{CrossMatch, JoinedStar, PrepareConfig, Star, TrainConfig};
use crate::error::AppError;
use crate::fit::{train, Training};
use crate::io::{
    read_crossref_csv, read_gaia_csv, read_nea_csv, read_stars_csv, write_crossref_csv, write_gaia_csv,
    write_gaia_published_csv, write_model_json, write_nea_csv, write_stars_csv, Ingested, RowError,
};
use crate::models::ModelFile;
use crate::plot::{write_eda_charts, write_source_comparison};
use crate::prep::{self, PrepStats};
use crate::report::{build_eda, compare_sources, format_comparison, format_eda, missing_in_joined, EdaReport};

const CROSSREF_CACHE: &str = "tic_gaia_crossref.csv";
const GAIA_CACHE: &str = "gaia_dr3_astrophysical.csv";
const MAX_LOGGED_ROW_ERRORS: usize = 10;

/// Outputs of a `stellar prepare` run.
#[derive(Debug, Clone)]
pub struct PrepareOutput {
    pub stars: Vec<Star>,
    pub stats: PrepStats,
}

/// Clean, join and filter the catalogs, then write the cleaned catalog.
pub fn run_prepare(config: &PrepareConfig) -> Result<PrepareOutput, AppError> {
    let mut stats = PrepStats::default();
    // Created on first use so fully local runs never touch the network.
    let mut tap: Option<TapClient> = None;

    // 1) NEA stellar hosts.
    let raw = read_nea_csv(&config.nea_path)?;
    log_row_errors("NEA", &raw.row_errors);
    stats.nea_row_errors = raw.row_errors.len();
    let nea = prep::nea::process(&raw.rows);
    stats.nea = nea.stats;
    info!(rows = nea.stats.read, kept = nea.stars.len(), "cleaned NEA hosts");
    if nea.stars.is_empty() {
        return Err(AppError::insufficient("No NEA stars left after cleaning."));
    }
    if let Some(path) = &config.nea_out {
        write_nea_csv(path, &nea.stars)?;
    }

    // 2) TIC -> Gaia DR3 cross-match.
    let crossref = match &config.crossref_path {
        Some(path) => read_crossref_csv(path)?,
        None => {
            let tic_ids: Vec<u64> = nea.stars.iter().filter_map(|s| s.tic_number).collect();
            cached(config.cache_dir.as_deref(), CROSSREF_CACHE, read_crossref_csv, write_crossref_csv, || {
                tap_client(&mut tap)?.fetch_crossmatch(&tic_ids)
            })?
        }
    };
    log_row_errors("cross-reference", &crossref.row_errors);
    stats.crossmatches = crossref.rows.len();

    // 3) Gaia DR3 astrophysical parameters.
    let gaia_raw = match &config.gaia_path {
        Some(path) => read_gaia_csv(path)?,
        None => {
            let source_ids = gaia_ids(&crossref.rows);
            cached(config.cache_dir.as_deref(), GAIA_CACHE, read_gaia_csv, write_gaia_published_csv, || {
                tap_client(&mut tap)?.fetch_gaia(&source_ids)
            })?
        }
    };
    log_row_errors("Gaia", &gaia_raw.row_errors);
    stats.gaia_rows = gaia_raw.rows.len();
    let gaia = prep::gaia::process(gaia_raw.rows);
    if let Some(path) = &config.gaia_out {
        write_gaia_csv(path, &gaia)?;
    }

    // 4) Join, compare sources, clean the joined set.
    let joined = prep::join::join(&nea.stars, &crossref.rows, &gaia);
    info!(joined = joined.len(), "joined NEA with Gaia DR3");
    if let Some(dir) = &config.eda_dir {
        write_comparison(dir, &joined)?;
    }
    let (stars, join_stats) = prep::join::clean_joined(&joined);
    stats.join = join_stats;

    // 5) Outliers.
    let stars = match config.outlier_threshold {
        Some(threshold) => {
            let (kept, removed) = prep::outliers::remove_outliers(stars, threshold);
            stats.outliers_removed = Some(removed);
            kept
        }
        None => stars,
    };
    stats.final_rows = stars.len();
    if stars.is_empty() {
        return Err(AppError::insufficient("No stars left after cleaning the joined catalog."));
    }

    write_stars_csv(&config.out_path, &stars)?;
    info!(rows = stars.len(), path = %config.out_path.display(), "wrote cleaned catalog");

    if let Some(dir) = &config.eda_dir {
        run_eda(&stars, dir, config.outlier_threshold.unwrap_or(prep::DEFAULT_Z_THRESHOLD))?;
    }

    Ok(PrepareOutput { stars, stats })
}

/// Fit the model on the cleaned catalog and write the artifact.
pub fn run_train(config: &TrainConfig) -> Result<Training, AppError> {
    let stars = read_stars_csv(&config.data_path)?;
    info!(rows = stars.len(), path = %config.data_path.display(), "loaded catalog");

    let training = train(&stars, config)?;
    let artifact = ModelFile::new(training.model.clone(), training.metrics.clone(), config.seed, config.test_size);
    write_model_json(&config.model_out, &artifact)?;
    info!(path = %config.model_out.display(), "wrote model artifact");

    Ok(training)
}

/// Write `eda_report.txt` and the SVG charts into `dir`.
pub fn run_eda(stars: &[Star], dir: &Path, threshold: f64) -> Result<EdaReport, AppError> {
    let report = build_eda(stars, threshold);
    write_text(&dir.join("eda_report.txt"), &format_eda(&report))?;
    let charts = write_eda_charts(dir, stars, threshold)?;
    info!(charts = charts.len(), dir = %dir.display(), "wrote EDA report");
    Ok(report)
}

fn write_comparison(dir: &Path, joined: &[JoinedStar]) -> Result<(), AppError> {
    let text = format_comparison(&compare_sources(joined), &missing_in_joined(joined));
    write_text(&dir.join("compare_before_join.txt"), &text)?;
    write_source_comparison(dir, joined)?;
    Ok(())
}

fn write_text(path: &Path, text: &str) -> Result<(), AppError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .map_err(|e| AppError::input(format!("Failed to create directory '{}': {e}", parent.display())))?;
    }
    fs::write(path, text).map_err(|e| AppError::input(format!("Failed to write '{}': {e}", path.display())))
}

fn tap_client(slot: &mut Option<TapClient>) -> Result<&TapClient, AppError> {
    if slot.is_none() {
        let client = TapClient::from_env()?;
        info!(batch_size = client.config().batch_size, "TAP client ready");
        *slot = Some(client);
    }
    slot.as_ref()
        .ok_or_else(|| AppError::runtime("TAP client unavailable."))
}

/// Distinct Gaia ids in first-seen order.
fn gaia_ids(matches: &[CrossMatch]) -> Vec<u64> {
    let mut seen = std::collections::HashSet::new();
    matches
        .iter()
        .map(|m| m.gaia_dr3_id)
        .filter(|id| seen.insert(*id))
        .collect()
}

/// Read `name` from the cache directory, or fetch and store it there.
fn cached<T>(
    cache_dir: Option<&Path>,
    name: &str,
    read: fn(&Path) -> Result<Ingested<T>, AppError>,
    write: fn(&Path, &[T]) -> Result<(), AppError>,
    fetch: impl FnOnce() -> Result<Ingested<T>, AppError>,
) -> Result<Ingested<T>, AppError> {
    let path: Option<PathBuf> = cache_dir.map(|d| d.join(name));
    if let Some(path) = path.as_ref().filter(|p| p.exists()) {
        info!(path = %path.display(), "using cached table");
        return read(path);
    }
    let fetched = fetch()?;
    if let Some(path) = &path {
        write(path, &fetched.rows)?;
        info!(path = %path.display(), rows = fetched.rows.len(), "cached table");
    }
    Ok(fetched)
}

fn log_row_errors(source: &str, errors: &[RowError]) {
    if errors.is_empty() {
        return;
    }
    warn!(source, count = errors.len(), "skipped unparseable rows");
    for e in errors.iter().take(MAX_LOGGED_ROW_ERRORS) {
        warn!(source, line = e.line, id = e.id.as_deref().unwrap_or("-"), "{}", e.message);
    }
}
