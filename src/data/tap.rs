//! IVOA TAP access to the TIC (MAST) and Gaia DR3 (ESA) catalogs.
//!
//! Queries run synchronously (`/sync`, `REQUEST=doQuery`, `LANG=ADQL`,
//! `FORMAT=csv`) and the CSV bodies go through the regular ingest parsers.

use std::time::Duration;

use reqwest::blocking::Client;
use tracing::{debug, info};

use crate::domain::{CrossMatch, GaiaStar};
use crate::error::AppError;
use crate::io::ingest::{parse_crossref, parse_gaia, Ingested, GAIA_COLUMNS};

pub const DEFAULT_TIC_TAP_URL: &str = "https://mast.stsci.edu/vo-tap/api/v0.1/tic/sync";
pub const DEFAULT_GAIA_TAP_URL: &str = "https://gea.esac.esa.int/tap-server/tap/sync";
pub const DEFAULT_BATCH_SIZE: usize = 500;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// Endpoints and batching for TAP queries.
#[derive(Debug, Clone, PartialEq)]
pub struct TapConfig {
    pub tic_url: String,
    pub gaia_url: String,
    pub batch_size: usize,
}

impl Default for TapConfig {
    fn default() -> Self {
        Self {
            tic_url: DEFAULT_TIC_TAP_URL.to_string(),
            gaia_url: DEFAULT_GAIA_TAP_URL.to_string(),
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

impl TapConfig {
    /// Read `STELLAR_TIC_TAP_URL`, `STELLAR_GAIA_TAP_URL` and
    /// `STELLAR_TAP_BATCH` (after loading `.env`).
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let mut config = TapConfig::default();
        if let Some(url) = lookup("STELLAR_TIC_TAP_URL").filter(|s| !s.trim().is_empty()) {
            config.tic_url = url.trim().to_string();
        }
        if let Some(url) = lookup("STELLAR_GAIA_TAP_URL").filter(|s| !s.trim().is_empty()) {
            config.gaia_url = url.trim().to_string();
        }
        if let Some(raw) = lookup("STELLAR_TAP_BATCH") {
            config.batch_size = raw
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| AppError::input(format!("Invalid STELLAR_TAP_BATCH '{raw}': expected a positive integer.")))?;
        }
        Ok(config)
    }
}

pub struct TapClient {
    client: Client,
    config: TapConfig,
}

impl TapClient {
    pub fn from_env() -> Result<Self, AppError> {
        Self::new(TapConfig::from_env()?)
    }

    pub fn new(config: TapConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| AppError::runtime(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &TapConfig {
        &self.config
    }

    /// Resolve TIC ids to Gaia DR3 source ids.
    pub fn fetch_crossmatch(&self, tic_ids: &[u64]) -> Result<Ingested<CrossMatch>, AppError> {
        info!(ids = tic_ids.len(), url = %self.config.tic_url, "querying TIC for Gaia DR3 ids");
        self.fetch_batched(&self.config.tic_url, tic_ids, crossmatch_query, |body| parse_crossref(body))
    }

    /// Fetch astrophysical parameters for Gaia DR3 source ids (published units).
    pub fn fetch_gaia(&self, source_ids: &[u64]) -> Result<Ingested<GaiaStar>, AppError> {
        info!(ids = source_ids.len(), url = %self.config.gaia_url, "querying Gaia DR3 astrophysical parameters");
        self.fetch_batched(&self.config.gaia_url, source_ids, gaia_query, |body| parse_gaia(body))
    }

    fn fetch_batched<T>(
        &self,
        url: &str,
        ids: &[u64],
        build_query: fn(&[u64]) -> String,
        parse: impl Fn(&[u8]) -> Result<Ingested<T>, AppError>,
    ) -> Result<Ingested<T>, AppError> {
        let mut out = Ingested {
            rows: Vec::new(),
            row_errors: Vec::new(),
            rows_read: 0,
        };

        for (n, batch) in ids.chunks(self.config.batch_size.max(1)).enumerate() {
            let body = self.query_csv(url, &build_query(batch))?;
            let parsed = parse(body.as_bytes())?;
            debug!(batch = n, ids = batch.len(), rows = parsed.rows.len(), "TAP batch done");
            out.rows_read += parsed.rows_read;
            out.rows.extend(parsed.rows);
            out.row_errors.extend(parsed.row_errors);
        }

        Ok(out)
    }

    /// Run one synchronous ADQL query and return the CSV body.
    pub fn query_csv(&self, url: &str, adql: &str) -> Result<String, AppError> {
        let resp = self
            .client
            .post(url)
            .form(&[
                ("REQUEST", "doQuery"),
                ("LANG", "ADQL"),
                ("FORMAT", "csv"),
                ("QUERY", adql),
            ])
            .send()
            .map_err(|e| AppError::runtime(format!("TAP request to {url} failed: {e}")))?;

        let status = resp.status();
        let body = resp
            .text()
            .map_err(|e| AppError::runtime(format!("Failed to read TAP response from {url}: {e}")))?;

        if !status.is_success() {
            return Err(AppError::runtime(format!(
                "TAP request to {url} failed with status {status}: {}",
                body.chars().take(300).collect::<String>()
            )));
        }
        Ok(body)
    }
}

pub fn crossmatch_query(tic_ids: &[u64]) -> String {
    format!(
        "SELECT id AS tic_id, gaia AS gaia_dr3_id FROM dbo.catalogrecord WHERE id IN ({})",
        id_list(tic_ids)
    )
}

pub fn gaia_query(source_ids: &[u64]) -> String {
    format!(
        "SELECT {} FROM gaiadr3.astrophysical_parameters WHERE source_id IN ({})",
        GAIA_COLUMNS.join(", "),
        id_list(source_ids)
    )
}

fn id_list(ids: &[u64]) -> String {
    ids.iter().map(u64::to_string).collect::<Vec<_>>().join(", ")
}
