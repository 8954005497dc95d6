//! CSV ingest for the raw catalogs and the cleaned catalog.
//!
//! This module turns heterogeneous catalog exports into typed records:
//!
//! - NEA stellar-hosts export (`#` comment preamble, quoted strings)
//! - TIC -> Gaia DR3 cross-reference table
//! - Gaia DR3 astrophysical parameters table
//! - the cleaned catalog written by `stellar prepare`
//!
//! Design goals:
//! - **Strict schema** for required columns (clear errors + exit code 2)
//! - **Row-level tolerance**: missing or unparseable values become `None`;
//!   broken CSV rows are reported, not fatal
//! - **No cleaning logic here**: filtering and unit conversion live in `prep`

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::StringRecord;
use tracing::debug;

use crate::domain::{CrossMatch, GaiaStar, NeaRecord, PartialFeatures, Star};
use crate::error::AppError;

/// NEA columns that must be present in the header.
pub const NEA_COLUMNS: [&str; 9] = [
    "tic_id",
    "st_refname",
    "st_spectype",
    "st_metratio",
    "st_mass",
    "st_lum",
    "st_met",
    "st_teff",
    "st_rad",
];

/// Gaia astrophysical-parameter columns that must be present in the header.
pub const GAIA_COLUMNS: [&str; 8] = [
    "source_id",
    "mass_flame",
    "lum_flame",
    "mh_gspphot",
    "teff_gspphot",
    "radius_gspphot",
    "spectraltype_esphs",
    "evolstage_flame",
];

/// A row-level error encountered during ingest.
#[derive(Debug, Clone, PartialEq)]
pub struct RowError {
    pub line: usize,
    pub id: Option<String>,
    pub message: String,
}

/// Ingest output: parsed rows + row errors.
#[derive(Debug, Clone)]
pub struct Ingested<T> {
    pub rows: Vec<T>,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
}

pub fn read_nea_csv(path: &Path) -> Result<Ingested<NeaRecord>, AppError> {
    let file = open(path, "NEA CSV")?;
    parse_nea(file)
}

pub fn read_crossref_csv(path: &Path) -> Result<Ingested<CrossMatch>, AppError> {
    let file = open(path, "cross-reference CSV")?;
    parse_crossref(file)
}

pub fn read_gaia_csv(path: &Path) -> Result<Ingested<GaiaStar>, AppError> {
    let file = open(path, "Gaia CSV")?;
    parse_gaia(file)
}

/// Parse the NEA stellar-hosts table.
pub fn parse_nea<R: Read>(input: R) -> Result<Ingested<NeaRecord>, AppError> {
    parse_table(input, "NEA", &NEA_COLUMNS, |record, header_map| {
        Ok(NeaRecord {
            tic_id: get_optional(record, header_map, "tic_id").map(str::to_string),
            refname: get_optional(record, header_map, "st_refname").map(str::to_string),
            spectype: get_optional(record, header_map, "st_spectype").map(str::to_string),
            metratio: get_optional(record, header_map, "st_metratio").map(str::to_string),
            mass: parse_opt_f64(get_optional(record, header_map, "st_mass")),
            lum: parse_opt_f64(get_optional(record, header_map, "st_lum")),
            met: parse_opt_f64(get_optional(record, header_map, "st_met")),
            teff: parse_opt_f64(get_optional(record, header_map, "st_teff")),
            rad: parse_opt_f64(get_optional(record, header_map, "st_rad")),
        })
    })
}

/// Parse a TIC -> Gaia DR3 cross-reference table.
///
/// Stars without a Gaia counterpart are skipped silently; they cannot take part
/// in the join anyway.
pub fn parse_crossref<R: Read>(input: R) -> Result<Ingested<CrossMatch>, AppError> {
    let parsed = parse_table(input, "cross-reference", &["tic_id", "gaia_dr3_id"], |record, header_map| {
        let tic_raw = get_required(record, header_map, "tic_id")?;
        let tic_id = parse_id(tic_raw).ok_or_else(|| format!("Invalid `tic_id` '{tic_raw}'."))?;
        Ok(parse_id(get_optional(record, header_map, "gaia_dr3_id").unwrap_or_default())
            .map(|gaia_dr3_id| CrossMatch { tic_id, gaia_dr3_id }))
    })?;

    Ok(Ingested {
        rows: parsed.rows.into_iter().flatten().collect(),
        row_errors: parsed.row_errors,
        rows_read: parsed.rows_read,
    })
}

/// Parse a Gaia DR3 astrophysical-parameters table (published units).
pub fn parse_gaia<R: Read>(input: R) -> Result<Ingested<GaiaStar>, AppError> {
    parse_table(input, "Gaia", &GAIA_COLUMNS, |record, header_map| {
        let raw = get_required(record, header_map, "source_id")?;
        let source_id = parse_id(raw).ok_or_else(|| format!("Invalid `source_id` '{raw}'."))?;
        Ok(GaiaStar {
            source_id,
            features: PartialFeatures {
                mass: parse_opt_f64(get_optional(record, header_map, "mass_flame")),
                luminosity: parse_opt_f64(get_optional(record, header_map, "lum_flame")),
                teff: parse_opt_f64(get_optional(record, header_map, "teff_gspphot")),
                radius: parse_opt_f64(get_optional(record, header_map, "radius_gspphot")),
                metallicity: parse_opt_f64(get_optional(record, header_map, "mh_gspphot")),
            },
            spectype: get_optional(record, header_map, "spectraltype_esphs").map(str::to_string),
            evolstage: parse_opt_f64(get_optional(record, header_map, "evolstage_flame")),
        })
    })
}

/// Read the cleaned catalog (`tic_id,gaia_id,spectype,M,L,Teff,R,met`).
pub fn read_stars_csv(path: &Path) -> Result<Vec<Star>, AppError> {
    let file = open(path, "catalog CSV")?;
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .comment(Some(b'#'))
        .from_reader(file);

    let mut stars = Vec::new();
    for (idx, result) in reader.deserialize::<Star>().enumerate() {
        let star = result.map_err(|e| {
            AppError::input(format!(
                "Invalid row {} in catalog '{}': {e}",
                idx + 2,
                path.display()
            ))
        })?;
        stars.push(star);
    }
    Ok(stars)
}

fn open(path: &Path, what: &str) -> Result<File, AppError> {
    File::open(path).map_err(|e| AppError::input(format!("Failed to open {what} '{}': {e}", path.display())))
}

fn parse_table<R, T, F>(input: R, what: &str, required: &[&str], mut parse_row: F) -> Result<Ingested<T>, AppError>
where
    R: Read,
    F: FnMut(&StringRecord, &HashMap<String, usize>) -> Result<T, String>,
{
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .comment(Some(b'#'))
        .from_reader(input);

    let headers = reader
        .headers()
        .map_err(|e| AppError::input(format!("Failed to read {what} CSV headers: {e}")))?
        .clone();
    let header_map = build_header_map(&headers);

    for column in required {
        if !header_map.contains_key(*column) {
            return Err(AppError::input(format!("Missing required {what} column: `{column}`")));
        }
    }

    let mut rows = Vec::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;

    for (idx, result) in reader.records().enumerate() {
        rows_read += 1;
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                row_errors.push(RowError {
                    line: e.position().map(|p| p.line() as usize).unwrap_or(idx + 2),
                    id: None,
                    message: format!("CSV parse error: {e}"),
                });
                continue;
            }
        };

        match parse_row(&record, &header_map) {
            Ok(row) => rows.push(row),
            Err(message) => row_errors.push(RowError {
                line: record.position().map(|p| p.line() as usize).unwrap_or(idx + 2),
                id: record.get(0).map(str::to_string),
                message,
            }),
        }
    }

    debug!(table = what, rows_read, rows = rows.len(), errors = row_errors.len(), "ingested table");

    Ok(Ingested {
        rows,
        row_errors,
        rows_read,
    })
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet tools sometimes emit UTF-8 CSVs with a BOM prefix on the
    // first header. If we don't strip it, schema validation will incorrectly
    // report missing columns.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn get_required<'a>(
    record: &'a StringRecord,
    header_map: &HashMap<String, usize>,
    name: &str,
) -> Result<&'a str, String> {
    get_optional(record, header_map, name).ok_or_else(|| format!("Missing required value: `{name}`"))
}

fn get_optional<'a>(record: &'a StringRecord, header_map: &HashMap<String, usize>, name: &str) -> Option<&'a str> {
    let idx = header_map.get(name)?;
    record
        .get(*idx)
        .map(str::trim)
        .filter(|s| !s.is_empty() && !is_null_token(s))
}

fn is_null_token(s: &str) -> bool {
    matches!(s.to_ascii_lowercase().as_str(), "nan" | "null" | "none" | "--")
}

fn parse_opt_f64(s: Option<&str>) -> Option<f64> {
    let s = s?;
    let v = s.parse::<f64>().ok()?;
    if v.is_finite() { Some(v) } else { None }
}

/// Parse a catalog identifier; tolerates a trailing `.0` from float-typed exports.
fn parse_id(s: &str) -> Option<u64> {
    let s = s.trim();
    let s = s.strip_suffix(".0").unwrap_or(s);
    s.parse::<u64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const NEA: &str = "\
# This file was produced by the NASA Exoplanet Archive
# COLUMN tic_id: TIC ID
tic_id,st_refname,st_spectype,st_metratio,st_mass,st_lum,st_met,st_teff,st_rad
TIC 100,TICv8,G2 V,[Fe/H],1.0,0.0,0.01,5772,1.0
TIC 200,Smith et al. 2019,K1 V,[Fe/H],,-0.3,-0.1,5000,0.8
";

    #[test]
    fn nea_skips_comment_preamble_and_keeps_nulls() {
        let out = parse_nea(NEA.as_bytes()).unwrap();
        assert_eq!(out.rows_read, 2);
        assert_eq!(out.rows.len(), 2);
        assert_eq!(out.rows[0].tic_id.as_deref(), Some("TIC 100"));
        assert_eq!(out.rows[0].teff, Some(5772.0));
        assert_eq!(out.rows[1].mass, None);
        assert_eq!(out.rows[1].refname.as_deref(), Some("Smith et al. 2019"));
    }

    #[test]
    fn nea_requires_schema() {
        let err = parse_nea("tic_id,st_mass\nTIC 1,1.0\n".as_bytes()).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().contains("st_refname"));
    }

    #[test]
    fn crossref_skips_missing_gaia_ids() {
        let csv = "tic_id,gaia_dr3_id\n100,5000000000000000001\n200,\n300,42.0\n";
        let out = parse_crossref(csv.as_bytes()).unwrap();
        assert_eq!(
            out.rows,
            vec![
                CrossMatch { tic_id: 100, gaia_dr3_id: 5000000000000000001 },
                CrossMatch { tic_id: 300, gaia_dr3_id: 42 },
            ]
        );
    }

    #[test]
    fn gaia_handles_bom_case_and_nan() {
        let csv = "\u{feff}SOURCE_ID,mass_flame,lum_flame,mh_gspphot,teff_gspphot,radius_gspphot,spectraltype_esphs,evolstage_flame\n\
                   7,1.1,1.3,NaN,5900,1.05,G,250\n\
                   x,1,1,0,1,1,G,1\n";
        let out = parse_gaia(csv.as_bytes()).unwrap();
        assert_eq!(out.rows.len(), 1);
        assert_eq!(out.rows[0].source_id, 7);
        assert_eq!(out.rows[0].features.metallicity, None);
        assert_eq!(out.rows[0].spectype.as_deref(), Some("G"));
        assert_eq!(out.row_errors.len(), 1);
        assert_eq!(out.row_errors[0].line, 3);
    }

    #[test]
    fn stars_csv_reads_catalog_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("joined.csv");
        std::fs::write(
            &path,
            "tic_id,gaia_id,spectype,M,L,Teff,R,met\nTIC 1,9,G,30.3,26.58,5772,1.0,-4.54\n",
        )
        .unwrap();
        let stars = read_stars_csv(&path).unwrap();
        assert_eq!(stars.len(), 1);
        assert_eq!(stars[0].gaia_id, 9);
        assert_eq!(stars[0].metallicity, -4.54);
    }
}
