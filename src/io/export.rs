//! CSV exports: the cleaned catalog and the per-source intermediate tables.
//!
//! Exports are meant to be easy to consume in spreadsheets or downstream
//! scripts, and the cleaned catalog is read back by `train`, `eda`, and `serve`.

use std::fs::{create_dir_all, File};
use std::path::Path;

use serde::Serialize;

use crate::domain::{CrossMatch, GaiaStar, NeaStar, Star};
use crate::error::AppError;

/// Write the cleaned catalog (`tic_id,gaia_id,spectype,M,L,Teff,R,met`).
pub fn write_stars_csv(path: &Path, stars: &[Star]) -> Result<(), AppError> {
    write_rows(path, stars.iter())
}

#[derive(Serialize)]
struct NeaRow<'a> {
    tic_id: &'a str,
    spectype: &'a str,
    #[serde(rename = "M")]
    mass: f64,
    #[serde(rename = "L")]
    luminosity: f64,
    #[serde(rename = "Teff")]
    teff: f64,
    #[serde(rename = "R")]
    radius: f64,
    met: f64,
}

/// Write cleaned NEA stars (converted units).
pub fn write_nea_csv(path: &Path, stars: &[NeaStar]) -> Result<(), AppError> {
    write_rows(
        path,
        stars.iter().map(|s| NeaRow {
            tic_id: &s.tic_id,
            spectype: &s.spectype,
            mass: s.features.mass,
            luminosity: s.features.luminosity,
            teff: s.features.teff,
            radius: s.features.radius,
            met: s.features.metallicity,
        }),
    )
}

#[derive(Serialize)]
struct GaiaRow<'a> {
    source_id: u64,
    #[serde(rename = "M")]
    mass: Option<f64>,
    #[serde(rename = "L")]
    luminosity: Option<f64>,
    #[serde(rename = "Teff")]
    teff: Option<f64>,
    #[serde(rename = "R")]
    radius: Option<f64>,
    met: Option<f64>,
    spectype: Option<&'a str>,
    evolstage_flame: Option<f64>,
}

/// Write cleaned Gaia stars (converted units, blanks for missing values).
pub fn write_gaia_csv(path: &Path, stars: &[GaiaStar]) -> Result<(), AppError> {
    write_rows(
        path,
        stars.iter().map(|s| GaiaRow {
            source_id: s.source_id,
            mass: s.features.mass,
            luminosity: s.features.luminosity,
            teff: s.features.teff,
            radius: s.features.radius,
            met: s.features.metallicity,
            spectype: s.spectype.as_deref(),
            evolstage_flame: s.evolstage,
        }),
    )
}

#[derive(Serialize)]
struct GaiaPublishedRow<'a> {
    source_id: u64,
    mass_flame: Option<f64>,
    lum_flame: Option<f64>,
    mh_gspphot: Option<f64>,
    teff_gspphot: Option<f64>,
    radius_gspphot: Option<f64>,
    spectraltype_esphs: Option<&'a str>,
    evolstage_flame: Option<f64>,
}

/// Write Gaia stars in the published schema (readable by `read_gaia_csv`).
/// Used to cache TAP results before unit conversion.
pub fn write_gaia_published_csv(path: &Path, stars: &[GaiaStar]) -> Result<(), AppError> {
    write_rows(
        path,
        stars.iter().map(|s| GaiaPublishedRow {
            source_id: s.source_id,
            mass_flame: s.features.mass,
            lum_flame: s.features.luminosity,
            mh_gspphot: s.features.metallicity,
            teff_gspphot: s.features.teff,
            radius_gspphot: s.features.radius,
            spectraltype_esphs: s.spectype.as_deref(),
            evolstage_flame: s.evolstage,
        }),
    )
}

/// Write a TIC -> Gaia cross-reference table (readable by `read_crossref_csv`).
pub fn write_crossref_csv(path: &Path, matches: &[CrossMatch]) -> Result<(), AppError> {
    write_rows(path, matches.iter())
}

fn write_rows<T: Serialize>(path: &Path, rows: impl Iterator<Item = T>) -> Result<(), AppError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        create_dir_all(parent)
            .map_err(|e| AppError::input(format!("Failed to create directory '{}': {e}", parent.display())))?;
    }

    let file = File::create(path)
        .map_err(|e| AppError::input(format!("Failed to create CSV '{}': {e}", path.display())))?;
    let mut writer = csv::Writer::from_writer(file);

    for row in rows {
        writer
            .serialize(row)
            .map_err(|e| AppError::input(format!("Failed to write CSV row to '{}': {e}", path.display())))?;
    }
    writer
        .flush()
        .map_err(|e| AppError::input(format!("Failed to flush CSV '{}': {e}", path.display())))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::ingest::{read_crossref_csv, read_stars_csv};

    #[test]
    fn catalog_written_is_catalog_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/out.csv");
        let stars = vec![Star {
            tic_id: "TIC 5".to_string(),
            gaia_id: 77,
            spectype: "K".to_string(),
            mass: 30.1,
            luminosity: 26.0,
            teff: 4800.0,
            radius: 0.7,
            metallicity: -4.6,
        }];

        write_stars_csv(&path, &stars).unwrap();

        let header = std::fs::read_to_string(&path).unwrap();
        assert!(header.starts_with("tic_id,gaia_id,spectype,M,L,Teff,R,met\n"));
        assert_eq!(read_stars_csv(&path).unwrap(), stars);
    }

    #[test]
    fn crossref_cache_is_readable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("xref.csv");
        let rows = vec![CrossMatch { tic_id: 1, gaia_dr3_id: 2 }];
        write_crossref_csv(&path, &rows).unwrap();
        assert_eq!(read_crossref_csv(&path).unwrap().rows, rows);
    }

    #[test]
    fn gaia_cache_keeps_missing_values() {
        use crate::domain::PartialFeatures;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gaia.csv");
        let stars = vec![GaiaStar {
            source_id: 42,
            features: PartialFeatures {
                mass: Some(1.02),
                luminosity: None,
                teff: Some(5800.0),
                radius: Some(1.1),
                metallicity: Some(-0.12),
            },
            spectype: Some("G".to_string()),
            evolstage: Some(220.0),
        }];
        write_gaia_published_csv(&path, &stars).unwrap();
        assert_eq!(crate::io::ingest::read_gaia_csv(&path).unwrap().rows, stars);
    }
}
