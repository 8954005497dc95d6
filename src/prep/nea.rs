//! NEA stellar-hosts cleaning.
//!
//! Steps, in order:
//! 1. keep main-sequence hosts (`st_spectype` contains `" V"`)
//! 2. drop rows with any missing value
//! 3. one row per TIC id, chosen by source priority
//! 4. keep `[Fe/H]` metallicities only
//! 5. convert to model units

use std::collections::HashMap;

use tracing::debug;

use crate::domain::{Features, NeaRecord, NeaStar};
use crate::math::units::{feh_dex_to_log_fraction, log_solar_lum_to_log_watts, solar_mass_to_log_kg};

/// Row counts after each NEA cleaning step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NeaStats {
    pub read: usize,
    pub main_sequence: usize,
    pub complete: usize,
    pub deduplicated: usize,
    pub feh: usize,
    pub converted: usize,
}

#[derive(Debug, Clone)]
pub struct NeaOutput {
    pub stars: Vec<NeaStar>,
    pub stats: NeaStats,
}

/// A row that survived the null check; every field is present.
struct CompleteRow<'a> {
    tic_id: &'a str,
    refname: &'a str,
    spectype: &'a str,
    metratio: &'a str,
    mass: f64,
    lum: f64,
    met: f64,
    teff: f64,
    rad: f64,
}

impl<'a> CompleteRow<'a> {
    fn from_record(r: &'a NeaRecord) -> Option<Self> {
        Some(CompleteRow {
            tic_id: r.tic_id.as_deref()?,
            refname: r.refname.as_deref()?,
            spectype: r.spectype.as_deref()?,
            metratio: r.metratio.as_deref()?,
            mass: r.mass?,
            lum: r.lum?,
            met: r.met?,
            teff: r.teff?,
            rad: r.rad?,
        })
    }
}

pub fn process(records: &[NeaRecord]) -> NeaOutput {
    let mut stats = NeaStats {
        read: records.len(),
        ..NeaStats::default()
    };

    let main_sequence: Vec<&NeaRecord> = records
        .iter()
        .filter(|r| r.spectype.as_deref().is_some_and(is_main_sequence))
        .collect();
    stats.main_sequence = main_sequence.len();

    let complete: Vec<CompleteRow> = main_sequence
        .into_iter()
        .filter_map(CompleteRow::from_record)
        .collect();
    stats.complete = complete.len();

    let deduplicated = dedupe_by_priority(complete);
    stats.deduplicated = deduplicated.len();

    let feh: Vec<CompleteRow> = deduplicated
        .into_iter()
        .filter(|r| r.metratio == "[Fe/H]")
        .collect();
    stats.feh = feh.len();

    let stars: Vec<NeaStar> = feh.into_iter().filter_map(convert).collect();
    stats.converted = stars.len();

    debug!(?stats, "NEA cleaned");
    NeaOutput { stars, stats }
}

fn is_main_sequence(spectype: &str) -> bool {
    spectype.contains(" V")
}

/// Keep the highest-priority row per TIC id. Ties keep the earliest row;
/// output follows first appearance of each TIC id.
fn dedupe_by_priority(rows: Vec<CompleteRow<'_>>) -> Vec<CompleteRow<'_>> {
    let mut slot_by_tic: HashMap<&str, usize> = HashMap::new();
    let mut kept: Vec<(f64, CompleteRow)> = Vec::new();

    for row in rows {
        let p = source_priority(row.refname);
        match slot_by_tic.get(row.tic_id) {
            Some(&slot) => {
                if p > kept[slot].0 {
                    kept[slot] = (p, row);
                }
            }
            None => {
                slot_by_tic.insert(row.tic_id, kept.len());
                kept.push((p, row));
            }
        }
    }

    kept.into_iter().map(|(_, row)| row).collect()
}

/// Source priority of an NEA reference: the most recent comprehensive survey
/// beats an older one, which beats individual papers (newer papers first).
///
/// - `TICv8...` -> 3
/// - `Gaia DR2...` -> 2
/// - otherwise `1 + year / 1e5`, `year` being the first digit run (1 if none)
pub fn source_priority(refname: &str) -> f64 {
    let name = anchor_text(refname);
    if name.starts_with("TICv8") {
        3.0
    } else if name.starts_with("Gaia DR2") {
        2.0
    } else {
        let year = first_digit_run(name).and_then(|d| d.parse::<f64>().ok()).unwrap_or(0.0);
        1.0 + year / 1e5
    }
}

/// Text of an HTML anchor (`<a href=...>Text</a>`); other input is returned trimmed.
pub fn anchor_text(refname: &str) -> &str {
    let trimmed = refname.trim();
    if !trimmed.starts_with("<a") {
        return trimmed;
    }
    let Some(open_end) = trimmed.find('>') else {
        return trimmed;
    };
    let inner = &trimmed[open_end + 1..];
    inner.find("</a>").map_or(inner, |close| &inner[..close]).trim()
}

/// Numeric part of a TIC id (`"TIC 142748283"` -> `142748283`).
pub fn tic_number(tic_id: &str) -> Option<u64> {
    first_digit_run(tic_id)?.parse().ok()
}

fn first_digit_run(s: &str) -> Option<&str> {
    let start = s.find(|c: char| c.is_ascii_digit())?;
    let rest = &s[start..];
    let end = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
    Some(&rest[..end])
}

fn convert(row: CompleteRow<'_>) -> Option<NeaStar> {
    let Some(mass) = solar_mass_to_log_kg(row.mass) else {
        debug!(tic_id = row.tic_id, mass = row.mass, "dropping NEA row with non-positive mass");
        return None;
    };
    let features = Features {
        mass,
        luminosity: log_solar_lum_to_log_watts(row.lum),
        teff: row.teff,
        radius: row.rad,
        metallicity: feh_dex_to_log_fraction(row.met),
    };
    if !features.all_finite() {
        return None;
    }

    Some(NeaStar {
        tic_id: row.tic_id.to_string(),
        tic_number: tic_number(row.tic_id),
        refname: row.refname.to_string(),
        spectype: row.spectype.to_string(),
        features,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::units::L_SUN_W;

    fn record(tic: &str, refname: &str, spectype: &str, mass: f64) -> NeaRecord {
        NeaRecord {
            tic_id: Some(tic.to_string()),
            refname: Some(refname.to_string()),
            spectype: Some(spectype.to_string()),
            metratio: Some("[Fe/H]".to_string()),
            mass: Some(mass),
            lum: Some(0.0),
            met: Some(0.0),
            teff: Some(5772.0),
            rad: Some(1.0),
        }
    }

    #[test]
    fn priority_orders_surveys_then_years() {
        assert_eq!(source_priority("TICv8"), 3.0);
        assert_eq!(source_priority("Gaia DR2"), 2.0);
        assert!((source_priority("Smith et al. 2019") - 1.02019).abs() < 1e-12);
        assert!(source_priority("Smith et al. 2021") > source_priority("Smith et al. 2019"));
        assert_eq!(source_priority("Unpublished"), 1.0);
        assert_eq!(
            source_priority("<a refstr=STASSUN_ET_AL__2019 href=https://ui.adsabs.harvard.edu target=ref>TICv8</a>"),
            3.0
        );
    }

    #[test]
    fn anchor_text_unwraps_links() {
        assert_eq!(anchor_text("<a href=x>Gaia DR2</a>"), "Gaia DR2");
        assert_eq!(anchor_text("  Plain 2010 "), "Plain 2010");
    }

    #[test]
    fn tic_number_extracts_first_digits() {
        assert_eq!(tic_number("TIC 142748283"), Some(142748283));
        assert_eq!(tic_number("TIC"), None);
    }

    #[test]
    fn dedup_keeps_highest_priority_source() {
        let records = vec![
            record("TIC 1", "Smith et al. 2019", "G2 V", 1.1),
            record("TIC 1", "TICv8", "G2 V", 1.0),
            record("TIC 1", "Gaia DR2", "G2 V", 0.9),
            record("TIC 2", "Jones 2015", "K1 V", 0.8),
            record("TIC 2", "Jones 2018", "K1 V", 0.7),
        ];
        let out = process(&records);

        assert_eq!(out.stars.len(), 2);
        assert_eq!(out.stars[0].tic_id, "TIC 1");
        assert_eq!(out.stars[0].refname, "TICv8");
        assert_eq!(out.stars[1].refname, "Jones 2018");
        assert_eq!(out.stars[1].tic_number, Some(2));
    }

    #[test]
    fn ties_keep_earliest_row() {
        let records = vec![
            record("TIC 9", "Paper A 2020", "G2 V", 1.0),
            record("TIC 9", "Paper B 2020", "G2 V", 2.0),
        ];
        let out = process(&records);
        assert_eq!(out.stars.len(), 1);
        assert_eq!(out.stars[0].refname, "Paper A 2020");
    }

    #[test]
    fn filters_giants_nulls_and_other_metallicity_ratios() {
        let mut missing_teff = record("TIC 3", "TICv8", "G2 V", 1.0);
        missing_teff.teff = None;
        let mut m_over_h = record("TIC 4", "TICv8", "G2 V", 1.0);
        m_over_h.metratio = Some("[M/H]".to_string());
        let records = vec![
            record("TIC 1", "TICv8", "K0 III", 1.0),
            record("TIC 2", "TICv8", "G8 IV", 1.0),
            missing_teff,
            m_over_h,
            record("TIC 5", "TICv8", "G2 V", 1.0),
        ];

        let out = process(&records);
        assert_eq!(
            out.stats,
            NeaStats {
                read: 5,
                main_sequence: 3,
                complete: 2,
                deduplicated: 2,
                feh: 1,
                converted: 1,
            }
        );
        assert_eq!(out.stars[0].tic_id, "TIC 5");
    }

    #[test]
    fn converts_to_model_units() {
        let out = process(&[record("TIC 1", "TICv8", "G2 V", 1.0)]);
        let f = out.stars[0].features;
        assert!((f.mass - 1.988409870698051e30f64.log10()).abs() < 1e-12);
        assert!((f.luminosity - L_SUN_W.log10()).abs() < 1e-12);
        assert!((f.metallicity - (7.46 - 12.0)).abs() < 1e-12);
        assert_eq!(f.teff, 5772.0);
    }
}
