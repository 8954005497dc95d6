//! Cross-catalog join (NEA x Gaia DR3) and joined-set cleaning.

use std::collections::HashMap;
use std::ops::RangeInclusive;

use tracing::debug;

use crate::domain::{CrossMatch, GaiaStar, JoinedStar, NeaStar, PartialFeatures, Star};

/// FLAME evolutionary stages kept in the catalog (main sequence up to the
/// subgiant branch).
pub const EVOLSTAGE_WINDOW: RangeInclusive<f64> = 100.0..=360.0;

/// Row counts after each joined-set cleaning step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JoinStats {
    pub joined: usize,
    pub in_window: usize,
    pub complete: usize,
    /// Rows whose Gaia class is not `unknown`.
    pub known_spectype: usize,
}

/// Inner join on Gaia DR3 id.
///
/// NEA stars are mapped to a Gaia id through `crossref` (first match per TIC
/// id wins); stars without a numeric TIC id, a crossmatch, or a Gaia row are
/// dropped. Output follows NEA order.
pub fn join(nea: &[NeaStar], crossref: &[CrossMatch], gaia: &[GaiaStar]) -> Vec<JoinedStar> {
    let mut gaia_by_tic: HashMap<u64, u64> = HashMap::new();
    for m in crossref {
        gaia_by_tic.entry(m.tic_id).or_insert(m.gaia_dr3_id);
    }
    let mut gaia_by_id: HashMap<u64, &GaiaStar> = HashMap::new();
    for g in gaia {
        gaia_by_id.entry(g.source_id).or_insert(g);
    }

    let joined: Vec<JoinedStar> = nea
        .iter()
        .filter_map(|star| {
            let gaia_id = *gaia_by_tic.get(&star.tic_number?)?;
            let g = gaia_by_id.get(&gaia_id)?;
            Some(JoinedStar {
                tic_id: star.tic_id.clone(),
                gaia_id,
                nea: star.features,
                gaia: g.features,
                spectype_nea: star.spectype.clone(),
                spectype_gaia: g.spectype.clone(),
                evolstage: g.evolstage,
            })
        })
        .collect();

    debug!(nea = nea.len(), crossmatches = gaia_by_tic.len(), gaia = gaia.len(), joined = joined.len(), "joined catalogs");
    joined
}

/// Clean the joined set into final catalog rows.
///
/// 1. `evolstage_flame` within [`EVOLSTAGE_WINDOW`] (missing stage drops the row)
/// 2. per feature, the Gaia value when present, else the NEA value
/// 3. drop rows with any combined feature missing
/// 4. drop rows whose Gaia spectral class is `unknown`; a missing class is
///    kept as an empty `spectype`
pub fn clean_joined(joined: &[JoinedStar]) -> (Vec<Star>, JoinStats) {
    let mut stats = JoinStats {
        joined: joined.len(),
        ..JoinStats::default()
    };

    let in_window: Vec<&JoinedStar> = joined
        .iter()
        .filter(|j| j.evolstage.is_some_and(|e| EVOLSTAGE_WINDOW.contains(&e)))
        .collect();
    stats.in_window = in_window.len();

    let complete: Vec<_> = in_window
        .into_iter()
        .filter_map(|j| {
            let combined = j.gaia.combine_first(&PartialFeatures::from(j.nea)).complete()?;
            Some((j, combined))
        })
        .collect();
    stats.complete = complete.len();

    let stars: Vec<Star> = complete
        .into_iter()
        .filter_map(|(j, features)| {
            // No Gaia class is kept (empty `spectype`); only an explicit `unknown` is dropped.
            let spectype = j.spectype_gaia.as_deref().map(str::trim).unwrap_or_default();
            if is_unknown_spectype(spectype) {
                return None;
            }
            Some(Star::new(j.tic_id.clone(), j.gaia_id, spectype.to_string(), features))
        })
        .collect();
    stats.known_spectype = stars.len();

    debug!(?stats, "cleaned joined catalog");
    (stars, stats)
}

fn is_unknown_spectype(s: &str) -> bool {
    s.eq_ignore_ascii_case("unknown")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Features;

    fn nea_star(tic: u64, mass: f64) -> NeaStar {
        NeaStar {
            tic_id: format!("TIC {tic}"),
            tic_number: Some(tic),
            refname: "TICv8".to_string(),
            spectype: "G2 V".to_string(),
            features: Features {
                mass,
                luminosity: 26.5,
                teff: 5700.0,
                radius: 1.0,
                metallicity: -4.5,
            },
        }
    }

    fn gaia_star(id: u64, mass: Option<f64>, spectype: Option<&str>, evolstage: Option<f64>) -> GaiaStar {
        GaiaStar {
            source_id: id,
            features: PartialFeatures {
                mass,
                luminosity: Some(26.7),
                teff: None,
                radius: Some(1.1),
                metallicity: Some(-4.4),
            },
            spectype: spectype.map(str::to_string),
            evolstage,
        }
    }

    #[test]
    fn join_is_inner_on_gaia_id() {
        let mut no_tic = nea_star(3, 30.0);
        no_tic.tic_number = None;
        let nea = vec![nea_star(1, 30.0), nea_star(2, 30.0), no_tic];
        let crossref = vec![
            CrossMatch { tic_id: 1, gaia_dr3_id: 100 },
            CrossMatch { tic_id: 2, gaia_dr3_id: 200 },
            CrossMatch { tic_id: 3, gaia_dr3_id: 300 },
        ];
        let gaia = vec![
            gaia_star(100, Some(30.1), Some("G"), Some(200.0)),
            gaia_star(300, Some(30.1), Some("G"), Some(200.0)),
        ];

        let joined = join(&nea, &crossref, &gaia);
        assert_eq!(joined.len(), 1);
        assert_eq!(joined[0].tic_id, "TIC 1");
        assert_eq!(joined[0].gaia_id, 100);
    }

    #[test]
    fn clean_prefers_gaia_values_and_fills_from_nea() {
        let nea = vec![nea_star(1, 30.0), nea_star(2, 30.2)];
        let crossref = vec![
            CrossMatch { tic_id: 1, gaia_dr3_id: 100 },
            CrossMatch { tic_id: 2, gaia_dr3_id: 200 },
        ];
        let gaia = vec![
            gaia_star(100, Some(30.1), Some("G"), Some(200.0)),
            gaia_star(200, None, Some("K"), Some(150.0)),
        ];

        let (stars, stats) = clean_joined(&join(&nea, &crossref, &gaia));
        assert_eq!(stats.known_spectype, 2);

        assert_eq!(stars[0].mass, 30.1);
        assert_eq!(stars[0].luminosity, 26.7);
        assert_eq!(stars[0].teff, 5700.0);
        assert_eq!(stars[0].spectype, "G");

        assert_eq!(stars[1].mass, 30.2);
        assert_eq!(stars[1].gaia_id, 200);
    }

    #[test]
    fn clean_enforces_evolstage_window_and_spectype() {
        let nea: Vec<NeaStar> = (1..=7).map(|t| nea_star(t, 30.0)).collect();
        let crossref: Vec<CrossMatch> = (1..=7).map(|t| CrossMatch { tic_id: t, gaia_dr3_id: t * 10 }).collect();
        let gaia = vec![
            gaia_star(10, Some(30.0), Some("G"), Some(100.0)),
            gaia_star(20, Some(30.0), Some("G"), Some(360.0)),
            gaia_star(30, Some(30.0), Some("G"), Some(361.0)),
            gaia_star(40, Some(30.0), Some("G"), None),
            gaia_star(50, Some(30.0), Some("UNKNOWN"), Some(200.0)),
            gaia_star(60, Some(30.0), None, Some(99.9)),
            gaia_star(70, Some(30.0), Some("unknown"), Some(250.0)),
        ];

        let (stars, stats) = clean_joined(&join(&nea, &crossref, &gaia));
        assert_eq!(
            stats,
            JoinStats {
                joined: 7,
                in_window: 4,
                complete: 4,
                known_spectype: 2,
            }
        );
        let ids: Vec<u64> = stars.iter().map(|s| s.gaia_id).collect();
        assert_eq!(ids, vec![10, 20]);
    }

    #[test]
    fn clean_keeps_rows_without_gaia_class() {
        let nea = vec![nea_star(1, 30.0)];
        let crossref = vec![CrossMatch { tic_id: 1, gaia_dr3_id: 100 }];
        let gaia = vec![gaia_star(100, Some(30.1), None, Some(200.0))];

        let (stars, stats) = clean_joined(&join(&nea, &crossref, &gaia));
        assert_eq!(
            stats,
            JoinStats {
                joined: 1,
                in_window: 1,
                complete: 1,
                known_spectype: 1,
            }
        );
        assert_eq!(stars.len(), 1);
        assert_eq!(stars[0].spectype, "");
        assert_eq!(stars[0].mass, 30.1);
    }
}
