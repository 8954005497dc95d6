//! Gaia DR3 astrophysical-parameters cleaning.
//!
//! FLAME mass and luminosity are published in solar units and GSP-Phot `[M/H]`
//! in dex; they are converted to model units. Temperature, radius, spectral
//! class and evolutionary stage pass through unchanged.

use std::collections::HashSet;

use tracing::debug;

use crate::domain::{GaiaStar, PartialFeatures};
use crate::math::units::{feh_dex_to_log_fraction, solar_lum_to_log_watts, solar_mass_to_log_kg};

/// Convert published Gaia values to model units.
///
/// Duplicate `source_id`s keep their first row. Non-positive masses or
/// luminosities become missing values.
pub fn process(stars: Vec<GaiaStar>) -> Vec<GaiaStar> {
    let total = stars.len();
    let mut seen = HashSet::new();

    let out: Vec<GaiaStar> = stars
        .into_iter()
        .filter(|s| seen.insert(s.source_id))
        .map(convert)
        .collect();

    if out.len() != total {
        debug!(dropped = total - out.len(), "duplicate Gaia source ids");
    }
    out
}

fn convert(star: GaiaStar) -> GaiaStar {
    let published = star.features;
    GaiaStar {
        features: PartialFeatures {
            mass: published.mass.and_then(solar_mass_to_log_kg),
            luminosity: published.luminosity.and_then(solar_lum_to_log_watts),
            metallicity: published.metallicity.map(feh_dex_to_log_fraction),
            teff: published.teff,
            radius: published.radius,
        },
        ..star
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::units::{L_SUN_W, M_SUN_KG};

    fn star(id: u64, mass: Option<f64>, lum: Option<f64>) -> GaiaStar {
        GaiaStar {
            source_id: id,
            features: PartialFeatures {
                mass,
                luminosity: lum,
                teff: Some(5800.0),
                radius: Some(1.0),
                metallicity: Some(0.2),
            },
            spectype: Some("G".to_string()),
            evolstage: Some(200.0),
        }
    }

    #[test]
    fn converts_flame_and_gspphot_values() {
        let out = process(vec![star(1, Some(2.0), Some(10.0))]);
        let f = out[0].features;
        assert!((f.mass.unwrap() - (2.0 * M_SUN_KG).log10()).abs() < 1e-12);
        assert!((f.luminosity.unwrap() - (10.0 * L_SUN_W).log10()).abs() < 1e-12);
        assert!((f.metallicity.unwrap() - (7.46 - 12.0 + 0.2)).abs() < 1e-12);
        assert_eq!(f.teff, Some(5800.0));
        assert_eq!(out[0].evolstage, Some(200.0));
    }

    #[test]
    fn non_positive_values_become_missing() {
        let out = process(vec![star(1, Some(0.0), Some(-1.0)), star(2, None, Some(1.0))]);
        assert_eq!(out[0].features.mass, None);
        assert_eq!(out[0].features.luminosity, None);
        assert_eq!(out[1].features.mass, None);
        assert!(out[1].features.luminosity.is_some());
    }

    #[test]
    fn duplicate_source_ids_keep_first() {
        let out = process(vec![star(5, Some(1.0), Some(1.0)), star(5, Some(3.0), Some(1.0))]);
        assert_eq!(out.len(), 1);
        assert!((out[0].features.mass.unwrap() - M_SUN_KG.log10()).abs() < 1e-12);
    }
}
