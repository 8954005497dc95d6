//! Unit conversions between published catalog units and model units.
//!
//! The catalogs publish solar units (and dex for abundances). The model works on
//! log10 SI values so that masses and luminosities spanning several orders of
//! magnitude become roughly linear in each other:
//!
//! - mass: `M / M_sun` -> `log10(kg)`
//! - luminosity: `L / L_sun` or `log10(L / L_sun)` -> `log10(W)`
//! - metallicity: `[Fe/H]` (dex) -> `log10(N_Fe / N_H)`
//!
//! Log-space values are computed additively (`log10(a) + x`) instead of forming
//! `a * 10^x`, which keeps tiny abundances away from underflow.

/// Nominal solar mass (kg), IAU 2015 / CODATA 2018.
pub const M_SUN_KG: f64 = 1.988409870698051e30;

/// Nominal solar luminosity (W), IAU 2015 Resolution B3.
pub const L_SUN_W: f64 = 3.828e26;

/// Solar photospheric iron abundance on the `log ε` scale (A(Fe) = 7.46,
/// Asplund et al. 2021). The Fe/H number fraction is `10^(7.46 - 12)`.
pub const SOLAR_LOG_EPS_FE: f64 = 7.46;

/// `log10((Fe/H)_sun)`.
pub fn solar_log_feh() -> f64 {
    SOLAR_LOG_EPS_FE - 12.0
}

/// Solar masses -> log10(kg). Non-positive input yields `None`.
pub fn solar_mass_to_log_kg(mass_sun: f64) -> Option<f64> {
    positive_log10(M_SUN_KG * mass_sun)
}

/// log10(kg) -> solar masses.
pub fn log_kg_to_solar_mass(log_kg: f64) -> f64 {
    10f64.powf(log_kg) / M_SUN_KG
}

/// Solar luminosities -> log10(W). Non-positive input yields `None`.
pub fn solar_lum_to_log_watts(lum_sun: f64) -> Option<f64> {
    positive_log10(L_SUN_W * lum_sun)
}

/// log10(L / L_sun) -> log10(W).
pub fn log_solar_lum_to_log_watts(log_lum_sun: f64) -> f64 {
    L_SUN_W.log10() + log_lum_sun
}

/// log10(W) -> solar luminosities.
pub fn log_watts_to_solar_lum(log_watts: f64) -> f64 {
    10f64.powf(log_watts) / L_SUN_W
}

/// `[Fe/H]` (dex, relative to the Sun) -> log10 of the absolute Fe/H number fraction.
pub fn feh_dex_to_log_fraction(feh: f64) -> f64 {
    solar_log_feh() + feh
}

fn positive_log10(v: f64) -> Option<f64> {
    if v.is_finite() && v > 0.0 {
        Some(v.log10())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sun_maps_to_nominal_constants() {
        let m = solar_mass_to_log_kg(1.0).unwrap();
        assert!((m - 30.298506).abs() < 1e-5, "got {m}");

        let l = solar_lum_to_log_watts(1.0).unwrap();
        assert!((l - 26.582972).abs() < 1e-5, "got {l}");
        assert!((log_solar_lum_to_log_watts(0.0) - l).abs() < 1e-12);
    }

    #[test]
    fn conversions_invert() {
        for &m in &[0.08, 0.5, 1.0, 2.06, 15.0] {
            let back = log_kg_to_solar_mass(solar_mass_to_log_kg(m).unwrap());
            assert!((back - m).abs() / m < 1e-12);
        }
        for &l in &[0.001567, 1.0, 24.7] {
            let back = log_watts_to_solar_lum(solar_lum_to_log_watts(l).unwrap());
            assert!((back - l).abs() / l < 1e-12);
        }
        for &feh in &[-1.2, 0.0, 0.35] {
            let back = feh_dex_to_log_fraction(feh) - solar_log_feh();
            assert!((back - feh).abs() < 1e-12);
        }
    }

    #[test]
    fn log_luminosity_matches_linear_path() {
        let log_lum_sun = 0.42;
        let via_log = log_solar_lum_to_log_watts(log_lum_sun);
        let via_linear = solar_lum_to_log_watts(10f64.powf(log_lum_sun)).unwrap();
        assert!((via_log - via_linear).abs() < 1e-12);
    }

    #[test]
    fn solar_metallicity_is_solar_fraction() {
        assert!((feh_dex_to_log_fraction(0.0) - (-4.54)).abs() < 1e-12);
    }

    #[test]
    fn non_positive_inputs_are_rejected() {
        assert!(solar_mass_to_log_kg(0.0).is_none());
        assert!(solar_mass_to_log_kg(-1.0).is_none());
        assert!(solar_lum_to_log_watts(f64::NAN).is_none());
    }
}
