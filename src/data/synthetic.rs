//! Synthetic cleaned catalog for offline demos and tests.
//!
//! Stars follow textbook main-sequence scalings in solar units:
//! - `L ≈ M^4` (lognormal scatter)
//! - `R ≈ M^0.8` (lognormal scatter)
//! - `Teff = T_sun * (L / R^2)^(1/4)`
//! - `[Fe/H] ~ N(-0.05, 0.2)`, with a weak effect on luminosity
//!
//! Values are then converted to model units so the output is interchangeable
//! with the catalog written by `stellar prepare`.

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::domain::{Features, Star};
use crate::error::AppError;
use crate::math::units::{feh_dex_to_log_fraction, solar_lum_to_log_watts, solar_mass_to_log_kg};

const T_SUN_K: f64 = 5772.0;

/// Metallicity shifts luminosity by this many dex per dex of `[Fe/H]`
/// (metal-poor stars are bluer and brighter at fixed mass).
const FEH_LUM_SLOPE: f64 = -0.2;

#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticConfig {
    pub count: usize,
    pub seed: u64,
    /// Scatter of log10 L around the mass-luminosity relation (dex).
    pub lum_scatter_dex: f64,
    /// Mass range in solar masses (log-uniform).
    pub mass_min: f64,
    pub mass_max: f64,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            count: 400,
            seed: 1,
            lum_scatter_dex: 0.08,
            mass_min: 0.5,
            mass_max: 1.6,
        }
    }
}

pub fn generate_catalog(config: &SyntheticConfig) -> Result<Vec<Star>, AppError> {
    if config.count == 0 {
        return Err(AppError::input("Sample count must be > 0."));
    }
    if !(config.mass_min.is_finite() && config.mass_max.is_finite() && config.mass_min > 0.0 && config.mass_max > config.mass_min) {
        return Err(AppError::input("Invalid mass range for sample generation."));
    }
    if !(config.lum_scatter_dex.is_finite() && config.lum_scatter_dex >= 0.0) {
        return Err(AppError::input("Luminosity scatter must be finite and >= 0."));
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    let unit = Normal::new(0.0, 1.0).map_err(|e| AppError::runtime(format!("Noise distribution error: {e}")))?;

    let (log_m_min, log_m_max) = (config.mass_min.log10(), config.mass_max.log10());
    let mut stars = Vec::with_capacity(config.count);

    for i in 0..config.count {
        let log_m = rng.gen_range(log_m_min..=log_m_max);
        let feh = -0.05 + 0.2 * unit.sample(&mut rng);
        let log_l = 4.0 * log_m + FEH_LUM_SLOPE * feh + config.lum_scatter_dex * unit.sample(&mut rng);
        let log_r = 0.8 * log_m + 0.03 * unit.sample(&mut rng);

        let mass = 10f64.powf(log_m);
        let lum = 10f64.powf(log_l);
        let radius = 10f64.powf(log_r);
        let teff = T_SUN_K * (lum / (radius * radius)).powf(0.25);

        let (Some(mass_log_kg), Some(lum_log_w)) = (solar_mass_to_log_kg(mass), solar_lum_to_log_watts(lum)) else {
            continue;
        };

        stars.push(Star::new(
            format!("TIC {}", 100_000 + i),
            4_000_000_000_000_000_000 + i as u64,
            spectral_class(teff).to_string(),
            Features {
                mass: mass_log_kg,
                luminosity: lum_log_w,
                teff: teff.round(),
                radius: (radius * 1000.0).round() / 1000.0,
                metallicity: feh_dex_to_log_fraction(feh),
            },
        ));
    }

    Ok(stars)
}

/// Coarse Harvard class from effective temperature.
pub fn spectral_class(teff: f64) -> &'static str {
    match teff {
        t if t >= 30_000.0 => "O",
        t if t >= 10_000.0 => "B",
        t if t >= 7_500.0 => "A",
        t if t >= 6_000.0 => "F",
        t if t >= 5_200.0 => "G",
        t if t >= 3_700.0 => "K",
        _ => "M",
    }
}
