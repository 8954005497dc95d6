//! Linear mass model: evaluation and the persisted artifact.
//!
//! The model predicts `M` (log10 kg) from named features (by default `L` in
//! log10 W and `met` in log10 Fe/H):
//!
//! ```text
//! M = intercept + Σ coefficient_j * feature_j
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::Feature;
use crate::error::AppError;
use crate::math::units::{feh_dex_to_log_fraction, log_kg_to_solar_mass, solar_lum_to_log_watts};

/// Fitted linear model parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    pub target: Feature,
    pub features: Vec<Feature>,
    pub intercept: f64,
    pub coefficients: Vec<f64>,
}

impl LinearModel {
    /// Evaluate on a feature row ordered like `self.features`.
    pub fn predict_row(&self, row: &[f64]) -> f64 {
        self.intercept
            + self
                .coefficients
                .iter()
                .zip(row)
                .map(|(c, x)| c * x)
                .sum::<f64>()
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.features.is_empty() || self.features.len() != self.coefficients.len() {
            return Err(AppError::input(format!(
                "Model has {} feature(s) but {} coefficient(s).",
                self.features.len(),
                self.coefficients.len()
            )));
        }
        if !self.intercept.is_finite() || self.coefficients.iter().any(|c| !c.is_finite()) {
            return Err(AppError::input("Model parameters must be finite."));
        }
        Ok(())
    }
}

/// Predict a stellar mass in solar masses from user-facing units.
///
/// - `luminosity_sun`: luminosity in solar luminosities (must be > 0)
/// - `feh_dex`: metallicity as `[Fe/H]` in dex
pub fn predict_solar_mass(model: &LinearModel, luminosity_sun: f64, feh_dex: f64) -> Result<f64, AppError> {
    if !feh_dex.is_finite() {
        return Err(AppError::input("Metallicity must be a finite number."));
    }
    let log_watts = solar_lum_to_log_watts(luminosity_sun)
        .ok_or_else(|| AppError::input("Luminosity must be a finite number greater than 0."))?;
    let met = feh_dex_to_log_fraction(feh_dex);

    let mut row = Vec::with_capacity(model.features.len());
    for feature in &model.features {
        row.push(match feature {
            Feature::Luminosity => log_watts,
            Feature::Metallicity => met,
            other => {
                return Err(AppError::input(format!(
                    "Model feature `{}` cannot be derived from luminosity and metallicity.",
                    other.column()
                )));
            }
        });
    }

    let mass = log_kg_to_solar_mass(model.predict_row(&row));
    if !mass.is_finite() {
        return Err(AppError::runtime("Model produced a non-finite mass."));
    }
    Ok(mass)
}

/// Evaluation scores recorded with a trained model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingMetrics {
    pub n_train: usize,
    pub n_test: usize,
    pub test_mse: f64,
    pub test_r2: f64,
    pub cv_folds: usize,
    pub cv_mse: f64,
    pub cv_r2: f64,
}

/// A saved model file (JSON).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelFile {
    pub tool: String,
    pub trained_at: DateTime<Utc>,
    pub seed: u64,
    pub test_size: f64,
    /// Unit of the target followed by the unit of each feature.
    pub units: Vec<String>,
    pub model: LinearModel,
    pub metrics: TrainingMetrics,
}

impl ModelFile {
    pub fn new(model: LinearModel, metrics: TrainingMetrics, seed: u64, test_size: f64) -> Self {
        let units = std::iter::once(model.target)
            .chain(model.features.iter().copied())
            .map(|f| format!("{}: {}", f.column(), f.unit_label()))
            .collect();
        ModelFile {
            tool: "stellar".to_string(),
            trained_at: Utc::now(),
            seed,
            test_size,
            units,
            model,
            metrics,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::units::{log_solar_lum_to_log_watts, solar_mass_to_log_kg};

    fn sun_model() -> LinearModel {
        // Exactly M = M_sun for L = L_sun regardless of metallicity:
        // M = log10(M_sun) + (L - log10(L_sun)).
        let l_sun = log_solar_lum_to_log_watts(0.0);
        LinearModel {
            target: Feature::Mass,
            features: vec![Feature::Luminosity, Feature::Metallicity],
            intercept: solar_mass_to_log_kg(1.0).unwrap() - l_sun,
            coefficients: vec![1.0, 0.0],
        }
    }

    #[test]
    fn predicts_solar_mass_for_the_sun() {
        let m = predict_solar_mass(&sun_model(), 1.0, 0.0).unwrap();
        assert!((m - 1.0).abs() < 1e-9, "got {m}");

        let m10 = predict_solar_mass(&sun_model(), 10.0, 0.3).unwrap();
        assert!((m10 - 10.0).abs() < 1e-8, "got {m10}");
    }

    #[test]
    fn rejects_non_physical_inputs() {
        let model = sun_model();
        assert_eq!(predict_solar_mass(&model, 0.0, 0.0).unwrap_err().exit_code(), 2);
        assert!(predict_solar_mass(&model, -3.0, 0.0).is_err());
        assert!(predict_solar_mass(&model, 1.0, f64::NAN).is_err());
    }

    #[test]
    fn rejects_models_needing_other_features() {
        let mut model = sun_model();
        model.features = vec![Feature::Teff, Feature::Metallicity];
        let err = predict_solar_mass(&model, 1.0, 0.0).unwrap_err();
        assert!(err.to_string().contains("Teff"));
    }

    #[test]
    fn validate_catches_shape_mismatch() {
        let mut model = sun_model();
        assert!(model.validate().is_ok());
        model.coefficients.pop();
        assert!(model.validate().is_err());
    }
}
