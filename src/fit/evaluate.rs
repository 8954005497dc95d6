//! Training workflow: hold-out fit, k-fold cross-validation, collinearity check.

use rayon::prelude::*;
use tracing::{debug, info};

use crate::domain::{Feature, Star, TrainConfig};
use crate::error::AppError;
use crate::fit::regression::{fit_linear, score, Dataset};
use crate::fit::split::{kfold, train_test_split};
use crate::math::{intercept_vif, variance_inflation_factors};
use crate::models::{LinearModel, TrainingMetrics};

/// Predictors of the mass model, in coefficient order.
pub const MODEL_FEATURES: [Feature; 2] = [Feature::Luminosity, Feature::Metallicity];
pub const MODEL_TARGET: Feature = Feature::Mass;

/// Mean scores over the folds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CvScores {
    pub folds: usize,
    pub mse: f64,
    pub r2: f64,
}

#[derive(Debug, Clone)]
pub struct Training {
    /// Fitted on the training split only.
    pub model: LinearModel,
    pub metrics: TrainingMetrics,
    /// `intercept` first, then each predictor.
    pub vif: Vec<(&'static str, f64)>,
}

/// Fit on a seeded hold-out split and cross-validate on the full set.
pub fn train(stars: &[Star], config: &TrainConfig) -> Result<Training, AppError> {
    let data = Dataset::from_stars(stars, &MODEL_FEATURES, MODEL_TARGET);

    let split = train_test_split(data.len(), config.test_size, config.seed)?;
    let train_set = data.subset(&split.train);
    let test_set = data.subset(&split.test);

    let model = fit_linear(&train_set)?;
    let (test_mse, test_r2) = score(&model, &test_set)?;
    info!(n_train = train_set.len(), n_test = test_set.len(), test_mse, test_r2, "hold-out evaluation");

    let cv = cross_validate(&data, config.folds, config.seed)?;
    info!(folds = cv.folds, cv_mse = cv.mse, cv_r2 = cv.r2, "cross-validation");

    Ok(Training {
        model,
        metrics: TrainingMetrics {
            n_train: train_set.len(),
            n_test: test_set.len(),
            test_mse,
            test_r2,
            cv_folds: cv.folds,
            cv_mse: cv.mse,
            cv_r2: cv.r2,
        },
        vif: predictor_vif(&data),
    })
}

/// Shuffled k-fold cross-validation; folds are fitted in parallel.
pub fn cross_validate(data: &Dataset, folds: usize, seed: u64) -> Result<CvScores, AppError> {
    let splits = kfold(data.len(), folds, seed)?;

    let scores: Vec<(f64, f64)> = splits
        .par_iter()
        .map(|split| {
            let model = fit_linear(&data.subset(&split.train))?;
            score(&model, &data.subset(&split.test))
        })
        .collect::<Result<_, AppError>>()?;

    for (i, (mse, r2)) in scores.iter().enumerate() {
        debug!(fold = i, mse, r2, "fold scored");
    }

    let k = scores.len() as f64;
    Ok(CvScores {
        folds: scores.len(),
        mse: scores.iter().map(|s| s.0).sum::<f64>() / k,
        r2: scores.iter().map(|s| s.1).sum::<f64>() / k,
    })
}

/// Variance inflation factors of the design `[intercept, predictors...]`.
pub fn predictor_vif(data: &Dataset) -> Vec<(&'static str, f64)> {
    let columns: Vec<Vec<f64>> = (0..data.features.len()).map(|j| data.column(j)).collect();
    std::iter::once(("intercept", intercept_vif(&columns)))
        .chain(
            data.features
                .iter()
                .map(|f| f.column())
                .zip(variance_inflation_factors(&columns)),
        )
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::synthetic::{generate_catalog, SyntheticConfig};
    use std::path::PathBuf;

    fn config() -> TrainConfig {
        TrainConfig {
            data_path: PathBuf::from("unused.csv"),
            model_out: PathBuf::from("unused.json"),
            test_size: 0.25,
            seed: 1,
            folds: 5,
        }
    }

    #[test]
    fn trains_on_synthetic_catalog() {
        let stars = generate_catalog(&SyntheticConfig::default()).unwrap();
        let out = train(&stars, &config()).unwrap();

        assert_eq!(out.metrics.n_test, 100);
        assert_eq!(out.metrics.n_train, 300);
        assert_eq!(out.metrics.cv_folds, 5);
        assert!(out.metrics.test_r2 > 0.9, "r2 = {}", out.metrics.test_r2);
        assert!(out.metrics.cv_r2 > 0.9);
        // Mass grows with luminosity (about M ∝ L^0.25).
        assert!(out.model.coefficients[0] > 0.15 && out.model.coefficients[0] < 0.3);
        let names: Vec<&str> = out.vif.iter().map(|(name, _)| *name).collect();
        assert_eq!(names, vec!["intercept", "L", "met"]);
        assert!(out.vif[1..].iter().all(|(_, v)| *v > 0.99 && *v < 5.0));
        // Uncentered predictors far from zero inflate the intercept.
        assert!(out.vif[0].1 > 5.0, "intercept VIF = {}", out.vif[0].1);
    }

    #[test]
    fn training_is_deterministic() {
        let stars = generate_catalog(&SyntheticConfig::default()).unwrap();
        let a = train(&stars, &config()).unwrap();
        let b = train(&stars, &config()).unwrap();
        assert_eq!(a.model, b.model);
        assert_eq!(a.metrics, b.metrics);
    }

    #[test]
    fn too_few_stars_is_insufficient() {
        let stars = generate_catalog(&SyntheticConfig {
            count: 4,
            ..SyntheticConfig::default()
        })
        .unwrap();
        assert_eq!(train(&stars, &config()).unwrap_err().exit_code(), 3);
    }
}
