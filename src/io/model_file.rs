//! Read/write model JSON files.
//!
//! The model JSON is the portable representation of a trained model:
//! - feature names + intercept + coefficients
//! - training metadata (timestamp, seed, split)
//! - hold-out and cross-validation scores
//!
//! The schema is defined by `models::ModelFile`.

use std::fs::{create_dir_all, File};
use std::path::Path;

use crate::error::AppError;
use crate::models::ModelFile;

/// Write a model JSON file.
pub fn write_model_json(path: &Path, model: &ModelFile) -> Result<(), AppError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        create_dir_all(parent)
            .map_err(|e| AppError::input(format!("Failed to create directory '{}': {e}", parent.display())))?;
    }
    let file = File::create(path)
        .map_err(|e| AppError::input(format!("Failed to create model JSON '{}': {e}", path.display())))?;

    serde_json::to_writer_pretty(file, model)
        .map_err(|e| AppError::input(format!("Failed to write model JSON: {e}")))?;

    Ok(())
}

/// Read a model JSON file and check it is usable.
pub fn read_model_json(path: &Path) -> Result<ModelFile, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::input(format!("Failed to open model JSON '{}': {e}", path.display())))?;
    let model: ModelFile =
        serde_json::from_reader(file).map_err(|e| AppError::input(format!("Invalid model JSON: {e}")))?;
    model.model.validate()?;
    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use crate::domain::Feature;
    use crate::models::{LinearModel, TrainingMetrics};

    #[test]
    fn model_file_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("models/linear_model.json");
        let mut file = ModelFile::new(
            LinearModel {
                target: Feature::Mass,
                features: vec![Feature::Luminosity, Feature::Metallicity],
                intercept: 24.49554961,
                coefficients: vec![0.21843771, 0.00115995],
            },
            TrainingMetrics {
                n_train: 300,
                n_test: 100,
                test_mse: 0.001,
                test_r2: 0.9,
                cv_folds: 5,
                cv_mse: 0.0012,
                cv_r2: 0.88,
            },
            1,
            0.25,
        );
        file.trained_at = Utc.with_ymd_and_hms(2025, 9, 16, 23, 33, 38).unwrap();

        write_model_json(&path, &file).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("\"M: log10 kg\""));
        assert!(text.contains("\"met: log10 Fe/H\""));
        assert_eq!(read_model_json(&path).unwrap(), file);
    }

    #[test]
    fn missing_model_is_an_input_error() {
        let err = read_model_json(Path::new("/definitely/not/here.json")).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}
