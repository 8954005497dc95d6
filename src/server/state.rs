use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::domain::Star;
use crate::error::AppError;
use crate::io::{read_model_json, read_stars_csv};
use crate::math::units::{log_kg_to_solar_mass, log_watts_to_solar_lum};
use crate::models::LinearModel;

/// A point on the mass-luminosity diagram, solar units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MassLuminosity {
    #[serde(rename = "M")]
    pub mass: f64,
    #[serde(rename = "L")]
    pub luminosity: f64,
}

impl MassLuminosity {
    pub fn from_star(star: &Star) -> Self {
        MassLuminosity {
            mass: log_kg_to_solar_mass(star.mass),
            luminosity: log_watts_to_solar_lum(star.luminosity),
        }
    }
}

/// Shared, read-only server state.
#[derive(Debug, Clone)]
pub struct AppState {
    pub model: Arc<LinearModel>,
    pub stars: Arc<Vec<MassLuminosity>>,
    pub static_dir: Arc<PathBuf>,
}

impl AppState {
    pub fn new(model: LinearModel, stars: Vec<MassLuminosity>, static_dir: PathBuf) -> Self {
        AppState {
            model: Arc::new(model),
            stars: Arc::new(stars),
            static_dir: Arc::new(static_dir),
        }
    }

    /// Load the model artifact and the catalog. A missing catalog gives an empty diagram.
    pub fn load(model_path: &Path, data_path: &Path, static_dir: &Path) -> Result<Self, AppError> {
        let artifact = read_model_json(model_path)?;
        let stars = if data_path.exists() {
            read_stars_csv(data_path)?.iter().map(MassLuminosity::from_star).collect()
        } else {
            warn!(path = %data_path.display(), "catalog not found; diagram will be empty");
            Vec::new()
        };
        info!(
            model = %model_path.display(),
            trained_at = %artifact.trained_at,
            stars = stars.len(),
            "loaded server state"
        );
        Ok(AppState::new(artifact.model, stars, static_dir.to_path_buf()))
    }
}
