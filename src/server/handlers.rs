use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, warn};

use crate::domain::{ReferenceStar, REFERENCE_STARS};
use crate::models::predict_solar_mass;
use crate::server::state::{AppState, MassLuminosity};

/// Body of `POST /predict`. Absent and `null` fields both land as `None`.
#[derive(Debug, Deserialize)]
pub struct PredictRequest {
    pub luminosity: Option<f64>,
    pub metallicity: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct PredictResponse {
    /// Solar masses.
    pub prediction: f64,
    pub predicted: MassLuminosity,
    pub stars: Vec<MassLuminosity>,
    pub labels: Vec<ReferenceStar>,
}

#[derive(Debug, Serialize)]
pub struct GraphData {
    pub stars: Vec<MassLuminosity>,
    pub labels: Vec<ReferenceStar>,
}

fn bad_request(message: &str) -> Response {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
}

/// Serves `index.html` for the client-side routes.
pub async fn index(State(state): State<AppState>) -> Response {
    let path = state.static_dir.join("index.html");
    match tokio::fs::read_to_string(&path).await {
        Ok(html) => ([(header::CONTENT_TYPE, "text/html; charset=utf-8")], html).into_response(),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "index.html unavailable");
            (StatusCode::NOT_FOUND, "index.html not found").into_response()
        }
    }
}

pub async fn predict(State(state): State<AppState>, payload: Result<Json<PredictRequest>, JsonRejection>) -> Response {
    let Json(request) = match payload {
        Ok(body) => body,
        Err(rejection) => return bad_request(&rejection.body_text()),
    };
    let (Some(luminosity), Some(metallicity)) = (request.luminosity, request.metallicity) else {
        return bad_request("Missing parameters");
    };

    let mass = match predict_solar_mass(&state.model, luminosity, metallicity) {
        Ok(mass) => mass,
        Err(e) => return bad_request(e.message()),
    };
    debug!(luminosity, metallicity, mass, "prediction");

    Json(PredictResponse {
        prediction: mass,
        predicted: MassLuminosity { mass, luminosity },
        stars: state.stars.as_ref().clone(),
        labels: REFERENCE_STARS.to_vec(),
    })
    .into_response()
}

pub async fn graph_data(State(state): State<AppState>) -> Json<GraphData> {
    Json(GraphData {
        stars: state.stars.as_ref().clone(),
        labels: REFERENCE_STARS.to_vec(),
    })
}
