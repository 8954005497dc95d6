//! HTTP interface: the single-page app plus a JSON prediction endpoint.
//!
//! Routes:
//! - `GET /`, `/predict`, `/graphs`, `/definitions`: `index.html`
//! - `POST /predict`: mass prediction
//! - `GET /graph_data`: catalog and reference stars for the diagram
//! - anything else: static files (EDA charts, scripts)

use axum::routing::get;
use axum::Router;
use tower_http::services::ServeDir;
use tracing::info;

use crate::domain::ServeConfig;
use crate::error::AppError;

pub mod handlers;
pub mod state;

pub use state::{AppState, MassLuminosity};

pub fn app_router(state: AppState) -> Router {
    let assets = ServeDir::new(state.static_dir.as_ref());
    Router::new()
        .route("/", get(handlers::index))
        .route("/predict", get(handlers::index).post(handlers::predict))
        .route("/graphs", get(handlers::index))
        .route("/definitions", get(handlers::index))
        .route("/graph_data", get(handlers::graph_data))
        .fallback_service(assets)
        .with_state(state)
}

/// Load state and serve until the process is stopped.
pub fn serve(config: &ServeConfig) -> Result<(), AppError> {
    let state = AppState::load(&config.model_path, &config.data_path, &config.static_dir)?;
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| AppError::runtime(format!("Failed to start runtime: {e}")))?;

    runtime.block_on(async {
        let listener = tokio::net::TcpListener::bind(config.addr)
            .await
            .map_err(|e| AppError::runtime(format!("Failed to bind {}: {e}", config.addr)))?;
        info!(addr = %config.addr, static_dir = %config.static_dir.display(), "listening");
        axum::serve(listener, app_router(state))
            .await
            .map_err(|e| AppError::runtime(format!("Server error: {e}")))
    })
}
