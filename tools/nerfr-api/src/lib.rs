//! # nerfr API
//!
//! HTTP front-end for the recognizer. The router is built from an
//! [`AppState`] so tests can drive it without binding a socket.

pub mod config;
pub mod error;
pub mod handlers;

use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use nerfr_core::Recognizer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

pub use config::ServerConfig;
pub use error::ApiError;

/// Shared, read-only state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub recognizer: Arc<Recognizer>,
    pub models_dir: PathBuf,
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(recognizer: Recognizer, config: &ServerConfig) -> Self {
        Self {
            recognizer: Arc::new(recognizer),
            models_dir: config.models_dir(),
            max_upload_bytes: config.max_upload_bytes,
        }
    }
}

/// Build the full router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health))
        .route("/predict", post(handlers::predict))
        .route("/predict-enhanced", post(handlers::predict_enhanced))
        .route("/predict-file", post(handlers::predict_file))
        .nest_service("/models", ServeDir::new(&state.models_dir))
        .layer(DefaultBodyLimit::max(state.max_upload_bytes))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
