//! Iris Classifier Service
//!
//! Serves a pre-trained Iris classifier over HTTP.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐   iris_clf.json    ┌─────────────────────────────┐
//! │  train (bin) │ ─────────────────▶ │  iris-serve (Axum)          │
//! │  linfa       │   metadata.json    │  GET  /         index page  │
//! └──────────────┘                    │  GET  /health   status      │
//!                                     │  POST /predict  Basic auth  │
//!                                     └─────────────────────────────┘
//! ```

pub mod artifacts;
pub mod config;
pub mod error;
pub mod features;
pub mod handlers;
pub mod inference;
pub mod middleware;
pub mod model;
pub mod training;


use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
    middleware as axum_middleware,
};
use tower_http::{
    cors::{CorsLayer, Any},
    trace::TraceLayer,
};

pub use error::{AppError, AppResult};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub predictor: Arc<inference::Predictor>,
    pub config: Arc<config::Config>,
}

impl AppState {
    pub fn new(predictor: inference::Predictor, config: config::Config) -> Self {
        Self {
            predictor: Arc::new(predictor),
            config: Arc::new(config),
        }
    }
}

/// Create the main router with all routes
pub fn create_router(state: AppState) -> Router {
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/", get(handlers::index::page))
        .route("/health", get(handlers::health::check));

    // Prediction routes (Basic auth)
    let protected_routes = Router::new()
        .route("/predict", post(handlers::predict::predict))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_basic_auth
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        )
        .with_state(state)
}
