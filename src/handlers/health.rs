//! Health check handler

use axum::{extract::State, Json};

use crate::AppState;
use crate::inference::Status;

/// GET /health (no auth)
pub async fn check(State(state): State<AppState>) -> Json<Status> {
    Json(state.predictor.status())
}
