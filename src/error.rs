//! Error handling

use axum::{
    response::{IntoResponse, Response},
    http::{header::WWW_AUTHENTICATE, StatusCode},
    Json,
};
use serde_json::json;
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

/// Problems with a prediction request body
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Expected application/json body")]
    NotJson,

    #[error("JSON must be an object or an array")]
    BadShape,

    #[error("Missing feature {0}")]
    MissingFeature(&'static str),

    #[error("Invalid value for feature {0}")]
    InvalidValue(&'static str),
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            AppError::Unauthorized => {
                let body = Json(json!({ "error": "Unauthorized" }));
                return (StatusCode::UNAUTHORIZED, [(WWW_AUTHENTICATE, "Basic")], body)
                    .into_response();
            }
            AppError::Validation(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };

        (status, Json(json!({ "error": error_message }))).into_response()
    }
}
