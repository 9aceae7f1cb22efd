//! Prediction handler

use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, Request, State},
    http::header::CONTENT_TYPE,
    Json,
};
use serde_json::Value;

use crate::{AppState, AppResult};
use crate::error::{AppError, ValidationError};
use crate::inference::PredictionOutput;

/// JSON request body. Wrong content type, empty or malformed bodies are
/// reported as 400 rather than axum's default rejections.
#[derive(Debug)]
pub struct JsonBody(pub Value);

#[async_trait]
impl<S> FromRequest<S> for JsonBody
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_json = req.headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(is_json_content_type);
        if !is_json {
            return Err(ValidationError::NotJson.into());
        }

        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|_| ValidationError::NotJson)?;

        serde_json::from_slice(&bytes)
            .map(JsonBody)
            .map_err(|_| ValidationError::NotJson.into())
    }
}

/// `application/json` or any `application/*+json`
fn is_json_content_type(value: &str) -> bool {
    let mime = value.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
    mime == "application/json"
        || (mime.starts_with("application/") && mime.ends_with("+json"))
}

/// POST /predict (Basic auth)
pub async fn predict(
    State(state): State<AppState>,
    JsonBody(body): JsonBody,
) -> AppResult<Json<PredictionOutput>> {
    state.predictor.handle_predict_request(&body).map(Json)
}
