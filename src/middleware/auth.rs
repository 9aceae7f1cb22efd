//! Authentication middleware

use axum::{
    extract::{State, Request},
    middleware::Next,
    response::Response,
    http::header::AUTHORIZATION,
};
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};

use crate::{AppState, AppError};

/// Username/password pair from a Basic `Authorization` header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicCredentials {
    pub username: String,
    pub password: String,
}

impl BasicCredentials {
    /// Parse `Basic base64(user:pass)`. The password may contain ':'.
    pub fn parse(header: &str) -> Option<Self> {
        let encoded = header.strip_prefix("Basic ")?.trim();
        let decoded = BASE64.decode(encoded).ok()?;
        let decoded = String::from_utf8(decoded).ok()?;
        let (username, password) = decoded.split_once(':')?;

        Some(Self {
            username: username.to_string(),
            password: password.to_string(),
        })
    }
}

/// Middleware: Require HTTP Basic authentication
pub async fn require_basic_auth(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let credentials = req.headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(BasicCredentials::parse)
        .ok_or(AppError::Unauthorized)?;

    if credentials.username != state.config.auth_user
        || credentials.password != state.config.auth_pass
    {
        tracing::warn!("Rejected credentials for user '{}'", credentials.username);
        return Err(AppError::Unauthorized);
    }

    Ok(next.run(req).await)
}
