//! HTTP API for the admin console

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, HeaderMap, Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use prayas_common::Error;
use serde_json::json;
use uuid::Uuid;

use crate::AppState;

pub mod auth;
pub mod events;
pub mod health;
pub mod logs;
pub mod results;
pub mod schedule;

/// Error wrapper mapping the common error type onto HTTP responses.
///
/// Unexpected errors surface as a generic 500 body; the diagnostic
/// detail stays in the logs.
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            Error::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
            Error::InvalidInput(m) => (StatusCode::BAD_REQUEST, m.clone()),
            Error::Identity(m) => (StatusCode::UNAUTHORIZED, m.clone()),
            other => {
                tracing::error!("Request failed: {other}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Something went wrong. Please try again.".to_string(),
                )
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Session-token middleware for mutating routes.
///
/// Expects `Authorization: Bearer <token>`; the resolved session is
/// handed to handlers through request extensions.
pub async fn require_session(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .and_then(|v| v.parse::<Uuid>().ok());

    let session = token.and_then(|token| state.sessions.get(token));
    match session {
        Some(session) => {
            request.extensions_mut().insert(session);
            next.run(request).await
        }
        None => ApiError(Error::Identity("Sign in to continue".to_string())).into_response(),
    }
}

/// Request origin details used for audit entries
pub fn request_meta(headers: &HeaderMap) -> (String, String) {
    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();
    let ip = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or("unknown")
        .to_string();
    (user_agent, ip)
}
