//! Sign-in/sign-out against the hosted identity provider
//!
//! Credentials are verified remotely; the authorization role and
//! display name come from the roster afterwards. Successful sign-ins
//! publish on the session context's watch channel so in-process
//! subscribers react without polling.

use axum::extract::State;
use axum::{Extension, Json};
use prayas_common::session::Session;
use prayas_common::Error;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use super::ApiError;
use crate::db::collections;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct SignInResponse {
    pub token: Uuid,
    pub name: String,
    pub role: String,
}

/// POST /api/auth/signin
pub async fn sign_in(
    State(state): State<AppState>,
    Json(request): Json<SignInRequest>,
) -> Result<Json<SignInResponse>, ApiError> {
    let email = request.email.trim().to_string();
    if email.is_empty() || request.password.is_empty() {
        return Err(Error::InvalidInput("Email and password are required".to_string()).into());
    }

    state.identity.sign_in(email.clone(), request.password).await?;

    // Role lookup is post-login; an unknown roster entry still signs in
    // as a plain viewer
    let (name, role) = match collections::find_user_by_email(&state.store, &email).await? {
        Some(person) => (person.name, person.role),
        None => (email.clone(), "viewer".to_string()),
    };

    let token = state.sessions.sign_in(name.clone(), role.clone(), email);
    info!("Signed in: {} ({})", name, role);
    Ok(Json(SignInResponse { token, name, role }))
}

#[derive(Debug, Serialize)]
pub struct SignOutResponse {
    pub signed_out: bool,
}

/// POST /api/auth/signout
pub async fn sign_out(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Json<SignOutResponse> {
    let signed_out = state.sessions.sign_out(session.token);
    info!("Signed out: {}", session.name);
    Json(SignOutResponse { signed_out })
}
