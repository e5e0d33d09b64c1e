//! prayas-forms library - public form-submission service
//!
//! One POST route that persists the JSON body verbatim as a new
//! document in the form-submissions collection. No auth, no schema
//! validation — a pure pass-through. The third-party chat widget posts
//! to its own hosted relay and never touches this service.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tracing::{error, info};

use prayas_common::db::{collections, DocumentStore};

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub store: DocumentStore,
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/submit", post(submit))
        .route("/health", get(health))
        .with_state(state)
}

/// POST /api/submit — store the body verbatim
async fn submit(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    match collections::insert_form_submission(&state.store, &body).await {
        Ok(doc_id) => {
            info!("Stored form submission {doc_id}");
            (
                StatusCode::OK,
                Json(json!({ "message": "Form submitted successfully" })),
            )
        }
        Err(e) => {
            error!("Form submission failed: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Could not store submission" })),
            )
        }
    }
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "module": "prayas-forms",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
