//! Result aggregation endpoints (developer console)

use axum::extract::State;
use axum::http::HeaderMap;
use axum::{Extension, Json};
use prayas_common::audit::AuditEntry;
use prayas_common::session::Session;
use prayas_common::Error;
use serde::{Deserialize, Serialize};

use super::{request_meta, ApiError};
use crate::aggregate;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct AggregateResponse {
    pub written: usize,
    pub warnings: Vec<String>,
}

/// POST /api/results/aggregate — runs the sync job
pub async fn run_aggregation(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    headers: HeaderMap,
) -> Result<Json<AggregateResponse>, ApiError> {
    let report = aggregate::aggregate_results(&state.store).await?;

    emit_audit(
        &state,
        &session,
        &headers,
        format!("Synced student results ({} written)", report.written),
    );
    Ok(Json(AggregateResponse {
        written: report.written,
        warnings: report.warnings,
    }))
}

#[derive(Debug, Deserialize)]
pub struct DeleteAllRequest {
    /// Must be true; this operation is irreversible and takes no backup
    #[serde(default)]
    pub confirm: bool,
}

#[derive(Debug, Serialize)]
pub struct DeleteAllResponse {
    pub deleted: usize,
    pub message: String,
}

/// POST /api/results/delete-all
pub async fn delete_all(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    headers: HeaderMap,
    Json(request): Json<DeleteAllRequest>,
) -> Result<Json<DeleteAllResponse>, ApiError> {
    if !request.confirm {
        return Err(Error::InvalidInput(
            "Deleting all aggregated results is irreversible; pass confirm=true".to_string(),
        )
        .into());
    }

    let report = aggregate::delete_all_summaries(&state.store).await?;

    emit_audit(
        &state,
        &session,
        &headers,
        format!("Deleted all aggregated results ({})", report.deleted),
    );
    Ok(Json(DeleteAllResponse {
        deleted: report.deleted,
        message: report.message,
    }))
}

fn emit_audit(state: &AppState, session: &Session, headers: &HeaderMap, action: String) {
    let (user_agent, ip) = request_meta(headers);
    state.audit.emit(AuditEntry::new(
        &session.name,
        &session.role,
        &user_agent,
        &ip,
        action,
    ));
}
