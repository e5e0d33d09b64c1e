//! Audit log retrieval

use axum::extract::{Query, State};
use axum::Json;
use prayas_common::audit::AuditEntry;
use serde::{Deserialize, Serialize};

use super::ApiError;
use crate::db::collections;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct LogsQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct LogsResponse {
    pub logs: Vec<AuditEntry>,
}

/// GET /api/logs?limit=N — newest first
pub async fn recent(
    State(state): State<AppState>,
    Query(query): Query<LogsQuery>,
) -> Result<Json<LogsResponse>, ApiError> {
    let limit = query.limit.unwrap_or(100).clamp(1, 500);
    let logs = collections::recent_logs(&state.store, limit).await?;
    Ok(Json(LogsResponse { logs }))
}
