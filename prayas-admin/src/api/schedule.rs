//! Scheduled/past tests listing

use axum::extract::{Query, State};
use axum::Json;
use prayas_common::models::TestRecord;
use prayas_common::Error;
use serde::{Deserialize, Serialize};

use super::ApiError;
use crate::db::collections;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct TestsQuery {
    pub status: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TestsResponse {
    pub tests: Vec<TestRecord>,
    /// Warning banner text when the composite index was missing and the
    /// listing came back unordered
    pub warning: Option<String>,
}

/// GET /api/tests?status=scheduled|completed — newest sitting first
pub async fn list_tests(
    State(state): State<AppState>,
    Query(query): Query<TestsQuery>,
) -> Result<Json<TestsResponse>, ApiError> {
    let status = query.status.unwrap_or_else(|| "scheduled".to_string());
    if status != "scheduled" && status != "completed" {
        return Err(Error::InvalidInput(format!("Unknown test status '{status}'")).into());
    }

    let page = collections::list_tests_by_status(&state.store, &status).await?;
    let warning = page.degraded.then(|| {
        "Showing unsorted results: the database index for this view is missing".to_string()
    });
    Ok(Json(TestsResponse { tests: page.tests, warning }))
}
