//! Event CRUD and image ingestion endpoints

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use chrono::Utc;
use prayas_common::audit::AuditEntry;
use prayas_common::models::{Badge, EventRecord, ImageRecord};
use prayas_common::session::Session;
use prayas_common::Error;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use super::{request_meta, ApiError};
use crate::db::collections;
use crate::ingest::{self, DeviceFile, UploadOutcome};
use crate::AppState;

// ---------------------------------------------------------------------------
// Listing
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct EventListResponse {
    pub events: Vec<EventRecord>,
}

/// GET /api/events — newest first
pub async fn list_events(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<EventListResponse>, ApiError> {
    let limit = query.limit.unwrap_or(50).clamp(1, 200);
    let events = collections::list_events(&state.store, limit).await?;
    Ok(Json(EventListResponse { events }))
}

// ---------------------------------------------------------------------------
// Create / update / delete
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventPayload {
    pub title: String,
    pub date: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub description: String,
    pub images: Vec<ImageRecord>,
    #[serde(default)]
    pub badge: Badge,
    #[serde(default)]
    pub featured: bool,
}

/// The ingestion UI never submits an event without a title, a date and
/// at least one image; the server holds the same line.
fn validate_event_payload(payload: &EventPayload) -> Result<(), Error> {
    if payload.title.trim().is_empty() {
        return Err(Error::InvalidInput("Event title is required".to_string()));
    }
    if payload.date.trim().is_empty() {
        return Err(Error::InvalidInput("Event date is required".to_string()));
    }
    if payload.images.is_empty() {
        return Err(Error::InvalidInput(
            "At least one image is required".to_string(),
        ));
    }
    Ok(())
}

/// POST /api/events
pub async fn create_event(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    headers: HeaderMap,
    Json(payload): Json<EventPayload>,
) -> Result<(StatusCode, Json<EventRecord>), ApiError> {
    validate_event_payload(&payload)?;

    let now = Utc::now();
    let cover = payload.images[0].url.clone();
    let event = EventRecord {
        id: Uuid::new_v4().to_string(),
        title: payload.title.trim().to_string(),
        date: payload.date.trim().to_string(),
        location: payload.location,
        description: payload.description,
        images: payload.images,
        image: cover,
        badge: payload.badge,
        featured: payload.featured,
        created_at: now,
        updated_at: now,
    };
    collections::put_event(&state.store, &event).await?;
    info!("Created event '{}' ({})", event.title, event.id);

    emit_audit(&state, &session, &headers, format!("Created event '{}'", event.title));
    Ok((StatusCode::CREATED, Json(event)))
}

/// PUT /api/events/:id
pub async fn update_event(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(payload): Json<EventPayload>,
) -> Result<Json<EventRecord>, ApiError> {
    validate_event_payload(&payload)?;

    let existing = collections::get_event(&state.store, &id).await?;
    let cover = payload.images[0].url.clone();
    let event = EventRecord {
        id: existing.id,
        title: payload.title.trim().to_string(),
        date: payload.date.trim().to_string(),
        location: payload.location,
        description: payload.description,
        images: payload.images,
        image: cover,
        badge: payload.badge,
        featured: payload.featured,
        created_at: existing.created_at,
        updated_at: Utc::now(),
    };
    collections::put_event(&state.store, &event).await?;
    info!("Updated event '{}' ({})", event.title, event.id);

    emit_audit(&state, &session, &headers, format!("Updated event '{}'", event.title));
    Ok(Json(event))
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub deleted: bool,
}

/// DELETE /api/events/:id
///
/// Stored blobs are deleted best-effort first; per-image failures do
/// not block the document deletion.
pub async fn delete_event(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<DeleteResponse>, ApiError> {
    let event = collections::get_event(&state.store, &id).await?;

    ingest::delete_event_blobs(state.objects.as_ref(), &event).await;
    let deleted = collections::delete_event_doc(&state.store, &id).await?;
    info!("Deleted event '{}' ({})", event.title, id);

    emit_audit(&state, &session, &headers, format!("Deleted event '{}'", event.title));
    Ok(Json(DeleteResponse { deleted }))
}

// ---------------------------------------------------------------------------
// Image ingestion
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct UploadQuery {
    /// Original file name, used for the storage key extension
    pub name: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    /// The record to append to the in-progress event, when not rejected
    pub record: Option<ImageRecord>,
    /// "uploaded", "local-fallback" or "rejected"
    pub outcome: String,
    pub message: Option<String>,
}

/// POST /api/images — one device file per request, raw bytes body.
///
/// The record comes back for the client to append to the in-progress
/// event's image list; nothing is attached server-side until the event
/// itself is saved.
pub async fn upload_image(
    State(state): State<AppState>,
    Query(query): Query<UploadQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<UploadResponse>, ApiError> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("application/octet-stream")
        .to_string();

    let file = DeviceFile {
        name: query.name,
        content_type,
        bytes: body.to_vec(),
    };
    let mut report =
        ingest::ingest_files(state.objects.as_ref(), &state.previews, vec![file]).await;

    let outcome = report.outcomes.remove(0);
    let (outcome_label, message) = match outcome.outcome {
        UploadOutcome::Uploaded => ("uploaded", None),
        UploadOutcome::LocalFallback => (
            "local-fallback",
            Some("Upload failed; the image is kept locally and will not survive a restart".to_string()),
        ),
        UploadOutcome::Rejected(reason) => ("rejected", Some(reason)),
    };

    Ok(Json(UploadResponse {
        record: report.records.pop(),
        outcome: outcome_label.to_string(),
        message,
    }))
}

#[derive(Debug, Deserialize)]
pub struct FromUrlsRequest {
    /// One URL per line; empty lines are ignored
    pub urls: String,
}

#[derive(Debug, Serialize)]
pub struct FromUrlsResponse {
    pub records: Vec<ImageRecord>,
    pub failures: Vec<String>,
}

/// POST /api/images/from-urls
pub async fn add_images_from_urls(
    State(state): State<AppState>,
    Json(request): Json<FromUrlsRequest>,
) -> Result<Json<FromUrlsResponse>, ApiError> {
    let report = ingest::ingest_urls(state.prober.as_ref(), &request.urls).await;
    Ok(Json(FromUrlsResponse {
        records: report.records,
        failures: report.failures,
    }))
}

/// DELETE /api/events/:id/images/:index
///
/// Removes the image from the event regardless of whether the backing
/// blob could be deleted.
pub async fn remove_event_image(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path((id, index)): Path<(String, usize)>,
    headers: HeaderMap,
) -> Result<Json<EventRecord>, ApiError> {
    let mut event = collections::get_event(&state.store, &id).await?;
    if event.images.len() == 1 {
        return Err(Error::InvalidInput(
            "An event must keep at least one image".to_string(),
        )
        .into());
    }

    let removed = ingest::remove_image(state.objects.as_ref(), &mut event, index).await?;
    event.updated_at = Utc::now();
    collections::put_event(&state.store, &event).await?;

    emit_audit(
        &state,
        &session,
        &headers,
        format!("Removed image '{}' from event '{}'", removed.name, event.title),
    );
    Ok(Json(event))
}

/// GET /preview/:id — serves an ephemeral local-fallback blob
pub async fn serve_preview(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Response {
    match state.previews.get(id) {
        Some(blob) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, blob.content_type)],
            blob.bytes,
        )
            .into_response(),
        None => ApiError(Error::NotFound("preview expired".to_string())).into_response(),
    }
}

// ---------------------------------------------------------------------------

/// Fire-and-forget audit append; never blocks the primary operation
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
