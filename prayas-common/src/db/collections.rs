//! Typed accessors over the document collections
//!
//! Collection names match the documents written by earlier revisions
//! of the site, including their inconsistent casing.

use crate::audit::AuditEntry;
use crate::models::{AggregatedResult, EventRecord, PersonRecord, ScoreRecord, TestRecord};
use crate::{Error, Result};
use serde_json::Value;

use super::{DocumentStore, FilteredPage};

pub const EVENTS: &str = "events";
pub const USERS: &str = "Users";
pub const RESULTS: &str = "Results";
pub const SUMMARIES: &str = "ActualStudentResults";
pub const TESTS: &str = "Tests";
pub const LOGS: &str = "Logs";
pub const FORM_SUBMISSIONS: &str = "form-submissions";

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Events newest first
pub async fn list_events(store: &DocumentStore, limit: i64) -> Result<Vec<EventRecord>> {
    let docs = store.list_ordered_desc(EVENTS, "$.createdAt", limit).await?;
    docs.into_iter().map(decode::<EventRecord>).collect()
}

pub async fn get_event(store: &DocumentStore, id: &str) -> Result<EventRecord> {
    let doc = store
        .get(EVENTS, id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("event {id}")))?;
    decode(doc)
}

pub async fn put_event(store: &DocumentStore, event: &EventRecord) -> Result<()> {
    store.put(EVENTS, &event.id, &encode(event)?).await
}

pub async fn delete_event_doc(store: &DocumentStore, id: &str) -> Result<bool> {
    store.delete(EVENTS, id).await
}

// ---------------------------------------------------------------------------
// Roster and scores
// ---------------------------------------------------------------------------

/// Roster entries with role "student"
pub async fn list_students(store: &DocumentStore) -> Result<Vec<PersonRecord>> {
    let docs = store.find_equal(USERS, "$.role", "student").await?;
    docs.into_iter().map(decode::<PersonRecord>).collect()
}

/// Roster entry by sign-in email, any role
pub async fn find_user_by_email(store: &DocumentStore, email: &str) -> Result<Option<PersonRecord>> {
    match store.find_one(USERS, "$.email", email).await? {
        Some(doc) => Ok(Some(decode(doc)?)),
        None => Ok(None),
    }
}

/// All flat per-subject scores, in the order they were recorded
pub async fn list_scores(store: &DocumentStore) -> Result<Vec<ScoreRecord>> {
    let docs = store.list(RESULTS).await?;
    docs.into_iter().map(|(_, doc)| decode::<ScoreRecord>(doc)).collect()
}

// ---------------------------------------------------------------------------
// Aggregated summaries
// ---------------------------------------------------------------------------

pub async fn upsert_summary(store: &DocumentStore, summary: &AggregatedResult) -> Result<()> {
    store.put(SUMMARIES, &summary.doc_id, &encode(summary)?).await
}

/// Document ids of every aggregated summary
pub async fn list_summary_ids(store: &DocumentStore) -> Result<Vec<String>> {
    Ok(store
        .list(SUMMARIES)
        .await?
        .into_iter()
        .map(|(id, _)| id)
        .collect())
}

pub async fn get_summary(store: &DocumentStore, doc_id: &str) -> Result<Option<AggregatedResult>> {
    match store.get(SUMMARIES, doc_id).await? {
        Some(doc) => Ok(Some(decode(doc)?)),
        None => Ok(None),
    }
}

pub async fn delete_summary(store: &DocumentStore, doc_id: &str) -> Result<bool> {
    store.delete(SUMMARIES, doc_id).await
}

// ---------------------------------------------------------------------------
// Tests, logs, form submissions
// ---------------------------------------------------------------------------

/// Tests filtered by status, newest sitting first.
/// `degraded` is set when the composite index was missing.
pub struct TestsPage {
    pub tests: Vec<TestRecord>,
    pub degraded: bool,
}

pub async fn list_tests_by_status(store: &DocumentStore, status: &str) -> Result<TestsPage> {
    let FilteredPage { docs, degraded } = store
        .find_equal_ordered(TESTS, "$.status", status, "$.testDate", 100)
        .await?;
    let tests = docs
        .into_iter()
        .map(decode::<TestRecord>)
        .collect::<Result<Vec<_>>>()?;
    Ok(TestsPage { tests, degraded })
}

pub async fn append_log(store: &DocumentStore, entry: &AuditEntry) -> Result<()> {
    store.insert(LOGS, &encode(entry)?).await?;
    Ok(())
}

/// Recent audit entries, newest first
pub async fn recent_logs(store: &DocumentStore, limit: i64) -> Result<Vec<AuditEntry>> {
    let docs = store.list_ordered_desc(LOGS, "$.timestamp", limit).await?;
    docs.into_iter().map(decode::<AuditEntry>).collect()
}

/// Persist a form submission verbatim, returning the new document id
pub async fn insert_form_submission(store: &DocumentStore, body: &Value) -> Result<String> {
    store.insert(FORM_SUBMISSIONS, body).await
}

// ---------------------------------------------------------------------------

fn decode<T: serde::de::DeserializeOwned>(doc: Value) -> Result<T> {
    serde_json::from_value(doc).map_err(|e| Error::Internal(format!("Corrupt document: {e}")))
}

fn encode<T: serde::Serialize>(value: &T) -> Result<Value> {
    serde_json::to_value(value).map_err(|e| Error::Internal(format!("Encode failed: {e}")))
}
