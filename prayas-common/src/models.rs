//! Domain document models
//!
//! These structs mirror the JSON documents stored in the document
//! database collections. Field names stay camelCase on the wire so
//! documents written by earlier revisions of the site remain readable.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One image attached to an event.
///
/// `path` is set only when the blob was durably persisted to the remote
/// object store. A fallback record (`is_local_fallback = true`) carries
/// an ephemeral preview URL that is valid only for the current server
/// session and is never visible to other users.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ImageRecord {
    pub url: String,
    /// Object store key, None for fallback and external-URL images
    pub path: Option<String>,
    pub name: String,
    pub content_type: String,
    #[serde(default)]
    pub is_local_fallback: bool,
    /// True when the image was added by URL and is never owned
    /// (or deleted) by this system
    #[serde(default)]
    pub is_external_url: bool,
    pub uploaded_at: DateTime<Utc>,
}

/// Visual emphasis label attached to an event
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Badge {
    #[default]
    None,
    Featured,
    Important,
    New,
    Urgent,
}

/// An institution-published announcement/happening record.
///
/// Invariant enforced at the API boundary: `images` is non-empty and
/// `title`/`date` are non-blank before a create/update is accepted.
/// The first image is the designated cover; `image` mirrors
/// `images[0].url` for older documents that stored a single string.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRecord {
    pub id: String,
    pub title: String,
    /// Display string, not parsed (e.g. "14 Aug 2026")
    pub date: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub description: String,
    pub images: Vec<ImageRecord>,
    /// Backward-compatibility mirror of `images[0].url`
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub badge: Badge,
    #[serde(default)]
    pub featured: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Roster entry ("Users" collection). Read-only input to aggregation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonRecord {
    pub name: String,
    #[serde(default)]
    pub class: String,
    #[serde(default)]
    pub batch: String,
    pub role: String,
    #[serde(default)]
    pub email: String,
}

/// One per-subject score ("Results" collection) — one record per
/// (person, test, subject), not yet grouped.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreRecord {
    pub name: String,
    pub class: String,
    pub subject: String,
    pub marks: f64,
    pub out_of: f64,
    #[serde(default)]
    pub remarks: String,
    #[serde(default)]
    pub test_date: String,
    pub created_at: DateTime<Utc>,
}

/// One subject entry inside an aggregated summary document
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SubjectResult {
    pub subject: String,
    pub marks: f64,
    pub out_of: f64,
    #[serde(default)]
    pub remarks: String,
    #[serde(default)]
    pub test_date: String,
    pub added_at: DateTime<Utc>,
}

/// Denormalized per-student summary ("ActualStudentResults" collection).
///
/// `doc_id` is derived deterministically from (name, class, batch) so
/// re-running aggregation overwrites rather than duplicates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedResult {
    pub doc_id: String,
    pub name: String,
    pub class: String,
    pub batch: String,
    pub results: Vec<SubjectResult>,
}

impl AggregatedResult {
    /// Derive the deterministic summary document key.
    ///
    /// Components are trimmed and joined with underscores; `/` is not a
    /// legal document-id character in the hosted database, so it is
    /// replaced. Spaces are kept ("Asha_Class 9_Lakshya").
    pub fn derive_doc_id(name: &str, class: &str, batch: &str) -> String {
        fn sanitize(part: &str) -> String {
            part.trim().replace('/', "-")
        }
        format!("{}_{}_{}", sanitize(name), sanitize(class), sanitize(batch))
    }
}

/// A scheduled or completed test ("Tests" collection)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestRecord {
    pub id: String,
    pub title: String,
    pub class: String,
    pub subject: String,
    /// ISO date of the sitting (sortable as a string)
    pub test_date: String,
    /// "scheduled" or "completed"
    pub status: String,
    pub created_at: DateTime<Utc>,
}
