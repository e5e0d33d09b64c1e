//! Event image ingestion pipeline
//!
//! Takes a batch of device files and/or user-supplied URLs, validates
//! each, uploads or degrades gracefully, and produces an ordered list
//! of image records to attach to an event. Files are processed one at
//! a time so the success/fallback/failure counts reported to the user
//! are deterministic and attributable in input order.

use chrono::Utc;
use futures::future::BoxFuture;
use prayas_common::models::{EventRecord, ImageRecord};
use prayas_common::{Error, Result};
use std::time::Duration;
use tracing::{info, warn};

use crate::storage::{event_image_key, ObjectStore, PreviewCache};

/// Hard size cap per device file: 5 MiB, not retried
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// One file handed to the pipeline
#[derive(Debug, Clone)]
pub struct DeviceFile {
    pub name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Per-file result of one ingestion pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    /// Durably stored; the record carries both url and storage key
    Uploaded,
    /// Store failed; the record carries an ephemeral preview URL valid
    /// only for this server session
    LocalFallback,
    /// Validation failed; nothing was uploaded and no record was added
    Rejected(String),
}

#[derive(Debug, Clone)]
pub struct FileOutcome {
    pub file_name: String,
    pub outcome: UploadOutcome,
}

/// Ordered records plus per-file outcomes, outcomes in input order
#[derive(Debug, Default)]
pub struct IngestReport {
    pub records: Vec<ImageRecord>,
    pub outcomes: Vec<FileOutcome>,
}

impl IngestReport {
    pub fn uploaded(&self) -> usize {
        self.count(|o| matches!(o, UploadOutcome::Uploaded))
    }

    pub fn fallbacks(&self) -> usize {
        self.count(|o| matches!(o, UploadOutcome::LocalFallback))
    }

    pub fn rejected(&self) -> usize {
        self.count(|o| matches!(o, UploadOutcome::Rejected(_)))
    }

    fn count(&self, pred: impl Fn(&UploadOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(&o.outcome)).count()
    }
}

/// Ingest a batch of device files, strictly sequentially.
///
/// Validation failures are per-file and never fatal to the batch. A
/// store failure degrades to a local fallback: the event stays
/// saveable, the image just will not survive a restart. This is a
/// deliberate availability-over-durability tradeoff.
pub async fn ingest_files(
    store: &dyn ObjectStore,
    previews: &PreviewCache,
    files: Vec<DeviceFile>,
) -> IngestReport {
    let mut report = IngestReport::default();

    for file in files {
        let outcome = ingest_one(store, previews, &file, &mut report.records).await;
        if let UploadOutcome::Rejected(reason) = &outcome {
            warn!("Rejected image '{}': {}", file.name, reason);
        }
        report.outcomes.push(FileOutcome {
            file_name: file.name,
            outcome,
        });
    }

    info!(
        "Image ingestion: {} uploaded, {} local fallback, {} rejected",
        report.uploaded(),
        report.fallbacks(),
        report.rejected()
    );
    report
}

async fn ingest_one(
    store: &dyn ObjectStore,
    previews: &PreviewCache,
    file: &DeviceFile,
    records: &mut Vec<ImageRecord>,
) -> UploadOutcome {
    if !file.content_type.starts_with("image/") {
        return UploadOutcome::Rejected(format!(
            "'{}' is not an image (type {})",
            file.name, file.content_type
        ));
    }
    if file.bytes.len() > MAX_IMAGE_BYTES {
        return UploadOutcome::Rejected(format!(
            "'{}' exceeds the 5 MB size limit",
            file.name
        ));
    }

    let key = event_image_key(&file.name);
    match store
        .put(key.clone(), file.bytes.clone(), file.content_type.clone())
        .await
    {
        Ok(url) => {
            records.push(ImageRecord {
                url,
                path: Some(key),
                name: file.name.clone(),
                content_type: file.content_type.clone(),
                is_local_fallback: false,
                is_external_url: false,
                uploaded_at: Utc::now(),
            });
            UploadOutcome::Uploaded
        }
        Err(e) => {
            warn!("Upload of '{}' failed, keeping local preview: {}", file.name, e);
            let url = previews.park(file.content_type.clone(), file.bytes.clone());
            records.push(ImageRecord {
                url,
                path: None,
                name: file.name.clone(),
                content_type: file.content_type.clone(),
                is_local_fallback: true,
                is_external_url: false,
                uploaded_at: Utc::now(),
            });
            UploadOutcome::LocalFallback
        }
    }
}

// ---------------------------------------------------------------------------
// URL ingestion
// ---------------------------------------------------------------------------

/// Loadability probe for an external image URL.
///
/// Production implementation fetches the URL with a bounded timeout and
/// requires an image content type; tests substitute a fake.
pub trait UrlProber: Send + Sync {
    /// Returns the content type when the URL serves a loadable image
    fn probe(&self, url: String) -> BoxFuture<'static, Result<String>>;
}

/// Probe via HTTP GET with a bounded timeout (10 s by default; the
/// source had none, a bound avoids indefinite hangs)
pub struct HttpUrlProber {
    client: reqwest::Client,
}

impl HttpUrlProber {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Internal(format!("HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

impl UrlProber for HttpUrlProber {
    fn probe(&self, url: String) -> BoxFuture<'static, Result<String>> {
        let client = self.client.clone();
        Box::pin(async move {
            let response = client
                .get(&url)
                .send()
                .await
                .map_err(|e| Error::InvalidInput(format!("Could not load {url}: {e}")))?;

            if !response.status().is_success() {
                return Err(Error::InvalidInput(format!(
                    "{url} answered with status {}",
                    response.status()
                )));
            }

            let content_type = response
                .headers()
                .get(reqwest::header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("")
                .to_string();
            if !content_type.starts_with("image/") {
                return Err(Error::InvalidInput(format!(
                    "{url} is not an image (type {content_type})"
                )));
            }
            Ok(content_type)
        })
    }
}

/// Records plus collected per-URL failure messages
#[derive(Debug, Default)]
pub struct UrlIngestReport {
    pub records: Vec<ImageRecord>,
    pub failures: Vec<String>,
}

/// Ingest a newline-separated batch of external image URLs.
///
/// Empty lines are dropped; a failing URL is reported and does not
/// abort the rest. External images are never owned by the store
/// (`path` stays None) and are never deleted by this system.
pub async fn ingest_urls(prober: &dyn UrlProber, raw: &str) -> UrlIngestReport {
    let mut report = UrlIngestReport::default();

    for line in split_url_lines(raw) {
        let parsed = match validate_url(&line) {
            Ok(parsed) => parsed,
            Err(e) => {
                report.failures.push(e.to_string());
                continue;
            }
        };

        match prober.probe(line.clone()).await {
            Ok(content_type) => report.records.push(ImageRecord {
                url: line.clone(),
                path: None,
                name: url_display_name(&parsed),
                content_type,
                is_local_fallback: false,
                is_external_url: true,
                uploaded_at: Utc::now(),
            }),
            Err(e) => report.failures.push(e.to_string()),
        }
    }

    if !report.failures.is_empty() {
        warn!("{} image URL(s) failed validation", report.failures.len());
    }
    report
}

/// Split a possibly multi-line URL entry, trimming and dropping empties
fn split_url_lines(raw: &str) -> Vec<String> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

fn validate_url(candidate: &str) -> Result<reqwest::Url> {
    let parsed = reqwest::Url::parse(candidate)
        .map_err(|_| Error::InvalidInput(format!("'{candidate}' is not a valid URL")))?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(Error::InvalidInput(format!(
            "'{candidate}' has unsupported scheme '{other}'"
        ))),
    }
}

/// Display name for an external image: last path segment, else the host
fn url_display_name(url: &reqwest::Url) -> String {
    url.path_segments()
        .and_then(|segments| segments.last())
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| url.host_str().unwrap_or("external image").to_string())
}

// ---------------------------------------------------------------------------
// Removal
// ---------------------------------------------------------------------------

/// Remove one image from an event's list.
///
/// The backing object is deleted best-effort (only when `path` is set);
/// a failed remote delete is logged, not surfaced — the record leaves
/// the list regardless.
pub async fn remove_image(
    store: &dyn ObjectStore,
    event: &mut EventRecord,
    index: usize,
) -> Result<ImageRecord> {
    if index >= event.images.len() {
        return Err(Error::InvalidInput(format!(
            "image index {index} out of range"
        )));
    }

    let removed = event.images.remove(index);
    if let Some(path) = &removed.path {
        if let Err(e) = store.delete(path.clone()).await {
            warn!("Best-effort delete of {} failed: {}", path, e);
        }
    }
    event.image = event.images.first().map(|i| i.url.clone()).unwrap_or_default();
    Ok(removed)
}

/// Best-effort delete of every stored blob an event owns.
///
/// Per-image failures do not block the caller from deleting the event
/// document; orphaned blobs are an accepted failure mode.
pub async fn delete_event_blobs(store: &dyn ObjectStore, event: &EventRecord) {
    for image in &event.images {
        if let Some(path) = &image.path {
            if let Err(e) = store.delete(path.clone()).await {
                warn!("Orphaning blob {} (delete failed: {})", path, e);
            }
        }
    }
}
