//! Remote object store client
//!
//! Stores image blobs by key and returns a public download URL, or
//! fails. Uploads carry the content type and a one-year cache-control
//! header; the ingestion pipeline decides what a failure means.

use chrono::Utc;
use futures::future::BoxFuture;
use prayas_common::{Error, Result};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use uuid::Uuid;

const CACHE_CONTROL_ONE_YEAR: &str = "public, max-age=31536000";

/// Blob storage seam. Implemented over HTTP in production and by fakes
/// in tests.
pub trait ObjectStore: Send + Sync {
    /// Store bytes under `key`, returning the public URL
    fn put(&self, key: String, bytes: Vec<u8>, content_type: String) -> BoxFuture<'static, Result<String>>;

    /// Best-effort delete of the object at `key`
    fn delete(&self, key: String) -> BoxFuture<'static, Result<()>>;
}

/// Object store client over plain HTTP (PUT/DELETE `{base}/{key}`)
pub struct HttpObjectStore {
    client: reqwest::Client,
    base_url: String,
    public_url: String,
}

impl HttpObjectStore {
    pub fn new(base_url: String, public_url: String, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Storage(format!("HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            public_url: public_url.trim_end_matches('/').to_string(),
        })
    }
}

impl ObjectStore for HttpObjectStore {
    fn put(&self, key: String, bytes: Vec<u8>, content_type: String) -> BoxFuture<'static, Result<String>> {
        let client = self.client.clone();
        let url = format!("{}/{}", self.base_url, key);
        let public = format!("{}/{}", self.public_url, key);

        Box::pin(async move {
            let response = client
                .put(&url)
                .header(reqwest::header::CONTENT_TYPE, content_type)
                .header(reqwest::header::CACHE_CONTROL, CACHE_CONTROL_ONE_YEAR)
                .body(bytes)
                .send()
                .await
                .map_err(|e| Error::Storage(format!("Upload failed: {e}")))?;

            if !response.status().is_success() {
                return Err(Error::Storage(format!(
                    "Upload rejected with status {}",
                    response.status()
                )));
            }
            Ok(public)
        })
    }

    fn delete(&self, key: String) -> BoxFuture<'static, Result<()>> {
        let client = self.client.clone();
        let url = format!("{}/{}", self.base_url, key);

        Box::pin(async move {
            let response = client
                .delete(&url)
                .send()
                .await
                .map_err(|e| Error::Storage(format!("Delete failed: {e}")))?;

            // 404 counts as deleted; the blob is gone either way
            if !response.status().is_success() && response.status().as_u16() != 404 {
                return Err(Error::Storage(format!(
                    "Delete rejected with status {}",
                    response.status()
                )));
            }
            Ok(())
        })
    }
}

// ---------------------------------------------------------------------------
// Key layout
// ---------------------------------------------------------------------------

/// Key for an event image: `events/<uuid>-<epoch-ms>.<ext>`
pub fn event_image_key(file_name: &str) -> String {
    format!(
        "events/{}-{}.{}",
        Uuid::new_v4(),
        Utc::now().timestamp_millis(),
        extension_of(file_name)
    )
}

/// Key for a profile picture: `profilePics/<name>_<role>_<yyyy-mm-dd>.<ext>`
pub fn profile_pic_key(name: &str, role: &str, file_name: &str) -> String {
    format!(
        "profilePics/{}_{}_{}.{}",
        name.trim().replace([' ', '/'], "-"),
        role.trim(),
        Utc::now().format("%Y-%m-%d"),
        extension_of(file_name)
    )
}

/// Original file extension, lowercased; "jpg" when the name has none
fn extension_of(file_name: &str) -> String {
    file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| !ext.is_empty() && ext.len() <= 5)
        .unwrap_or_else(|| "jpg".to_string())
}

// ---------------------------------------------------------------------------
// Ephemeral preview cache
// ---------------------------------------------------------------------------

/// Blob parked in memory when durable upload failed
#[derive(Clone)]
pub struct PreviewBlob {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// In-memory home of local-fallback images.
///
/// The server-session equivalent of a browser object URL: entries are
/// addressable at `/preview/<id>` until the process restarts, and are
/// never durable or visible to other instances.
#[derive(Clone, Default)]
pub struct PreviewCache {
    blobs: Arc<RwLock<HashMap<Uuid, PreviewBlob>>>,
}

impl PreviewCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Park a blob, returning its ephemeral preview URL
    pub fn park(&self, content_type: String, bytes: Vec<u8>) -> String {
        let id = Uuid::new_v4();
        self.blobs
            .write()
            .expect("preview lock poisoned")
            .insert(id, PreviewBlob { content_type, bytes });
        format!("/preview/{id}")
    }

    pub fn get(&self, id: Uuid) -> Option<PreviewBlob> {
        self.blobs
            .read()
            .expect("preview lock poisoned")
            .get(&id)
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_image_key_layout() {
        let key = event_image_key("banner.PNG");
        assert!(key.starts_with("events/"));
        assert!(key.ends_with(".png"));
        // uuid + '-' + epoch-ms between prefix and extension
        let middle = &key["events/".len()..key.len() - ".png".len()];
        assert!(middle.len() > 36, "expected uuid plus timestamp, got {middle}");
    }

    #[test]
    fn missing_extension_defaults_to_jpg() {
        assert!(event_image_key("camera-dump").ends_with(".jpg"));
    }

    #[test]
    fn profile_pic_key_replaces_spaces_in_name() {
        let key = profile_pic_key("Ravi Kumar", "teacher", "photo.jpeg");
        assert!(key.starts_with("profilePics/Ravi-Kumar_teacher_"));
        assert!(key.ends_with(".jpeg"));
    }

    #[test]
    fn preview_cache_round_trip() {
        let cache = PreviewCache::new();
        let url = cache.park("image/png".into(), vec![1, 2, 3]);

        let id: Uuid = url.strip_prefix("/preview/").unwrap().parse().unwrap();
        let blob = cache.get(id).expect("blob should be parked");
        assert_eq!(blob.bytes, vec![1, 2, 3]);
        assert_eq!(blob.content_type, "image/png");
        assert!(cache.get(Uuid::new_v4()).is_none());
    }
}
