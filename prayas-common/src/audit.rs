//! Audit trail sink
//!
//! Every user-triggered write (event create/update/delete, result sync,
//! delete-all) appends an entry to the audit log collection. The append
//! is fire-and-forget relative to the primary operation: entries go
//! through an unbounded channel to a spawned writer task, and a writer
//! failure is logged locally, never propagated to the caller.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::future::Future;
use tokio::sync::mpsc;
use tracing::warn;

/// One append-only audit record (who, what, when, from where)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    pub actor: String,
    pub role: String,
    pub device_class: String,
    pub browser_family: String,
    pub ip: String,
    pub timestamp: DateTime<Utc>,
    /// Free-text action description, e.g. "Deleted event 'Annual Day'"
    pub action: String,
}

impl AuditEntry {
    /// Build an entry from request context, classifying the user agent
    pub fn new(actor: &str, role: &str, user_agent: &str, ip: &str, action: String) -> Self {
        Self {
            actor: actor.to_string(),
            role: role.to_string(),
            device_class: classify_device(user_agent).to_string(),
            browser_family: classify_browser(user_agent).to_string(),
            ip: ip.to_string(),
            timestamp: Utc::now(),
            action,
        }
    }
}

/// Coarse device class from a User-Agent string
pub fn classify_device(user_agent: &str) -> &'static str {
    let ua = user_agent.to_ascii_lowercase();
    if ua.contains("ipad") || ua.contains("tablet") {
        "tablet"
    } else if ua.contains("mobi") || ua.contains("android") || ua.contains("iphone") {
        "mobile"
    } else if ua.is_empty() {
        "unknown"
    } else {
        "desktop"
    }
}

/// Browser family from a User-Agent string.
///
/// Order matters: Edge and Chrome both advertise "Chrome", and
/// Chrome advertises "Safari".
pub fn classify_browser(user_agent: &str) -> &'static str {
    let ua = user_agent.to_ascii_lowercase();
    if ua.contains("edg/") || ua.contains("edge") {
        "Edge"
    } else if ua.contains("opr/") || ua.contains("opera") {
        "Opera"
    } else if ua.contains("chrome") || ua.contains("crios") {
        "Chrome"
    } else if ua.contains("firefox") || ua.contains("fxios") {
        "Firefox"
    } else if ua.contains("safari") {
        "Safari"
    } else {
        "other"
    }
}

/// Cloneable handle for emitting audit entries.
///
/// `emit` never blocks and never fails from the caller's perspective;
/// if the writer task is gone the entry is dropped with a local warning.
#[derive(Clone)]
pub struct AuditSink {
    tx: mpsc::UnboundedSender<AuditEntry>,
}

impl AuditSink {
    /// Spawn the writer task and return the emit handle.
    ///
    /// `write` persists one entry (typically into the "Logs" collection).
    /// Its errors are swallowed after a local warning so audit problems
    /// can never block or roll back a primary write.
    pub fn spawn<F, Fut>(mut write: F) -> Self
    where
        F: FnMut(AuditEntry) -> Fut + Send + 'static,
        Fut: Future<Output = crate::Result<()>> + Send,
    {
        let (tx, mut rx) = mpsc::unbounded_channel::<AuditEntry>();

        tokio::spawn(async move {
            while let Some(entry) = rx.recv().await {
                if let Err(e) = write(entry.clone()).await {
                    warn!("Audit write failed (entry dropped): {} [{}]", e, entry.action);
                }
            }
        });

        Self { tx }
    }

    /// Sink that drops every entry. For services and tests that have no
    /// audit collection behind them.
    pub fn disabled() -> Self {
        let (tx, _rx) = mpsc::unbounded_channel();
        Self { tx }
    }

    /// Queue an entry for the writer task. Fire-and-forget.
    pub fn emit(&self, entry: AuditEntry) {
        if self.tx.send(entry).is_err() {
            warn!("Audit sink closed, entry dropped");
        }
    }
}
