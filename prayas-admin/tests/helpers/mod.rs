//! Shared test doubles and setup for the integration suites
// Not every suite uses every helper
#![allow(dead_code)]

use futures::future::BoxFuture;
use std::sync::{Arc, Mutex};

use prayas_admin::db::{self, DocumentStore};
use prayas_admin::identity::IdentityProvider;
use prayas_admin::ingest::UrlProber;
use prayas_admin::storage::{ObjectStore, PreviewCache};
use prayas_admin::AppState;
use prayas_common::audit::AuditSink;
use prayas_common::db::collections;
use prayas_common::session::SessionContext;
use prayas_common::{Error, Result};

/// Object store double that records keys and can be told to fail
#[derive(Default)]
pub struct FakeObjectStore {
    pub puts: Arc<Mutex<Vec<String>>>,
    pub deletes: Arc<Mutex<Vec<String>>>,
    pub fail_puts: bool,
    pub fail_deletes: bool,
}

impl FakeObjectStore {
    pub fn failing_puts() -> Self {
        Self { fail_puts: true, ..Default::default() }
    }

    pub fn put_count(&self) -> usize {
        self.puts.lock().unwrap().len()
    }

    pub fn deleted_keys(&self) -> Vec<String> {
        self.deletes.lock().unwrap().clone()
    }
}

impl ObjectStore for FakeObjectStore {
    fn put(&self, key: String, _bytes: Vec<u8>, _content_type: String) -> BoxFuture<'static, Result<String>> {
        let fail = self.fail_puts;
        let puts = self.puts.clone();
        Box::pin(async move {
            if fail {
                return Err(Error::Storage("simulated store outage".to_string()));
            }
            puts.lock().unwrap().push(key.clone());
            Ok(format!("https://cdn.test/{key}"))
        })
    }

    fn delete(&self, key: String) -> BoxFuture<'static, Result<()>> {
        let fail = self.fail_deletes;
        let deletes = self.deletes.clone();
        Box::pin(async move {
            if fail {
                return Err(Error::Storage("simulated delete failure".to_string()));
            }
            deletes.lock().unwrap().push(key);
            Ok(())
        })
    }
}

/// URL prober double: loadable when the path looks like an image file
pub struct FakeProber;

impl UrlProber for FakeProber {
    fn probe(&self, url: String) -> BoxFuture<'static, Result<String>> {
        Box::pin(async move {
            if url.ends_with(".png") || url.ends_with(".jpg") {
                Ok("image/png".to_string())
            } else {
                Err(Error::InvalidInput(format!("{url} is not an image")))
            }
        })
    }
}

/// Identity double accepting exactly one credential pair
pub struct FakeIdentity {
    pub email: String,
    pub password: String,
}

impl IdentityProvider for FakeIdentity {
    fn sign_in(&self, email: String, password: String) -> BoxFuture<'static, Result<String>> {
        let ok = email == self.email && password == self.password;
        Box::pin(async move {
            if ok {
                Ok("uid-test-1".to_string())
            } else {
                Err(Error::Identity("Invalid email or password".to_string()))
            }
        })
    }
}

/// App state over an in-memory database and the fakes above
pub async fn test_state(objects: FakeObjectStore) -> AppState {
    let pool = db::connect_in_memory().await.expect("in-memory pool");
    let store = DocumentStore::new(pool);

    let audit_store = store.clone();
    let audit = AuditSink::spawn(move |entry| {
        let store = audit_store.clone();
        async move { collections::append_log(&store, &entry).await }
    });

    AppState {
        store,
        objects: Arc::new(objects),
        previews: PreviewCache::new(),
        prober: Arc::new(FakeProber),
        identity: Arc::new(FakeIdentity {
            email: "admin@prayas.example".to_string(),
            password: "secret123".to_string(),
        }),
        sessions: SessionContext::new(),
        audit,
    }
}

/// Issue a session token directly, bypassing the identity provider
pub fn signed_in_token(state: &AppState) -> uuid::Uuid {
    state
        .sessions
        .sign_in("Test Admin".to_string(), "admin".to_string(), "admin@prayas.example".to_string())
}
