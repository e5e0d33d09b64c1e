//! Injected session context
//!
//! Signed-in identity (display name + authorization role) lives in one
//! shared context object handed to every handler that needs it, instead
//! of ambient reads from global storage. Auth-state changes are
//! published on an explicit watch channel; subscribers register and
//! unregister deterministically rather than listening on a global
//! event bus.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tokio::sync::watch;
use uuid::Uuid;

/// One signed-in session
#[derive(Debug, Clone)]
pub struct Session {
    pub token: Uuid,
    pub name: String,
    pub role: String,
    pub email: String,
}

/// Auth-state change notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthChange {
    /// Initial state before any sign-in/out has happened
    Idle,
    SignedIn { name: String, role: String },
    SignedOut { name: String },
}

/// Shared session store + auth-change publisher
#[derive(Clone)]
pub struct SessionContext {
    sessions: Arc<RwLock<HashMap<Uuid, Session>>>,
    tx: Arc<watch::Sender<AuthChange>>,
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionContext {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(AuthChange::Idle);
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            tx: Arc::new(tx),
        }
    }

    /// Record a successful sign-in, issue a session token, and publish
    /// the change to subscribers.
    pub fn sign_in(&self, name: String, role: String, email: String) -> Uuid {
        let token = Uuid::new_v4();
        let session = Session {
            token,
            name: name.clone(),
            role: role.clone(),
            email,
        };
        self.sessions
            .write()
            .expect("session lock poisoned")
            .insert(token, session);
        // send_replace: delivery is best-effort, absence of subscribers is fine
        self.tx.send_replace(AuthChange::SignedIn { name, role });
        token
    }

    /// Drop the session for `token`, publishing the change when it existed
    pub fn sign_out(&self, token: Uuid) -> bool {
        let removed = self
            .sessions
            .write()
            .expect("session lock poisoned")
            .remove(&token);
        match removed {
            Some(session) => {
                self.tx
                    .send_replace(AuthChange::SignedOut { name: session.name });
                true
            }
            None => false,
        }
    }

    /// Look up the session for a presented token
    pub fn get(&self, token: Uuid) -> Option<Session> {
        self.sessions
            .read()
            .expect("session lock poisoned")
            .get(&token)
            .cloned()
    }

    /// Subscribe to auth-state changes. Dropping the receiver
    /// unregisters the subscriber.
    pub fn subscribe(&self) -> watch::Receiver<AuthChange> {
        self.tx.subscribe()
    }
}
