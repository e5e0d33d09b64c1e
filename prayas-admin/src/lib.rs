//! prayas-admin library - admin/teacher console backend
//!
//! Everything the console needs behind HTTP: the document store, the
//! remote object store client, the image ingestion pipeline, the result
//! aggregation job, audit logging, and session-scoped auth.

use axum::middleware;
use axum::routing::{delete, get, post, put};
use axum::Router;
use std::sync::Arc;

use prayas_common::audit::AuditSink;
use prayas_common::session::SessionContext;

pub mod aggregate;
pub mod api;
pub mod identity;
pub mod ingest;
pub mod storage;

pub use prayas_common::db;

use db::DocumentStore;
use identity::IdentityProvider;
use ingest::UrlProber;
use storage::{ObjectStore, PreviewCache};

/// Application state shared across HTTP handlers.
///
/// Session/role state is injected through here rather than read from
/// ambient globals; anything that needs the signed-in identity takes it
/// from the request extensions the auth middleware fills in.
#[derive(Clone)]
pub struct AppState {
    pub store: DocumentStore,
    pub objects: Arc<dyn ObjectStore>,
    pub previews: PreviewCache,
    pub prober: Arc<dyn UrlProber>,
    pub identity: Arc<dyn IdentityProvider>,
    pub sessions: SessionContext,
    pub audit: AuditSink,
}

/// Build application router.
///
/// Reads used by the public site (events, tests, previews, health) are
/// open; every mutating route requires a session token.
pub fn build_router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/api/events", post(api::events::create_event))
        .route(
            "/api/events/:id",
            put(api::events::update_event).delete(api::events::delete_event),
        )
        .route("/api/events/:id/images/:index", delete(api::events::remove_event_image))
        .route("/api/images", post(api::events::upload_image))
        .route("/api/images/from-urls", post(api::events::add_images_from_urls))
        .route("/api/results/aggregate", post(api::results::run_aggregation))
        .route("/api/results/delete-all", post(api::results::delete_all))
        .route("/api/logs", get(api::logs::recent))
        .route("/api/auth/signout", post(api::auth::sign_out))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api::require_session,
        ));

    let public = Router::new()
        .route("/api/events", get(api::events::list_events))
        .route("/api/tests", get(api::schedule::list_tests))
        .route("/api/auth/signin", post(api::auth::sign_in))
        .route("/preview/:id", get(api::events::serve_preview))
        .merge(api::health::routes());

    Router::new()
        .merge(protected)
        .merge(public)
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}
