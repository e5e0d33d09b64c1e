//! prayas-admin - Admin/teacher console backend
//!
//! Events with image ingestion, the student result aggregation job,
//! audit logging and session auth, served over HTTP for the console UI.

use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

use prayas_admin::db::{self, collections, DocumentStore};
use prayas_admin::identity::HttpIdentityProvider;
use prayas_admin::ingest::HttpUrlProber;
use prayas_admin::storage::{HttpObjectStore, PreviewCache};
use prayas_admin::{build_router, AppState};
use prayas_common::audit::AuditSink;
use prayas_common::config::{ensure_root_folder, resolve_root_folder, ServiceConfig};
use prayas_common::session::SessionContext;

#[derive(Parser, Debug)]
#[command(name = "prayas-admin", about = "Prayas admin console backend")]
struct Args {
    /// Root folder holding the database and config.toml
    #[arg(long)]
    root_folder: Option<String>,

    /// Override the bind port from config.toml
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("Starting prayas-admin v{}", env!("CARGO_PKG_VERSION"));

    let args = Args::parse();
    let root = resolve_root_folder(args.root_folder.as_deref(), "PRAYAS_ROOT");
    ensure_root_folder(&root)?;
    info!("Root folder: {}", root.display());

    let config = ServiceConfig::load(&root)?;
    let port = args.port.unwrap_or(config.admin_port);

    let db_path = ServiceConfig::database_path(&root);
    let pool = match db::connect(&db_path).await {
        Ok(pool) => {
            info!("✓ Connected to database at {}", db_path.display());
            pool
        }
        Err(e) => {
            error!("Failed to connect to database: {}", e);
            return Err(e.into());
        }
    };
    db::init_schema(&pool).await?;

    let store = DocumentStore::new(pool);

    // Audit writer drains the sink into the Logs collection; its
    // failures never reach the handlers that emitted the entries
    let audit_store = store.clone();
    let audit = AuditSink::spawn(move |entry| {
        let store = audit_store.clone();
        async move { collections::append_log(&store, &entry).await }
    });

    let storage_timeout = Duration::from_secs(config.storage_timeout_secs);
    let state = AppState {
        store,
        objects: Arc::new(HttpObjectStore::new(
            config.object_store_url.clone(),
            config.object_public_url.clone(),
            storage_timeout,
        )?),
        previews: PreviewCache::new(),
        prober: Arc::new(HttpUrlProber::new(Duration::from_secs(
            config.url_probe_timeout_secs,
        ))?),
        identity: Arc::new(HttpIdentityProvider::new(
            config.identity_url.clone(),
            storage_timeout,
        )?),
        sessions: SessionContext::new(),
        audit,
    };
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port)).await?;
    info!("prayas-admin listening on http://127.0.0.1:{port}");
    info!("Health check: http://127.0.0.1:{port}/health");

    axum::serve(listener, app).await?;

    Ok(())
}
