//! prayas-forms - public form-submission endpoint

use anyhow::Result;
use clap::Parser;
use tracing::info;

use prayas_common::config::{ensure_root_folder, resolve_root_folder, ServiceConfig};
use prayas_common::db::{self, DocumentStore};
use prayas_forms::{build_router, AppState};

#[derive(Parser, Debug)]
#[command(name = "prayas-forms", about = "Prayas form-submission service")]
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

    info!("Starting prayas-forms v{}", env!("CARGO_PKG_VERSION"));

    let args = Args::parse();
    let root = resolve_root_folder(args.root_folder.as_deref(), "PRAYAS_ROOT");
    ensure_root_folder(&root)?;

    let config = ServiceConfig::load(&root)?;
    let port = args.port.unwrap_or(config.forms_port);

    let pool = db::connect(&ServiceConfig::database_path(&root)).await?;
    db::init_schema(&pool).await?;
    info!("✓ Connected to database");

    let state = AppState {
        store: DocumentStore::new(pool),
    };
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port)).await?;
    info!("prayas-forms listening on http://127.0.0.1:{port}");

    axum::serve(listener, app).await?;

    Ok(())
}
