//! Database access layer shared by the Prayas services
//!
//! A single SQLite file models the hosted document database: every
//! collection is a set of JSON documents in one `documents` table.

use crate::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool};
use std::path::Path;
use tracing::info;

mod store;
pub use store::{DocumentStore, FilteredPage};

pub mod collections;

/// Connect to the database file, creating it on first start
pub async fn connect(db_path: &Path) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true);

    let pool = SqlitePool::connect_with(options).await?;
    Ok(pool)
}

/// Create the documents table and its indexes. Idempotent.
pub async fn init_schema(pool: &SqlitePool) -> Result<()> {
    info!("Initializing document schema");

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS documents (
            collection TEXT NOT NULL,
            doc_id     TEXT NOT NULL,
            body       TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            PRIMARY KEY (collection, doc_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_documents_collection ON documents(collection)")
        .execute(pool)
        .await?;

    // Composite index backing the filtered-and-ordered tests listing.
    // The query path checks for this index by name and degrades to an
    // unordered filter when it is absent.
    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_documents_status_test_date
        ON documents(collection, json_extract(body, '$.status'), json_extract(body, '$.testDate'))
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// In-memory pool for tests.
///
/// Capped at one connection: each `:memory:` connection is its own
/// database, so a larger pool would scatter writes.
pub async fn connect_in_memory() -> Result<SqlitePool> {
    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;
    init_schema(&pool).await?;
    Ok(pool)
}
