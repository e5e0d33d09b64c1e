//! Generic document store operations
//!
//! Put/get/delete/query over JSON document bodies, mirroring the query
//! surface the site actually uses against the hosted database:
//! equality filters on a field, order-by-field descending, limit-N.

use crate::{Error, Result};
use serde_json::Value;
use sqlx::{Row, SqlitePool};
use tracing::warn;
use uuid::Uuid;

/// Name of the composite index backing filter+order queries.
///
/// When this index is missing the hosted database refuses the combined
/// query, so the store degrades to the plain equality filter and flags
/// the page for a user-visible warning banner.
const FILTER_ORDER_INDEX: &str = "idx_documents_status_test_date";

/// Result page of a filtered query
#[derive(Debug)]
pub struct FilteredPage {
    pub docs: Vec<Value>,
    /// True when the composite index was absent and ordering was skipped
    pub degraded: bool,
}

/// Handle over the documents table
#[derive(Clone)]
pub struct DocumentStore {
    pool: SqlitePool,
}

impl DocumentStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Upsert a document (overwrite-on-conflict, not merge).
    /// `created_at` is preserved across overwrites.
    pub async fn put(&self, collection: &str, doc_id: &str, body: &Value) -> Result<()> {
        let now = chrono::Utc::now().to_rfc3339();
        sqlx::query(
            r#"
            INSERT INTO documents (collection, doc_id, body, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT (collection, doc_id)
            DO UPDATE SET body = excluded.body, updated_at = excluded.updated_at
            "#,
        )
        .bind(collection)
        .bind(doc_id)
        .bind(body.to_string())
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Insert a document under a generated id, returning the id
    pub async fn insert(&self, collection: &str, body: &Value) -> Result<String> {
        let doc_id = Uuid::new_v4().to_string();
        self.put(collection, &doc_id, body).await?;
        Ok(doc_id)
    }

    pub async fn get(&self, collection: &str, doc_id: &str) -> Result<Option<Value>> {
        let row = sqlx::query("SELECT body FROM documents WHERE collection = ? AND doc_id = ?")
            .bind(collection)
            .bind(doc_id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(Some(parse_body(row.get::<String, _>("body"))?)),
            None => Ok(None),
        }
    }

    /// Delete one document; returns whether it existed
    pub async fn delete(&self, collection: &str, doc_id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM documents WHERE collection = ? AND doc_id = ?")
            .bind(collection)
            .bind(doc_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// All documents in a collection, insertion order, with their ids
    pub async fn list(&self, collection: &str) -> Result<Vec<(String, Value)>> {
        let rows = sqlx::query(
            "SELECT doc_id, body FROM documents WHERE collection = ? ORDER BY rowid",
        )
        .bind(collection)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| Ok((row.get::<String, _>("doc_id"), parse_body(row.get("body"))?)))
            .collect()
    }

    /// Documents ordered by a JSON field descending, newest first
    pub async fn list_ordered_desc(
        &self,
        collection: &str,
        order_path: &str,
        limit: i64,
    ) -> Result<Vec<Value>> {
        let rows = sqlx::query(
            r#"
            SELECT body FROM documents
            WHERE collection = ?
            ORDER BY json_extract(body, ?) DESC
            LIMIT ?
            "#,
        )
        .bind(collection)
        .bind(order_path)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| parse_body(row.get("body")))
            .collect()
    }

    /// Documents where a JSON field equals a value, insertion order
    pub async fn find_equal(
        &self,
        collection: &str,
        field_path: &str,
        value: &str,
    ) -> Result<Vec<Value>> {
        let rows = sqlx::query(
            r#"
            SELECT body FROM documents
            WHERE collection = ? AND json_extract(body, ?) = ?
            ORDER BY rowid
            "#,
        )
        .bind(collection)
        .bind(field_path)
        .bind(value)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| parse_body(row.get("body")))
            .collect()
    }

    /// First document where a JSON field equals a value
    pub async fn find_one(
        &self,
        collection: &str,
        field_path: &str,
        value: &str,
    ) -> Result<Option<Value>> {
        Ok(self
            .find_equal(collection, field_path, value)
            .await?
            .into_iter()
            .next())
    }

    /// Equality filter combined with order-by-field descending.
    ///
    /// Requires the composite index; when it is absent the query runs
    /// as a plain unordered filter and the page is flagged `degraded`
    /// so the caller can show a warning banner instead of failing.
    pub async fn find_equal_ordered(
        &self,
        collection: &str,
        field_path: &str,
        value: &str,
        order_path: &str,
        limit: i64,
    ) -> Result<FilteredPage> {
        if !self.index_exists(FILTER_ORDER_INDEX).await? {
            warn!(
                "Composite index {} missing; serving unordered results for {}",
                FILTER_ORDER_INDEX, collection
            );
            let mut docs = self.find_equal(collection, field_path, value).await?;
            docs.truncate(limit as usize);
            return Ok(FilteredPage { docs, degraded: true });
        }

        let rows = sqlx::query(
            r#"
            SELECT body FROM documents
            WHERE collection = ? AND json_extract(body, ?) = ?
            ORDER BY json_extract(body, ?) DESC
            LIMIT ?
            "#,
        )
        .bind(collection)
        .bind(field_path)
        .bind(value)
        .bind(order_path)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        let docs = rows
            .into_iter()
            .map(|row| parse_body(row.get("body")))
            .collect::<Result<Vec<_>>>()?;
        Ok(FilteredPage { docs, degraded: false })
    }

    pub async fn count(&self, collection: &str) -> Result<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM documents WHERE collection = ?")
                .bind(collection)
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }

    async fn index_exists(&self, name: &str) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'index' AND name = ?)",
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }
}

fn parse_body(body: String) -> Result<Value> {
    serde_json::from_str(&body).map_err(|e| Error::Internal(format!("Corrupt document body: {e}")))
}
