//! SQLite-backed [`CorpusStore`] implementation.
//!
//! Maps each store operation to SQL against the schema created by
//! [`crate::migrate`]. The dedup race is resolved with an
//! insert-or-ignore on the `content_hash` uniqueness constraint.

use async_trait::async_trait;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use docsift_core::models::{Chunk, Document};
use docsift_core::store::{CorpusStore, StoreError};

/// SQLite implementation of the [`CorpusStore`] trait.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn doc_from_row(row: &sqlx::sqlite::SqliteRow) -> Document {
    Document {
        id: row.get("id"),
        name: row.get("name"),
        content_hash: row.get("content_hash"),
        created_at: row.get("created_at"),
    }
}

#[async_trait]
impl CorpusStore for SqliteStore {
    async fn find_document_by_hash(&self, hash: &str) -> Result<Option<Document>, StoreError> {
        let row = sqlx::query(
            "SELECT id, name, content_hash, created_at FROM documents WHERE content_hash = ?",
        )
        .bind(hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::backend)?;

        Ok(row.map(|r| doc_from_row(&r)))
    }

    async fn create_document(
        &self,
        name: &str,
        hash: &str,
    ) -> Result<(Document, bool), StoreError> {
        let id = Uuid::new_v4().to_string();
        let created_at = chrono::Utc::now().timestamp();

        // Insert-or-ignore makes the dedup check atomic under the UNIQUE
        // constraint; zero rows affected means a concurrent ingestion won
        // the race and its row is returned instead.
        let result = sqlx::query(
            r#"
            INSERT INTO documents (id, name, content_hash, created_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(content_hash) DO NOTHING
            "#,
        )
        .bind(&id)
        .bind(name)
        .bind(hash)
        .bind(created_at)
        .execute(&self.pool)
        .await
        .map_err(StoreError::backend)?;

        if result.rows_affected() == 0 {
            // Documents are never deleted in normal operation, so the
            // winning row must be present.
            return match self.find_document_by_hash(hash).await? {
                Some(doc) => Ok((doc, false)),
                None => Err(StoreError::backend(sqlx::Error::RowNotFound)),
            };
        }

        Ok((
            Document {
                id,
                name: name.to_string(),
                content_hash: hash.to_string(),
                created_at,
            },
            true,
        ))
    }

    async fn append_chunks(&self, _document_id: &str, chunks: &[Chunk]) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await.map_err(StoreError::backend)?;

        for chunk in chunks {
            sqlx::query("INSERT INTO chunks (id, document_id, ordinal, text) VALUES (?, ?, ?, ?)")
                .bind(&chunk.id)
                .bind(&chunk.document_id)
                .bind(chunk.ordinal)
                .bind(&chunk.text)
                .execute(&mut *tx)
                .await
                .map_err(StoreError::backend)?;
        }

        tx.commit().await.map_err(StoreError::backend)?;
        Ok(())
    }

    async fn list_chunks(&self, document_id: &str) -> Result<Vec<Chunk>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, document_id, ordinal, text FROM chunks WHERE document_id = ? ORDER BY ordinal ASC",
        )
        .bind(document_id)
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::backend)?;

        Ok(rows
            .iter()
            .map(|r| Chunk {
                id: r.get("id"),
                document_id: r.get("document_id"),
                ordinal: r.get("ordinal"),
                text: r.get("text"),
            })
            .collect())
    }
}
