//! Storage abstraction for the document corpus.
//!
//! The [`CorpusStore`] trait defines the four operations the retrieval
//! pipeline needs, enabling pluggable backends (SQLite, in-memory).
//! Implementations must be `Send + Sync` to work with async runtimes.

pub mod memory;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{Chunk, Document};

/// Storage-layer failure.
///
/// The expected dedup insert race is not an error — see
/// [`CorpusStore::create_document`]. Everything else (connection loss,
/// I/O, unexpected constraint violations) surfaces here and is fatal for
/// the current request.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage backend failure: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl StoreError {
    /// Wrap a backend driver error.
    pub fn backend(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        StoreError::Backend(Box::new(err))
    }
}

/// Abstract storage backend for documents and their chunks.
///
/// All operations are transactional at single-call granularity.
///
/// # Operations
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`find_document_by_hash`](CorpusStore::find_document_by_hash) | Look up a document by content fingerprint |
/// | [`create_document`](CorpusStore::create_document) | Insert a document, resolving the dedup race |
/// | [`append_chunks`](CorpusStore::append_chunks) | Persist a document's chunks, all-or-nothing |
/// | [`list_chunks`](CorpusStore::list_chunks) | All chunks of a document in ordinal order |
#[async_trait]
pub trait CorpusStore: Send + Sync {
    /// Look up a document by its content fingerprint.
    async fn find_document_by_hash(&self, hash: &str) -> Result<Option<Document>, StoreError>;

    /// Insert a document row for `(name, hash)`.
    ///
    /// Atomic with respect to the uniqueness of `content_hash`: when a
    /// concurrent ingestion wins the insert race, the winning row is
    /// returned with `false` instead of an error. `true` means this call
    /// created the row and the caller owns the initial chunk append.
    async fn create_document(
        &self,
        name: &str,
        hash: &str,
    ) -> Result<(Document, bool), StoreError>;

    /// Append `chunks` for a document in one transaction.
    async fn append_chunks(&self, document_id: &str, chunks: &[Chunk]) -> Result<(), StoreError>;

    /// All chunks for a document, ordinal ascending.
    async fn list_chunks(&self, document_id: &str) -> Result<Vec<Chunk>, StoreError>;
}
