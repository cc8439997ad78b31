//! Core data models used throughout docsift.
//!
//! These types represent the documents, chunks, and ranked results that
//! flow through the ingestion and retrieval pipeline.

use serde::Serialize;

/// A document registered in the corpus.
///
/// Created once per distinct `(name, content)` pair, never mutated, and
/// never deleted in normal operation. `content_hash` is unique across the
/// corpus — it is the deduplication key (see [`crate::fingerprint`]).
#[derive(Debug, Clone, Serialize)]
pub struct Document {
    pub id: String,
    pub name: String,
    pub content_hash: String,
    /// Unix timestamp of first ingestion.
    pub created_at: i64,
}

/// A chunk of a document's extracted text.
///
/// Owned by exactly one document. `ordinal` reflects emission order from
/// the chunker and is strictly increasing within a document; ranking
/// tie-breaks and context reassembly depend on it.
#[derive(Debug, Clone, Serialize)]
pub struct Chunk {
    pub id: String,
    pub document_id: String,
    pub ordinal: i64,
    pub text: String,
}

/// A chunk scored against a query.
///
/// Ephemeral: produced per request, discarded once the response is
/// assembled. Never persisted.
#[derive(Debug, Clone)]
pub struct RankedResult {
    pub chunk: Chunk,
    /// Cosine similarity in `[0.0, 1.0]`.
    pub score: f64,
}
