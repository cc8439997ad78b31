//! In-memory [`CorpusStore`] implementation for tests and examples.
//!
//! Uses `HashMap` and `Vec` behind `std::sync::RwLock` for thread safety.
//! Documents are keyed by content hash, which makes the dedup
//! check-and-insert atomic under the write lock.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{Chunk, Document};

use super::{CorpusStore, StoreError};

/// In-memory store.
#[derive(Default)]
pub struct MemoryStore {
    docs: RwLock<HashMap<String, Document>>,
    chunks: RwLock<Vec<Chunk>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CorpusStore for MemoryStore {
    async fn find_document_by_hash(&self, hash: &str) -> Result<Option<Document>, StoreError> {
        Ok(self.docs.read().unwrap().get(hash).cloned())
    }

    async fn create_document(
        &self,
        name: &str,
        hash: &str,
    ) -> Result<(Document, bool), StoreError> {
        let mut docs = self.docs.write().unwrap();
        if let Some(existing) = docs.get(hash) {
            return Ok((existing.clone(), false));
        }
        let doc = Document {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            content_hash: hash.to_string(),
            created_at: chrono::Utc::now().timestamp(),
        };
        docs.insert(hash.to_string(), doc.clone());
        Ok((doc, true))
    }

    async fn append_chunks(
        &self,
        _document_id: &str,
        chunks: &[Chunk],
    ) -> Result<(), StoreError> {
        self.chunks.write().unwrap().extend_from_slice(chunks);
        Ok(())
    }

    async fn list_chunks(&self, document_id: &str) -> Result<Vec<Chunk>, StoreError> {
        let mut chunks: Vec<Chunk> = self
            .chunks
            .read()
            .unwrap()
            .iter()
            .filter(|c| c.document_id == document_id)
            .cloned()
            .collect();
        chunks.sort_by_key(|c| c.ordinal);
        Ok(chunks)
    }
}
