//! # docsift
//!
//! **Document question answering over lexical retrieval.**
//!
//! docsift ingests a document, deduplicates it by content fingerprint,
//! splits it into overlapping sentence-window chunks, ranks those chunks
//! against a question with TF-IDF + cosine similarity, and streams an
//! answer generated from the top-ranked chunks by a local LLM (Ollama).
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌──────────────────────────┐   ┌─────────┐
//! │ Document │──▶│ Fingerprint → Chunk      │──▶│ SQLite  │
//! │ (PDF/txt)│   │ (dedup-aware ingestion)  │   │ corpus  │
//! └──────────┘   └──────────────────────────┘   └────┬────┘
//!                                                    │
//!                      ┌─────────────────────────────┤
//!                      ▼                             ▼
//!                ┌───────────┐                ┌────────────┐
//!                │ Rank      │───context────▶ │ Generator  │
//!                │ (TF-IDF)  │                │ (Ollama)   │
//!                └───────────┘                └─────┬──────┘
//!                                                   │ fragments
//!                      ┌────────────────────────────┘
//!                      ▼
//!                ┌───────────┐        ┌──────────────┐
//!                │ Relay     │───────▶│ CLI / HTTP   │
//!                └───────────┘        └──────────────┘
//! ```
//!
//! ## Request Flow
//!
//! 1. The caller submits a document and a question (or summary request).
//! 2. [`extract`] turns the source into plain text.
//! 3. [`pipeline::ingest`] fingerprints the text and, unless an identical
//!    document exists, chunks and persists it via the
//!    [`CorpusStore`](docsift_core::store::CorpusStore) adapter.
//! 4. [`pipeline::respond`] retrieves the document's chunks, assembles a
//!    context (top-K ranked for questions, whole document for summaries),
//!    and drives the [`generate::Generator`] collaborator.
//! 5. [`relay`] forwards fragments to the caller's sink in producer order
//!    with cancellation support, and returns the assembled answer.
//!
//! The pure algorithms (fingerprint, chunker, ranker, store trait) live in
//! the runtime-free `docsift-core` crate; this crate supplies the
//! collaborator adapters and the CLI/HTTP front ends.

pub mod config;
pub mod db;
pub mod extract;
pub mod generate;
pub mod migrate;
pub mod pipeline;
pub mod prompt;
pub mod relay;
pub mod server;
pub mod sqlite_store;
