//! # docsift core
//!
//! Shared, runtime-free logic for docsift: data models, content
//! fingerprinting, sentence-window chunking, lexical ranking, and the
//! corpus store abstraction.
//!
//! This crate contains no tokio, sqlx, network I/O, or other native-only
//! dependencies. Everything here is deterministic and synchronous except
//! the [`store::CorpusStore`] trait, whose async surface is satisfied by
//! immediately-ready futures in the bundled in-memory implementation.

pub mod chunk;
pub mod fingerprint;
pub mod models;
pub mod rank;
pub mod store;
