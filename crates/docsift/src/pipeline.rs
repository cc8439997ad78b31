//! Consolidated request orchestration.
//!
//! One pipeline serves both workflows that used to require separate
//! drivers: answer-a-question and summarize-a-document. They share
//! fingerprinting, dedup, chunk persistence, and chunk retrieval, and
//! differ only in how the generation context is assembled.
//!
//! Within a request the components run strictly in sequence:
//! fingerprint → (conditionally) chunk-and-persist → rank → relay. The
//! relay is the only suspension point with cancellation and timeout
//! semantics; a timeout there never touches the corpus store.

use std::time::Duration;

use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, info};

use docsift_core::chunk::chunk_document;
use docsift_core::fingerprint::fingerprint;
use docsift_core::models::{Chunk, Document, RankedResult};
use docsift_core::rank::rank;
use docsift_core::store::{CorpusStore, StoreError};

use crate::config::Config;
use crate::extract::ExtractError;
use crate::generate::{GenerateError, GenerationRequest, Generator, SamplingParams};
use crate::prompt::{self, SummarySpec};
use crate::relay::relay;

/// Errors crossing the pipeline boundary, classified per collaborator.
/// No retries happen at this level — collaborator failures are
/// propagated, not masked.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Extraction(#[from] ExtractError),
    #[error(transparent)]
    Storage(#[from] StoreError),
    /// No chunks exist for the document, or ranking selected nothing.
    /// A user-visible "no relevant content" outcome, not a crash.
    #[error("no relevant content found for this document")]
    EmptyCorpus,
    #[error(transparent)]
    Generation(#[from] GenerateError),
}

/// What a request wants done with the retrieved document.
#[derive(Debug, Clone)]
pub enum RequestKind {
    /// Rank chunks against a query and answer from the top-K.
    Ask { query: String },
    /// Summarize the whole document.
    Summarize(SummarySpec),
}

/// Result of ingesting one document.
#[derive(Debug, Clone)]
pub struct IngestOutcome {
    pub document: Document,
    /// Chunks written by this call; 0 when the document was already known.
    pub chunks_written: usize,
    /// True when an identical `(name, content)` pair had been ingested
    /// before and its stored chunks were reused.
    pub deduplicated: bool,
}

/// Fingerprint `text`, dedup against the store, and persist chunks when
/// the document is new.
///
/// Idempotent: re-ingesting the same `(name, text)` reuses the existing
/// document and writes no chunk rows. Safe against concurrent first
/// ingestion of the same content — the loser of the insert race adopts
/// the winner's row and appends nothing.
pub async fn ingest<S>(
    store: &S,
    name: &str,
    text: &str,
    config: &Config,
) -> Result<IngestOutcome, PipelineError>
where
    S: CorpusStore + ?Sized,
{
    let hash = fingerprint(name, text);

    if let Some(existing) = store.find_document_by_hash(&hash).await? {
        debug!(document_id = %existing.id, "document already ingested");
        return Ok(IngestOutcome {
            document: existing,
            chunks_written: 0,
            deduplicated: true,
        });
    }

    let (document, created) = store.create_document(name, &hash).await?;
    if !created {
        return Ok(IngestOutcome {
            document,
            chunks_written: 0,
            deduplicated: true,
        });
    }

    let chunks = chunk_document(
        &document.id,
        text,
        config.chunking.max_tokens,
        config.chunking.overlap_sentences,
    );
    store.append_chunks(&document.id, &chunks).await?;
    info!(document_id = %document.id, chunks = chunks.len(), "ingested document");

    Ok(IngestOutcome {
        document,
        chunks_written: chunks.len(),
        deduplicated: false,
    })
}

/// Score `chunks` against `query` and keep the top `top_k`, descending.
pub fn select_context(query: &str, chunks: &[Chunk], top_k: usize) -> Vec<RankedResult> {
    let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
    rank(query, &texts, top_k)
        .into_iter()
        .map(|r| RankedResult {
            chunk: chunks[r.index].clone(),
            score: r.score,
        })
        .collect()
}

/// Run a request against an already-ingested document, streaming
/// fragments to `sink` and returning the assembled answer.
pub async fn respond<S, G>(
    store: &S,
    generator: &G,
    config: &Config,
    document_id: &str,
    kind: &RequestKind,
    sink: mpsc::Sender<String>,
) -> Result<String, PipelineError>
where
    S: CorpusStore + ?Sized,
    G: Generator + ?Sized,
{
    let chunks = store.list_chunks(document_id).await?;
    if chunks.is_empty() {
        return Err(PipelineError::EmptyCorpus);
    }

    let (prompt, max_length) = match kind {
        RequestKind::Ask { query } => {
            let ranked = select_context(query, &chunks, config.retrieval.top_k);
            if ranked.is_empty() {
                return Err(PipelineError::EmptyCorpus);
            }
            // Context is ranked order, not document order.
            let context = ranked
                .iter()
                .map(|r| r.chunk.text.as_str())
                .collect::<Vec<_>>()
                .join(" ");
            (
                prompt::answer_prompt(&context, query),
                config.generator.max_length,
            )
        }
        RequestKind::Summarize(spec) => {
            let context = chunks
                .iter()
                .map(|c| c.text.as_str())
                .collect::<Vec<_>>()
                .join(" ");
            (
                prompt::summary_prompt(spec, &context),
                config.generator.summary_max_length,
            )
        }
    };

    let request = GenerationRequest {
        prompt,
        params: SamplingParams {
            temperature: config.generator.temperature,
            top_p: config.generator.top_p,
            max_length,
        },
    };

    let timeout = Duration::from_secs(config.generator.timeout_secs);
    let answer = tokio::time::timeout(timeout, async {
        let fragments = generator.generate(request).await?;
        relay(fragments, sink).await
    })
    .await
    .map_err(|_| GenerateError::Timeout)??;

    Ok(answer)
}

/// Ingest `text` under `name` and run `kind` against it, in one request.
pub async fn ingest_and_respond<S, G>(
    store: &S,
    generator: &G,
    config: &Config,
    name: &str,
    text: &str,
    kind: &RequestKind,
    sink: mpsc::Sender<String>,
) -> Result<(IngestOutcome, String), PipelineError>
where
    S: CorpusStore + ?Sized,
    G: Generator + ?Sized,
{
    let outcome = ingest(store, name, text, config).await?;
    let answer = respond(store, generator, config, &outcome.document.id, kind, sink).await?;
    Ok((outcome, answer))
}
