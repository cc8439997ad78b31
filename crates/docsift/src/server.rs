//! HTTP front end.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/ask` | Ingest a document and answer a question about it |
//! | `POST` | `/summarize` | Ingest a document and summarize it |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! `/ask` and `/summarize` accept multipart form data with a `file` part
//! (the document) plus request fields. Validation failures (missing file,
//! missing question, unknown summary style) are rejected before any core
//! component runs.
//!
//! `POST /ask?stream=true` returns the answer as a Server-Sent Events
//! fragment stream. Disconnecting cancels generation; a mid-stream
//! generator failure closes the stream, and fragments already delivered
//! stand.
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "missing 'question' field" } }
//! ```
//!
//! Error codes: `bad_request` (400), `not_found` (404), `timeout` (408),
//! `extraction_failed` (422), `internal` (500), `generation_failed` (502).
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted to support
//! browser-based clients.

use std::sync::Arc;

use axum::extract::{Multipart, Query, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tower_http::cors::{Any, CorsLayer};
use tracing::error;

use crate::config::Config;
use crate::db;
use crate::extract;
use crate::generate::{GenerateError, Generator, OllamaGenerator};
use crate::pipeline::{self, PipelineError, RequestKind};
use crate::prompt::{Complexity, SummarySpec, SummaryStyle};
use crate::sqlite_store::SqliteStore;

/// Shared application state passed to all route handlers.
#[derive(Clone)]
struct AppState {
    config: Arc<Config>,
    store: Arc<SqliteStore>,
    generator: Arc<dyn Generator>,
}

/// Starts the HTTP server.
///
/// Binds to the address configured in `[server].bind` and runs until the
/// process is terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let bind_addr = config.server.bind.clone();
    let pool = db::connect(config).await?;

    let state = AppState {
        config: Arc::new(config.clone()),
        store: Arc::new(SqliteStore::new(pool)),
        generator: Arc::new(OllamaGenerator::new(&config.generator)),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/ask", post(handle_ask))
        .route("/summarize", post(handle_summarize))
        .route("/health", get(handle_health))
        .layer(cors)
        .with_state(state);

    println!("docsift server listening on http://{}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============ Error response ============

/// JSON error response body.
#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

/// Inner error detail with a machine-readable code and human-readable
/// message.
#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

/// Internal error type that converts into an HTTP response.
struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn app_error(status: StatusCode, code: &str, message: impl Into<String>) -> AppError {
    AppError {
        status,
        code: code.to_string(),
        message: message.into(),
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    app_error(StatusCode::BAD_REQUEST, "bad_request", message)
}

/// Map a pipeline failure to the most appropriate HTTP status.
fn classify_pipeline_error(err: PipelineError) -> AppError {
    match err {
        PipelineError::Extraction(e) => app_error(
            StatusCode::UNPROCESSABLE_ENTITY,
            "extraction_failed",
            e.to_string(),
        ),
        PipelineError::Storage(e) => {
            error!(error = %e, "storage failure");
            app_error(StatusCode::INTERNAL_SERVER_ERROR, "internal", e.to_string())
        }
        PipelineError::EmptyCorpus => app_error(
            StatusCode::NOT_FOUND,
            "not_found",
            "no relevant content found for this document",
        ),
        PipelineError::Generation(GenerateError::Timeout) => app_error(
            StatusCode::REQUEST_TIMEOUT,
            "timeout",
            "generation timed out",
        ),
        PipelineError::Generation(e) => app_error(
            StatusCode::BAD_GATEWAY,
            "generation_failed",
            e.to_string(),
        ),
    }
}

// ============ Multipart upload ============

/// Parsed multipart request: the uploaded file plus plain-text fields.
struct Upload {
    file_name: String,
    file_bytes: Vec<u8>,
    fields: std::collections::HashMap<String, String>,
}

/// Read all multipart parts. The `file` part must carry a file name; all
/// other parts are collected as text fields.
async fn read_upload(multipart: &mut Multipart) -> Result<Upload, AppError> {
    let mut file: Option<(String, Vec<u8>)> = None;
    let mut fields = std::collections::HashMap::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| bad_request(format!("malformed multipart body: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if name == "file" {
            let file_name = field
                .file_name()
                .ok_or_else(|| bad_request("'file' part is missing a file name"))?
                .to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| bad_request(format!("failed to read 'file' part: {}", e)))?;
            file = Some((file_name, bytes.to_vec()));
        } else {
            let value = field
                .text()
                .await
                .map_err(|e| bad_request(format!("failed to read '{}' field: {}", name, e)))?;
            fields.insert(name, value);
        }
    }

    let (file_name, file_bytes) = file.ok_or_else(|| bad_request("missing 'file' part"))?;
    Ok(Upload {
        file_name,
        file_bytes,
        fields,
    })
}

// ============ GET /health ============

/// JSON response body for `GET /health`.
#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

/// Handler for `GET /health`.
async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ POST /ask ============

#[derive(Deserialize)]
struct AskParams {
    /// When true, the answer is delivered as an SSE fragment stream.
    #[serde(default)]
    stream: bool,
}

/// JSON response body for a non-streaming `POST /ask`.
#[derive(Serialize)]
struct AskResponse {
    document_id: String,
    deduplicated: bool,
    answer: String,
}

/// Handler for `POST /ask`.
///
/// Multipart fields: `file` (the document), `question` (required).
async fn handle_ask(
    State(state): State<AppState>,
    Query(params): Query<AskParams>,
    mut multipart: Multipart,
) -> Result<Response, AppError> {
    let upload = read_upload(&mut multipart).await?;

    // Validation happens before any core component runs.
    let question = upload
        .fields
        .get("question")
        .map(|q| q.trim().to_string())
        .filter(|q| !q.is_empty())
        .ok_or_else(|| bad_request("missing 'question' field"))?;

    let text = extract::extract_bytes(&upload.file_name, &upload.file_bytes)
        .map_err(|e| classify_pipeline_error(PipelineError::Extraction(e)))?;

    let outcome = pipeline::ingest(state.store.as_ref(), &upload.file_name, &text, &state.config)
        .await
        .map_err(classify_pipeline_error)?;

    let kind = RequestKind::Ask { query: question };

    if params.stream {
        // Fragments flow through the channel into the SSE body; when the
        // client disconnects the receiver is dropped and the relay stops
        // the generator.
        let (tx, rx) = mpsc::channel::<String>(16);
        let document_id = outcome.document.id.clone();
        tokio::spawn(async move {
            if let Err(e) = pipeline::respond(
                state.store.as_ref(),
                state.generator.as_ref(),
                &state.config,
                &document_id,
                &kind,
                tx,
            )
            .await
            {
                error!(error = %e, "streaming generation failed");
            }
        });

        let stream = ReceiverStream::new(rx).map(|fragment| Event::default().json_data(fragment));
        Ok(Sse::new(stream)
            .keep_alive(KeepAlive::default())
            .into_response())
    } else {
        let (tx, mut rx) = mpsc::channel::<String>(16);
        let drain = tokio::spawn(async move { while rx.recv().await.is_some() {} });

        let answer = pipeline::respond(
            state.store.as_ref(),
            state.generator.as_ref(),
            &state.config,
            &outcome.document.id,
            &kind,
            tx,
        )
        .await
        .map_err(classify_pipeline_error)?;
        let _ = drain.await;

        Ok(Json(AskResponse {
            document_id: outcome.document.id,
            deduplicated: outcome.deduplicated,
            answer,
        })
        .into_response())
    }
}

// ============ POST /summarize ============

/// JSON response body for `POST /summarize`.
#[derive(Serialize)]
struct SummarizeResponse {
    document_id: String,
    deduplicated: bool,
    summary: String,
}

/// Handler for `POST /summarize`.
///
/// Multipart fields: `file` (the document), `style` (default `short`),
/// `length` (optional), `complexity` (default `simple`).
async fn handle_summarize(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<SummarizeResponse>, AppError> {
    let upload = read_upload(&mut multipart).await?;

    let style: SummaryStyle = upload
        .fields
        .get("style")
        .map(|s| s.parse())
        .transpose()
        .map_err(bad_request)?
        .unwrap_or(SummaryStyle::Short);
    let complexity: Complexity = upload
        .fields
        .get("complexity")
        .map(|s| s.parse())
        .transpose()
        .map_err(bad_request)?
        .unwrap_or(Complexity::Simple);
    let length = upload.fields.get("length").cloned();

    let text = extract::extract_bytes(&upload.file_name, &upload.file_bytes)
        .map_err(|e| classify_pipeline_error(PipelineError::Extraction(e)))?;

    let kind = RequestKind::Summarize(SummarySpec {
        style,
        length,
        complexity,
    });

    let (tx, mut rx) = mpsc::channel::<String>(16);
    let drain = tokio::spawn(async move { while rx.recv().await.is_some() {} });

    let (outcome, summary) = pipeline::ingest_and_respond(
        state.store.as_ref(),
        state.generator.as_ref(),
        &state.config,
        &upload.file_name,
        &text,
        &kind,
        tx,
    )
    .await
    .map_err(classify_pipeline_error)?;
    let _ = drain.await;

    Ok(Json(SummarizeResponse {
        document_id: outcome.document.id,
        deduplicated: outcome.deduplicated,
        summary,
    }))
}
