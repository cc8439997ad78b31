//! Generator collaborator: the external language model.
//!
//! [`Generator`] is the seam the pipeline talks to; [`OllamaGenerator`]
//! implements it against the Ollama HTTP API (`POST /api/generate`,
//! streaming NDJSON). Fragments arrive as a lazily-polled stream so the
//! relay can stop mid-generation without consuming the rest.
//!
//! No retries: a failed generation is classified and propagated, never
//! masked. Retry policy, if any, belongs to the caller.

use async_trait::async_trait;
use futures_util::stream::BoxStream;
use futures_util::StreamExt;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::config::GeneratorConfig;

/// Sampling parameters, passed through to the generator unmodified.
#[derive(Debug, Clone)]
pub struct SamplingParams {
    /// Randomness of token choice.
    pub temperature: f32,
    /// Nucleus sampling mass.
    pub top_p: f32,
    /// Maximum output length in tokens.
    pub max_length: u32,
}

/// One generation request: a fully-built prompt plus sampling knobs.
/// Ephemeral — constructed per request, never persisted.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub prompt: String,
    pub params: SamplingParams,
}

/// Generation failure. Fragments already relayed before a mid-stream
/// failure remain valid partial output.
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("generator unreachable: {0}")]
    Connect(String),
    #[error("generator returned HTTP {status}: {body}")]
    Http { status: u16, body: String },
    #[error("malformed generator response: {0}")]
    Protocol(String),
    #[error("generation failed mid-stream: {0}")]
    Stream(String),
    #[error("generation timed out")]
    Timeout,
}

/// Lazily-polled, finite, forward-only sequence of output fragments.
pub type FragmentStream = BoxStream<'static, Result<String, GenerateError>>;

/// The external text generator.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Start one generation and return its fragment stream.
    ///
    /// The stream may fail before the first fragment or at any point
    /// mid-stream. Dropping the stream stops the generation.
    async fn generate(&self, request: GenerationRequest)
        -> Result<FragmentStream, GenerateError>;
}

/// Ollama client. One reqwest client is reused across requests.
pub struct OllamaGenerator {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

impl OllamaGenerator {
    pub fn new(config: &GeneratorConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
        }
    }
}

/// One NDJSON line of the Ollama streaming response.
#[derive(Debug, Deserialize)]
struct StreamLine {
    #[serde(default)]
    response: String,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    error: Option<String>,
}

#[async_trait]
impl Generator for OllamaGenerator {
    async fn generate(
        &self,
        request: GenerationRequest,
    ) -> Result<FragmentStream, GenerateError> {
        let url = format!("{}/api/generate", self.base_url);
        let body = json!({
            "model": self.model,
            "prompt": request.prompt,
            "stream": true,
            "options": {
                "temperature": request.params.temperature,
                "top_p": request.params.top_p,
                "num_predict": request.params.max_length,
            },
        });

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| GenerateError::Connect(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerateError::Http {
                status: status.as_u16(),
                body,
            });
        }

        // Decode NDJSON lines off the byte stream into fragments. The
        // receiver end is handed back as the fragment stream; once it is
        // dropped, the next send fails and this task ends, closing the
        // underlying HTTP body.
        let (tx, rx) = mpsc::channel::<Result<String, GenerateError>>(16);
        let mut bytes = response.bytes_stream();

        tokio::spawn(async move {
            let mut pending: Vec<u8> = Vec::new();
            while let Some(next) = bytes.next().await {
                let chunk = match next {
                    Ok(c) => c,
                    Err(e) => {
                        let _ = tx.send(Err(GenerateError::Stream(e.to_string()))).await;
                        return;
                    }
                };
                pending.extend_from_slice(&chunk);

                while let Some(pos) = pending.iter().position(|&b| b == b'\n') {
                    let line: Vec<u8> = pending.drain(..=pos).collect();
                    let line = String::from_utf8_lossy(&line);
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    match serde_json::from_str::<StreamLine>(line) {
                        Ok(parsed) => {
                            if let Some(message) = parsed.error {
                                let _ = tx.send(Err(GenerateError::Stream(message))).await;
                                return;
                            }
                            if !parsed.response.is_empty()
                                && tx.send(Ok(parsed.response)).await.is_err()
                            {
                                return;
                            }
                            if parsed.done {
                                return;
                            }
                        }
                        Err(e) => {
                            let _ = tx.send(Err(GenerateError::Protocol(e.to_string()))).await;
                            return;
                        }
                    }
                }
            }
        });

        Ok(ReceiverStream::new(rx).boxed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stream_line_parses_fragment() {
        let line: StreamLine =
            serde_json::from_str(r#"{"response":"Hello","done":false}"#).unwrap();
        assert_eq!(line.response, "Hello");
        assert!(!line.done);
        assert!(line.error.is_none());
    }

    #[test]
    fn stream_line_parses_done_marker() {
        let line: StreamLine = serde_json::from_str(r#"{"response":"","done":true}"#).unwrap();
        assert!(line.done);
    }

    #[test]
    fn stream_line_parses_error() {
        let line: StreamLine = serde_json::from_str(r#"{"error":"model not found"}"#).unwrap();
        assert_eq!(line.error.as_deref(), Some("model not found"));
    }
}
