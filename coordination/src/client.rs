//! Query Client - sends one prompt to a model backend
//!
//! The executor only sees [`QueryClient::query`], which never fails: any
//! transport error, timeout, non-200 status or malformed stream comes back
//! as `None`. [`OllamaClient::generate`] is the fallible call underneath.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Error type for backend queries
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("HTTP error: {0}")]
    HttpError(String),

    #[error("Backend returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Backend reported an error: {0}")]
    Backend(String),

    #[error("Malformed response line: {0}")]
    Decode(String),
}

/// Result type for backend queries
pub type QueryResult<T> = Result<T, QueryError>;

/// Anything that can answer a prompt on behalf of a named model
#[async_trait]
pub trait QueryClient: Send + Sync {
    /// Full response text, or `None` if the query failed for any reason
    async fn query(&self, model: &str, prompt: &str) -> Option<String>;
}

/// Shared reference to a QueryClient
pub type SharedQueryClient = Arc<dyn QueryClient>;

/// Client for an Ollama-compatible `/api/generate` endpoint
#[derive(Debug, Clone)]
pub struct OllamaClient {
    http: reqwest::Client,
    base_url: String,
}

impl OllamaClient {
    /// Create a client for `base_url` with a per-request timeout
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> QueryResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| QueryError::HttpError(e.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn generate_url(&self) -> String {
        format!("{}/api/generate", self.base_url.trim_end_matches('/'))
    }

    /// Send a prompt and concatenate the streamed `response` fragments
    pub async fn generate(&self, model: &str, prompt: &str) -> QueryResult<String> {
        #[derive(Serialize)]
        struct GenerateRequest<'a> {
            model: &'a str,
            prompt: &'a str,
        }

        let response = self
            .http
            .post(self.generate_url())
            .json(&GenerateRequest { model, prompt })
            .send()
            .await
            .map_err(|e| QueryError::HttpError(e.to_string()))?;

        if response.status() != StatusCode::OK {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(QueryError::Status { status, body });
        }

        let mut stream = response.bytes_stream();
        let mut accumulator = StreamAccumulator::default();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| QueryError::HttpError(e.to_string()))?;
            accumulator.push(&chunk)?;
        }

        let text = accumulator.finish()?;
        debug!(model, bytes = text.len(), "Backend response complete");
        Ok(text)
    }
}

#[async_trait]
impl QueryClient for OllamaClient {
    async fn query(&self, model: &str, prompt: &str) -> Option<String> {
        match self.generate(model, prompt).await {
            Ok(text) => Some(text),
            Err(e) => {
                warn!(model, url = %self.base_url, error = %e, "Query failed");
                None
            }
        }
    }
}

/// One line of the newline-delimited JSON stream
#[derive(Debug, Deserialize)]
struct GenerateChunk {
    #[serde(default)]
    response: String,
    #[serde(default)]
    error: Option<String>,
}

/// Reassembles lines split across network chunks and joins their fragments
#[derive(Debug, Default)]
struct StreamAccumulator {
    pending: Vec<u8>,
    text: String,
}

impl StreamAccumulator {
    fn push(&mut self, bytes: &[u8]) -> QueryResult<()> {
        self.pending.extend_from_slice(bytes);

        while let Some(newline) = self.pending.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=newline).collect();
            self.consume_line(&line)?;
        }

        Ok(())
    }

    fn finish(mut self) -> QueryResult<String> {
        let rest = std::mem::take(&mut self.pending);
        self.consume_line(&rest)?;
        Ok(self.text)
    }

    fn consume_line(&mut self, line: &[u8]) -> QueryResult<()> {
        let line = line.trim_ascii();
        if line.is_empty() {
            return Ok(());
        }

        let chunk: GenerateChunk = serde_json::from_slice(line)
            .map_err(|e| QueryError::Decode(format!("{e}: {}", String::from_utf8_lossy(line))))?;

        if let Some(error) = chunk.error {
            return Err(QueryError::Backend(error));
        }

        self.text.push_str(&chunk.response);
        Ok(())
    }
}
