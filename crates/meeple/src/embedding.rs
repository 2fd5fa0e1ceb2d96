//! Text embedding capability.
//!
//! Retrieval only needs "given text, return a fixed-length unit vector". The
//! [`Embedder`] trait captures that contract; [`HttpEmbedder`] implements it
//! against any OpenAI-compatible `/embeddings` endpoint (for example a
//! text-embeddings-inference server hosting `BAAI/bge-m3`).

use std::future::Future;
use std::pin::Pin;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::BackendError;

/// Default embedding model. Must match the model the indices were built with.
pub const DEFAULT_EMBEDDING_MODEL: &str = "BAAI/bge-m3";

/// Boxed future returned by [`Embedder::embed`].
pub type EmbedFuture<'a> = Pin<Box<dyn Future<Output = Result<Vec<f32>, BackendError>> + Send + 'a>>;

/// Turns text into an L2-normalized vector.
pub trait Embedder: Send + Sync {
    fn embed<'a>(&'a self, text: &'a str) -> EmbedFuture<'a>;
}

/// Scale `v` to unit length in place. Zero vectors are left untouched.
pub fn l2_normalize(v: &mut [f32]) {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}

// ── HTTP embedder ──────────────────────────────────────────────────

/// Async client for OpenAI-compatible embedding endpoints.
pub struct HttpEmbedder {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
}

impl HttpEmbedder {
    /// Build a client for `{base_url}/embeddings`.
    pub fn new(
        base_url: &str,
        model: impl Into<String>,
        api_key: Option<String>,
        timeout: Option<Duration>,
    ) -> Result<Self, BackendError> {
        let mut builder = reqwest::Client::builder().user_agent("meeple/0.1");
        if let Some(t) = timeout {
            builder = builder.timeout(t);
        }
        let client = builder
            .build()
            .map_err(|e| BackendError::Unavailable(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            endpoint: format!("{}/embeddings", base_url.trim_end_matches('/')),
            model: model.into(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        })
    }

    async fn request(&self, text: &str) -> Result<Vec<f32>, BackendError> {
        let body = EmbeddingRequest {
            model: &self.model,
            input: [text],
        };
        let start = Instant::now();
        let mut req = self.client.post(&self.endpoint).json(&body);
        if let Some(ref key) = self.api_key {
            req = req.bearer_auth(key);
        }
        let resp = req
            .send()
            .await
            .map_err(|e| BackendError::Request(e.to_string()))?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| BackendError::Request(format!("failed to read response: {e}")))?;
        debug!(
            "Embedding response: HTTP {} in {:.2}s ({} bytes)",
            status,
            start.elapsed().as_secs_f64(),
            text.len()
        );
        if !status.is_success() {
            return Err(BackendError::Status {
                service: "embedding",
                status: status.as_u16(),
                body: text,
            });
        }

        let parsed: EmbeddingResponse =
            serde_json::from_str(&text).map_err(|e| BackendError::Decode(e.to_string()))?;
        let mut vector = parsed
            .data
            .into_iter()
            .min_by_key(|d| d.index)
            .map(|d| d.embedding)
            .ok_or(BackendError::Empty("embedding"))?;
        l2_normalize(&mut vector);
        Ok(vector)
    }
}

impl Embedder for HttpEmbedder {
    fn embed<'a>(&'a self, text: &'a str) -> EmbedFuture<'a> {
        Box::pin(self.request(text))
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: [&'a str; 1],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    #[serde(default)]
    index: usize,
}
