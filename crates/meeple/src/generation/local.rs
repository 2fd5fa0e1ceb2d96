//! Local fine-tuned model served by an Ollama-compatible runtime.
//!
//! The runtime hosts the adapter-merged model and, as a fallback, its base
//! model. [`LocalGenerator::connect`] picks whichever is present, preferring
//! the fine-tuned one. Decoding is greedy with a hard cap on new tokens.

use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::retry::{RetryConfig, with_retry};
use super::{GenerateFuture, GenerationRequest, Generator};
use crate::config::LocalConfig;
use crate::error::BackendError;
use crate::session::Role;

/// Returned in place of an answer when the model produces only whitespace.
pub const EMPTY_ANSWER: &str = "질문에 대한 답변을 생성할 수 없습니다.";

pub struct LocalGenerator {
    client: reqwest::Client,
    base_url: String,
    model: String,
    max_new_tokens: u32,
    retry: RetryConfig,
}

impl LocalGenerator {
    /// Probe the runtime and bind to the fine-tuned model, or the base model
    /// if the fine-tuned one is not installed.
    pub async fn connect(config: &LocalConfig, retry: RetryConfig) -> Result<Self, BackendError> {
        let mut builder = reqwest::Client::builder().user_agent("meeple/0.1");
        if let Some(t) = config.timeout {
            builder = builder.timeout(t);
        }
        let client = builder
            .build()
            .map_err(|e| BackendError::Unavailable(format!("failed to build HTTP client: {e}")))?;
        let base_url = config.base_url.trim_end_matches('/').to_string();

        let mut last_err = None;
        for candidate in [&config.model, &config.base_model] {
            match probe(&client, &base_url, candidate).await {
                Ok(()) => {
                    info!("Local model ready: {candidate}");
                    return Ok(Self {
                        client,
                        base_url,
                        model: candidate.clone(),
                        max_new_tokens: config.max_new_tokens,
                        retry,
                    });
                }
                Err(e) => {
                    warn!("Local model '{candidate}' unavailable: {e}");
                    last_err = Some(e);
                }
            }
        }
        Err(last_err.unwrap_or_else(|| BackendError::Unavailable("no local model configured".into())))
    }

    async fn complete(&self, prompt: &str) -> Result<String, BackendError> {
        let body = GenerateRequest {
            model: &self.model,
            prompt,
            raw: true,
            stream: false,
            options: DecodeOptions {
                temperature: 0.0,
                top_p: 1.0,
                num_predict: self.max_new_tokens,
            },
        };
        debug!(
            "Local request: model={}, prompt={} chars, num_predict={}",
            self.model,
            prompt.len(),
            self.max_new_tokens
        );
        let start = Instant::now();
        let resp = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(|e| BackendError::Request(e.to_string()))?;
        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| BackendError::Request(format!("failed to read response: {e}")))?;
        debug!(
            "Local response: HTTP {} in {:.1}s ({} bytes)",
            status,
            start.elapsed().as_secs_f64(),
            text.len()
        );
        if !status.is_success() {
            return Err(BackendError::Status {
                service: "local model",
                status: status.as_u16(),
                body: text,
            });
        }
        let parsed: GenerateResponse =
            serde_json::from_str(&text).map_err(|e| BackendError::Decode(e.to_string()))?;
        Ok(parsed.response)
    }
}

impl Generator for LocalGenerator {
    fn name(&self) -> &str {
        "local"
    }

    fn generate<'a>(&'a self, request: GenerationRequest<'a>) -> GenerateFuture<'a> {
        Box::pin(async move {
            let prompt = render_prompt(&request);
            let output = with_retry(&self.retry, "local model", || self.complete(&prompt)).await?;
            Ok(strip_echo(&output, &prompt))
        })
    }
}

async fn probe(client: &reqwest::Client, base_url: &str, model: &str) -> Result<(), BackendError> {
    let resp = client
        .post(format!("{base_url}/api/show"))
        .json(&ShowRequest { model })
        .send()
        .await
        .map_err(|e| BackendError::Request(e.to_string()))?;
    let status = resp.status();
    if status.is_success() {
        Ok(())
    } else {
        Err(BackendError::Status {
            service: "local model",
            status: status.as_u16(),
            body: resp.text().await.unwrap_or_default(),
        })
    }
}

/// Flatten the request into the instruction format the model was tuned on.
fn render_prompt(request: &GenerationRequest<'_>) -> String {
    let mut parts = Vec::with_capacity(request.history.len() + 2);
    if !request.system.is_empty() {
        parts.push(request.system.to_string());
    }
    for turn in request.history {
        parts.push(match turn.role {
            Role::Human => format!("### 질문: {}", turn.content),
            Role::Assistant => format!("### 답변: {}", turn.content),
        });
    }
    parts.push(format!("### 질문: {}", request.user));
    parts.join("\n\n")
}

/// Remove an echoed prompt and substitute [`EMPTY_ANSWER`] for blank output.
fn strip_echo(output: &str, prompt: &str) -> String {
    let answer = output.replace(prompt, "");
    let answer = answer.trim();
    let answer = answer.strip_prefix("### 답변:").map_or(answer, str::trim);
    if answer.is_empty() {
        EMPTY_ANSWER.to_string()
    } else {
        answer.to_string()
    }
}

// ── Wire types ─────────────────────────────────────────────────────

#[derive(Serialize)]
struct ShowRequest<'a> {
    model: &'a str,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    raw: bool,
    stream: bool,
    options: DecodeOptions,
}

#[derive(Serialize)]
struct DecodeOptions {
    temperature: f32,
    top_p: f32,
    num_predict: u32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}
