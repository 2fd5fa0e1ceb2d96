//! Hosted chat-completion backend.

use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::retry::{RetryConfig, with_retry};
use super::{GenerateFuture, GenerationRequest, Generator};
use crate::config::HostedConfig;
use crate::error::BackendError;
use crate::session::Role;

/// Client for an OpenAI-compatible `/chat/completions` endpoint.
pub struct ChatGenerator {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    model: String,
    temperature: f32,
    retry: RetryConfig,
}

impl ChatGenerator {
    pub fn new(config: &HostedConfig, retry: RetryConfig) -> Result<Self, BackendError> {
        let mut builder = reqwest::Client::builder().user_agent("meeple/0.1");
        if let Some(t) = config.timeout {
            builder = builder.timeout(t);
        }
        let client = builder
            .build()
            .map_err(|e| BackendError::Unavailable(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            api_key: config.api_key.clone().filter(|k| !k.trim().is_empty()),
            model: config.model.clone(),
            temperature: config.temperature,
            retry,
        })
    }

    async fn complete(&self, body: &ChatRequest<'_>) -> Result<String, BackendError> {
        debug!(
            "LLM request: model={}, messages={}, temp={}",
            body.model,
            body.messages.len(),
            body.temperature,
        );
        trace!(
            "Request payload size: {} bytes",
            serde_json::to_string(body).map_or(0, |s| s.len())
        );

        let start = Instant::now();
        let mut req = self.client.post(&self.endpoint).json(body);
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
            "LLM response: HTTP {} in {:.1}s ({} bytes)",
            status,
            start.elapsed().as_secs_f64(),
            text.len()
        );

        if !status.is_success() {
            return Err(BackendError::Status {
                service: "chat",
                status: status.as_u16(),
                body: text,
            });
        }
        parse_completion(&text)
    }
}

impl Generator for ChatGenerator {
    fn name(&self) -> &str {
        "hosted"
    }

    fn generate<'a>(&'a self, request: GenerationRequest<'a>) -> GenerateFuture<'a> {
        Box::pin(async move {
            let body = ChatRequest {
                model: &self.model,
                messages: build_messages(&request),
                temperature: self.temperature,
            };
            with_retry(&self.retry, "chat", || self.complete(&body)).await
        })
    }
}

// ── Wire types ─────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Serialize, PartialEq)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

/// System turn, then history oldest-first, then the new user turn.
fn build_messages<'a>(request: &GenerationRequest<'a>) -> Vec<ChatMessage<'a>> {
    let mut messages = Vec::with_capacity(request.history.len() + 2);
    messages.push(ChatMessage {
        role: "system",
        content: request.system,
    });
    for turn in request.history {
        messages.push(ChatMessage {
            role: match turn.role {
                Role::Human => "user",
                Role::Assistant => "assistant",
            },
            content: &turn.content,
        });
    }
    messages.push(ChatMessage {
        role: "user",
        content: request.user,
    });
    messages
}

#[derive(Debug, Deserialize)]
struct RawChatResponse {
    choices: Option<Vec<RawChoice>>,
    error: Option<RawError>,
}

#[derive(Debug, Deserialize)]
struct RawChoice {
    message: RawMessage,
}

#[derive(Debug, Deserialize)]
struct RawMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawError {
    message: String,
}

fn parse_completion(text: &str) -> Result<String, BackendError> {
    let parsed: RawChatResponse =
        serde_json::from_str(text).map_err(|e| BackendError::Decode(e.to_string()))?;
    if let Some(err) = parsed.error {
        return Err(BackendError::Unavailable(format!("chat API error: {}", err.message)));
    }
    let content = parsed
        .choices
        .and_then(|c| c.into_iter().next())
        .and_then(|c| c.message.content)
        .ok_or(BackendError::Empty("chat completion"))?;
    debug!("LLM output: {} chars", content.len());
    Ok(content)
}
