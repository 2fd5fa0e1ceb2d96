//! Text generation backends.
//!
//! The orchestration layer sees one capability, [`Generator`]: given a
//! system instruction, the session's prior turns, and the new user turn,
//! produce text. Which backend implements it is decided once, when the
//! [`Assistant`](crate::Assistant) is built.
//!
//! | Backend | Wire | Decoding |
//! |---------|------|----------|
//! | [`ChatGenerator`] | OpenAI-compatible `/chat/completions` | temperature 0.7 |
//! | [`LocalGenerator`] | Ollama-compatible `/api/generate` | greedy, 128 new tokens |

mod chat;
mod local;
pub mod retry;

pub use chat::ChatGenerator;
pub use local::LocalGenerator;

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::BackendError;
use crate::session::Turn;

/// Boxed future returned by [`Generator::generate`].
pub type GenerateFuture<'a> =
    Pin<Box<dyn Future<Output = Result<String, BackendError>> + Send + 'a>>;

/// Everything a backend needs for one call. History is oldest-first.
#[derive(Debug, Clone, Copy)]
pub struct GenerationRequest<'a> {
    pub system: &'a str,
    pub history: &'a [Turn],
    pub user: &'a str,
}

/// A text generation backend.
pub trait Generator: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &str;

    /// Produce the raw completion for `request`.
    fn generate<'a>(&'a self, request: GenerationRequest<'a>) -> GenerateFuture<'a>;
}

/// Which backend to construct.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Hosted chat-completion API.
    #[default]
    Hosted,
    /// Locally served fine-tuned model.
    Local,
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hosted" | "chat" | "openai" => Ok(BackendKind::Hosted),
            "local" | "finetuning" | "ollama" => Ok(BackendKind::Local),
            other => Err(format!("unknown backend '{other}' (expected 'hosted' or 'local')")),
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BackendKind::Hosted => "hosted",
            BackendKind::Local => "local",
        })
    }
}
