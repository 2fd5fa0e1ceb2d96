//! Assistant configuration with sensible defaults.
//!
//! [`AssistantConfig`] captures data locations, backend endpoints, and
//! behavior switches, and wires them into a ready [`Assistant`] via
//! [`build`](AssistantConfig::build). Data loading degrades to empty sets
//! with a warning; only backend construction can fail the build.
//!
//! [`AssistantArgs`] is the command-line and environment face of the same
//! settings, shared by the CLI and the HTTP server.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use tracing::info;

use crate::corpus::{DataPaths, EntityStore, GlobalCorpus, RuleBook};
use crate::embedding::{DEFAULT_EMBEDDING_MODEL, Embedder, HttpEmbedder};
use crate::generation::retry::RetryConfig;
use crate::generation::{BackendKind, ChatGenerator, Generator, LocalGenerator};
use crate::retrieval::Retriever;
use crate::service::Assistant;
use crate::session::SessionStore;

/// Hosted chat-completion backend settings.
#[derive(Debug, Clone)]
pub struct HostedConfig {
    /// Default: `"https://api.openai.com/v1"`.
    pub base_url: String,
    pub api_key: Option<String>,
    /// Default: `"gpt-3.5-turbo"`.
    pub model: String,
    /// Default: `0.7`.
    pub temperature: f32,
    /// Default: none (a stalled call stalls the request).
    pub timeout: Option<Duration>,
}

impl Default for HostedConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: None,
            model: "gpt-3.5-turbo".to_string(),
            temperature: 0.7,
            timeout: None,
        }
    }
}

/// Local model runtime settings.
#[derive(Debug, Clone)]
pub struct LocalConfig {
    /// Default: `"http://localhost:11434"`.
    pub base_url: String,
    /// Fine-tuned (adapter-merged) model, tried first.
    pub model: String,
    /// Base model used when the fine-tuned one is not installed.
    pub base_model: String,
    /// Generation length cap. Default: `128`.
    pub max_new_tokens: u32,
    pub timeout: Option<Duration>,
}

impl Default for LocalConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            model: "minjeongHuggingFace/koalpaca-bang_e9".to_string(),
            base_model: "beomi/KoAlpaca-Polyglot-5.8B".to_string(),
            max_new_tokens: 128,
            timeout: None,
        }
    }
}

/// Embedding endpoint settings.
#[derive(Debug, Clone)]
pub struct EmbeddingConfig {
    /// Default: `"http://localhost:8080/v1"`.
    pub base_url: String,
    /// Default: `"BAAI/bge-m3"`.
    pub model: String,
    pub api_key: Option<String>,
    pub timeout: Option<Duration>,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/v1".to_string(),
            model: DEFAULT_EMBEDDING_MODEL.to_string(),
            api_key: None,
            timeout: None,
        }
    }
}

/// Top-level configuration for an [`Assistant`].
#[derive(Debug, Clone, Default)]
pub struct AssistantConfig {
    /// Directory holding the index and record files. Default: `"data"`.
    pub data_dir: PathBuf,
    /// Which generation backend to construct. Default: hosted.
    pub backend: BackendKind,
    pub hosted: HostedConfig,
    pub local: LocalConfig,
    pub embedding: EmbeddingConfig,
    /// Applied to generation calls. Default: no retries.
    pub retry: RetryConfig,
    /// Drop recommendation lines naming games outside the retrieved context.
    /// Default: `false` (ungrounded lines are only logged).
    pub strict_grounding: bool,
}

impl AssistantConfig {
    /// Config rooted at `data_dir`, everything else default.
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Default::default()
        }
    }

    /// Resolved data file locations.
    pub fn data_paths(&self) -> DataPaths {
        if self.data_dir.as_os_str().is_empty() {
            DataPaths::default()
        } else {
            DataPaths::under(&self.data_dir)
        }
    }

    /// Construct the selected generation backend.
    pub async fn build_generator(&self) -> Result<Arc<dyn Generator>, String> {
        let generator: Arc<dyn Generator> = match self.backend {
            BackendKind::Hosted => Arc::new(
                ChatGenerator::new(&self.hosted, self.retry.clone()).map_err(|e| e.to_string())?,
            ),
            BackendKind::Local => Arc::new(
                LocalGenerator::connect(&self.local, self.retry.clone())
                    .await
                    .map_err(|e| format!("local model unavailable: {e}"))?,
            ),
        };
        Ok(generator)
    }

    /// Load data, construct backends, and return a ready assistant.
    pub async fn build(&self) -> Result<Assistant, String> {
        let paths = self.data_paths();
        let corpus = GlobalCorpus::load(&paths);
        let rules = RuleBook::load(&paths.rule_book);
        let entities = EntityStore::new(paths.entity_dir.clone());

        let embedder: Arc<dyn Embedder> = Arc::new(
            HttpEmbedder::new(
                &self.embedding.base_url,
                self.embedding.model.clone(),
                self.embedding.api_key.clone(),
                self.embedding.timeout,
            )
            .map_err(|e| e.to_string())?,
        );
        let generator = self.build_generator().await?;
        info!(
            "Assistant ready: backend={}, recommendation corpus ready={}, rule records={}",
            generator.name(),
            corpus.is_ready(),
            rules.names().len()
        );

        let retriever = Retriever::new(embedder, Arc::new(corpus), entities);
        Ok(
            Assistant::new(retriever, rules, generator, Arc::new(SessionStore::new()))
                .with_strict_grounding(self.strict_grounding),
        )
    }
}

// ── Command line ────────────────────────────────────────────────────

/// Assistant settings as command-line flags with environment fallbacks.
#[derive(Debug, Clone, Args)]
pub struct AssistantArgs {
    // ── Data ───────────────────────────────────────────────────
    /// Directory holding game_index.faiss, game_names.json, texts.json,
    /// game.json and game_data/game_data/
    #[arg(long, env = "MEEPLE_DATA_DIR", default_value = "data", global = true)]
    pub data_dir: PathBuf,

    // ── Generation ─────────────────────────────────────────────
    /// Generation backend: hosted or local
    #[arg(long, env = "MEEPLE_BACKEND", default_value = "hosted", global = true)]
    pub backend: BackendKind,

    /// Hosted chat-completion base URL
    #[arg(long, env = "OPENAI_BASE_URL", default_value = "https://api.openai.com/v1", global = true)]
    pub chat_url: String,

    /// Hosted chat API key
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true, global = true)]
    pub api_key: Option<String>,

    /// Hosted chat model
    #[arg(long, env = "MEEPLE_CHAT_MODEL", default_value = "gpt-3.5-turbo", global = true)]
    pub model: String,

    /// Local model runtime base URL
    #[arg(long, env = "MEEPLE_LOCAL_URL", default_value = "http://localhost:11434", global = true)]
    pub local_url: String,

    /// Retries for transient backend failures
    #[arg(long, default_value_t = 0, global = true)]
    pub retries: u32,

    /// Per-request timeout in seconds (no timeout if omitted)
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Drop recommendation lines naming games outside the retrieved context
    #[arg(long, global = true)]
    pub strict_grounding: bool,

    // ── Embedding ──────────────────────────────────────────────
    /// Embedding endpoint base URL
    #[arg(long, env = "MEEPLE_EMBEDDING_URL", default_value = "http://localhost:8080/v1", global = true)]
    pub embedding_url: String,

    /// Embedding endpoint API key
    #[arg(long, env = "MEEPLE_EMBEDDING_KEY", hide_env_values = true, global = true)]
    pub embedding_key: Option<String>,
}

impl From<AssistantArgs> for AssistantConfig {
    fn from(args: AssistantArgs) -> Self {
        let timeout = args.timeout.map(Duration::from_secs);
        Self {
            data_dir: args.data_dir,
            backend: args.backend,
            hosted: HostedConfig {
                base_url: args.chat_url,
                api_key: args.api_key,
                model: args.model,
                timeout,
                ..HostedConfig::default()
            },
            local: LocalConfig {
                base_url: args.local_url,
                timeout,
                ..LocalConfig::default()
            },
            embedding: EmbeddingConfig {
                base_url: args.embedding_url,
                api_key: args.embedding_key,
                timeout,
                ..EmbeddingConfig::default()
            },
            retry: RetryConfig::with_retries(args.retries),
            strict_grounding: args.strict_grounding,
        }
    }
}
