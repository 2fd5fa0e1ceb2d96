//! Convenience re-exports for common `meeple` types.
//!
//! ```ignore
//! use meeple::prelude::*;
//! ```
//!
//! Covers building an [`Assistant`] from config, running the three tasks,
//! and plugging in custom backends. Index file internals and wire types stay
//! in their modules.

// ── Orchestration ───────────────────────────────────────────────────
pub use crate::config::{AssistantArgs, AssistantConfig, EmbeddingConfig, HostedConfig, LocalConfig};
pub use crate::error::{BackendError, RagError};
pub use crate::service::{Assistant, render_reply};
pub use crate::{DEFAULT_SESSION_ID, DEFAULT_TOP_K};

// ── Backends ────────────────────────────────────────────────────────
pub use crate::embedding::{Embedder, HttpEmbedder};
pub use crate::generation::retry::RetryConfig;
pub use crate::generation::{BackendKind, ChatGenerator, Generator, LocalGenerator};

// ── Data ────────────────────────────────────────────────────────────
pub use crate::corpus::{DataPaths, EntityStore, GlobalCorpus, RuleBook};
pub use crate::retrieval::Retriever;
pub use crate::session::{Role, SessionStore, Turn};
