//! Grounded board-game assistant.
//!
//! `meeple` answers three kinds of questions about board games by combining
//! nearest-neighbor retrieval over pre-built indices with LLM generation:
//!
//! - **Recommendation:** embed a free-text query, pull the closest game
//!   descriptions from the global corpus, and ask the model to pick games
//!   from that list only.
//! - **Rule questions:** search a single game's rule chunks (fixed k = 3) and
//!   answer strictly from them.
//! - **Rule summaries:** pass a game's full rule text to the model and ask for
//!   a structured explanation.
//!
//! The entry point is [`Assistant`](service::Assistant). It owns the
//! [`Retriever`](retrieval::Retriever), the [`RuleBook`](corpus::RuleBook),
//! a [`Generator`](generation::Generator) chosen once at construction, and the
//! [`SessionStore`](session::SessionStore) that carries conversation history
//! between calls.
//!
//! ```ignore
//! use meeple::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), String> {
//!     let assistant = AssistantConfig::default().build().await?;
//!     let reply = assistant.recommend("가벼운 파티 게임 추천해줘", 3, "demo").await;
//!     println!("{}", render_reply(reply));
//!     Ok(())
//! }
//! ```
//!
//! # Where to find things
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`index`] | [`VectorIndex`](index::VectorIndex) trait and the FAISS-compatible [`FlatIndex`](index::FlatIndex) |
//! | [`corpus`] | Global corpus, per-game chunk store, full rule records |
//! | [`embedding`] | [`Embedder`](embedding::Embedder) trait and the HTTP embedding client |
//! | [`retrieval`] | Context assembly for recommendations and rule questions |
//! | [`session`] | Per-session turn history |
//! | [`prompt`] | Task templates and the prompt builder |
//! | [`generation`] | [`Generator`](generation::Generator) trait, hosted and local backends, retry |
//! | [`postprocess`] | Sentinel truncation and grounding checks |
//! | [`service`] | The [`Assistant`](service::Assistant) orchestration layer |
//! | [`config`] | [`AssistantConfig`](config::AssistantConfig) and startup wiring |
//! | [`error`] | [`RagError`](error::RagError) and user-facing rendering |

pub mod config;
pub mod corpus;
pub mod embedding;
pub mod error;
pub mod generation;
pub mod index;
pub mod postprocess;
pub mod prelude;
pub mod prompt;
pub mod retrieval;
pub mod service;
pub mod session;

#[cfg(test)]
pub(crate) mod test_support;

pub use error::{BackendError, RagError, Result};
pub use service::{Assistant, render_reply};

// ── Constants ──────────────────────────────────────────────────────

/// Session id used when the caller does not supply one.
pub const DEFAULT_SESSION_ID: &str = "default_session";

/// Number of recommendations requested when the query does not name a count.
pub const DEFAULT_TOP_K: usize = 3;

/// Number of rule chunks retrieved per rule question. Not caller-configurable.
pub const RULE_CHUNK_K: usize = 3;

/// Entity names returned by `list_entities` when no corpus is loaded.
pub const DEFAULT_GAMES: [&str; 10] = [
    "카탄",
    "스플렌더",
    "아줄",
    "윙스팬",
    "뱅",
    "킹 오브 도쿄",
    "7 원더스",
    "도미니언",
    "스몰 월드",
    "티켓 투 라이드",
];
