//! Error types for the orchestration layer.
//!
//! Backends fail with [`BackendError`]. The orchestration layer lifts those,
//! together with data and lookup failures, into [`RagError`], which carries
//! enough context to render the user-facing message at the outermost
//! boundary (see [`RagError::user_message`]).

use thiserror::Error;

use crate::prompt::Task;

/// Result alias for orchestration operations.
pub type Result<T> = std::result::Result<T, RagError>;

/// Which store a missing entity was looked up in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityStoreKind {
    /// Per-game rule chunks and their vector index.
    RuleChunks,
    /// Full rule records (`game.json`).
    FullRecords,
}

/// Failure of an embedding or generation backend.
///
/// The `Display` output keeps the `HTTP {status}` / `request failed:` shapes
/// so log lines read the same regardless of which backend produced them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    #[error("request failed: {0}")]
    Request(String),
    #[error("{service} API HTTP {status}: {body}")]
    Status {
        service: &'static str,
        status: u16,
        body: String,
    },
    #[error("failed to parse response: {0}")]
    Decode(String),
    #[error("{0} returned an empty response")]
    Empty(&'static str),
    #[error("backend unavailable: {0}")]
    Unavailable(String),
    #[error("vector index error: {0}")]
    Index(String),
}

impl BackendError {
    /// Whether this failure is worth retrying (429, 5xx, network errors).
    pub fn is_transient(&self) -> bool {
        match self {
            BackendError::Request(_) => true,
            BackendError::Status { status, .. } => *status == 429 || (500..=504).contains(status),
            _ => false,
        }
    }
}

/// Every way a task can fail, as seen by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RagError {
    /// Required data files were missing or unreadable.
    #[error("{task} data unavailable: {detail}")]
    DataUnavailable { task: Task, detail: String },
    /// Retrieval ran but produced no usable context blocks.
    #[error("{task} retrieval produced no context")]
    EmptyContext { task: Task },
    /// The named game is absent from the store the task reads.
    #[error("'{entity}' not found in {store:?}")]
    EntityNotFound {
        entity: String,
        store: EntityStoreKind,
    },
    /// The game's rule chunks exist but none were retrieved for the question.
    #[error("no rule context for '{entity}'")]
    NoRelevantContext { entity: String },
    /// The game's full rule record has empty text.
    #[error("rule text for '{entity}' is empty")]
    EmptyRuleText { entity: String },
    /// Embedding or generation backend failed.
    #[error("{task} backend failure: {source}")]
    BackendFailure { task: Task, source: BackendError },
}

impl RagError {
    pub fn backend(task: Task, source: BackendError) -> Self {
        RagError::BackendFailure { task, source }
    }

    /// Short machine-readable name of the variant.
    pub fn kind(&self) -> &'static str {
        match self {
            RagError::DataUnavailable { .. } => "data_unavailable",
            RagError::EmptyContext { .. } => "empty_context",
            RagError::EntityNotFound { .. } => "entity_not_found",
            RagError::NoRelevantContext { .. } => "no_relevant_context",
            RagError::EmptyRuleText { .. } => "empty_rule_text",
            RagError::BackendFailure { .. } => "backend_failure",
        }
    }

    /// The message shown to end users in place of an answer.
    pub fn user_message(&self) -> String {
        match self {
            RagError::DataUnavailable {
                task: Task::Recommend,
                ..
            }
            | RagError::EmptyContext {
                task: Task::Recommend,
            } => "추천할 게임 데이터를 찾을 수 없습니다. 인덱스나 데이터 로드를 확인해주세요."
                .to_string(),
            RagError::DataUnavailable { task, detail } => {
                format!("{} 중 오류가 발생했습니다: {detail}", task.label())
            }
            RagError::EmptyContext { task } => {
                format!("{}에 필요한 정보를 찾을 수 없습니다.", task.label())
            }
            RagError::EntityNotFound {
                entity,
                store: EntityStoreKind::RuleChunks,
            } => format!(
                "'{entity}' 게임의 룰 데이터를 찾을 수 없습니다. 해당 게임의 데이터가 올바른 경로에 있는지 확인해주세요."
            ),
            RagError::EntityNotFound {
                entity,
                store: EntityStoreKind::FullRecords,
            } => format!(
                "'{entity}' 게임의 전체 룰 정보를 찾을 수 없습니다. 'game.json' 파일을 확인해주세요."
            ),
            RagError::NoRelevantContext { entity } => {
                format!("'{entity}' 게임 룰에서 질문에 대한 관련 정보를 찾을 수 없습니다.")
            }
            RagError::EmptyRuleText { entity } => {
                format!("'{entity}' 게임의 룰 내용이 비어 있습니다.")
            }
            RagError::BackendFailure { task, source } => {
                format!("{} 중 오류가 발생했습니다: {source}", task.label())
            }
        }
    }
}
