//! Context assembly from the vector indices.
//!
//! Two sources feed generation:
//!
//! - the global corpus, searched with the caller's `k` to build the list of
//!   candidate games for a recommendation;
//! - one game's rule chunks, searched with a fixed `k` of
//!   [`RULE_CHUNK_K`](crate::RULE_CHUNK_K) to ground a rule answer.
//!
//! Results keep index order (ascending distance). Positions outside the text
//! arrays are skipped with a warning, never dereferenced.

use std::sync::{Arc, LazyLock};

use regex::Regex;
use tracing::{debug, warn};

use crate::RULE_CHUNK_K;
use crate::corpus::{EntityLookup, EntityStore, GlobalCorpus};
use crate::embedding::Embedder;
use crate::error::{BackendError, EntityStoreKind, RagError, Result};
use crate::index::{Neighbor, VectorIndex};
use crate::prompt::Task;

static COUNT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([0-9]+)\s*개").expect("count pattern is valid"));

/// The count a query asks for, e.g. `5` in "가벼운 게임 5개 추천해줘".
///
/// Only the first match counts and only ASCII digits are read. Zero and
/// unparsable numbers yield `None`.
pub fn requested_count(query: &str) -> Option<usize> {
    let caps = COUNT_RE.captures(query)?;
    caps.get(1)?
        .as_str()
        .parse::<usize>()
        .ok()
        .filter(|&n| n > 0)
}

/// Retrieved context, ready to drop into a template.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Context {
    /// Blocks joined with blank lines.
    pub text: String,
    /// Entity labels of the blocks, in block order. Empty for rule chunks.
    pub labels: Vec<String>,
    /// Number of blocks in `text`.
    pub blocks: usize,
}

impl Context {
    pub fn is_empty(&self) -> bool {
        self.blocks == 0
    }
}

/// Retrieval over the global corpus and the per-game chunk store.
pub struct Retriever {
    embedder: Arc<dyn Embedder>,
    corpus: Arc<GlobalCorpus>,
    entities: EntityStore,
}

impl Retriever {
    pub fn new(embedder: Arc<dyn Embedder>, corpus: Arc<GlobalCorpus>, entities: EntityStore) -> Self {
        Self {
            embedder,
            corpus,
            entities,
        }
    }

    pub fn corpus(&self) -> &GlobalCorpus {
        &self.corpus
    }

    /// Top-`k` game descriptions for `query`, as `"[label]\ntext"` blocks.
    ///
    /// `k` is capped at the corpus size.
    pub async fn recommendation_context(&self, query: &str, k: usize) -> Result<Context> {
        let task = Task::Recommend;
        let Some(index) = self.corpus.index().filter(|_| self.corpus.is_ready()) else {
            warn!("Recommendation search skipped: index or text data not loaded");
            return Err(RagError::DataUnavailable {
                task,
                detail: "recommendation index or texts not loaded".into(),
            });
        };

        let k = k.min(index.len());
        let neighbors = self.search(task, index.as_ref(), query, k).await?;
        let mut context = Context::default();
        let mut blocks = Vec::with_capacity(neighbors.len());
        for n in &neighbors {
            match n.index().and_then(|i| self.corpus.record(i)) {
                Some((label, text)) => {
                    blocks.push(format!("[{label}]\n{text}"));
                    context.labels.push(label.to_string());
                }
                None => warn!(
                    "No game name or text at position {}; skipping",
                    n.position
                ),
            }
        }
        if blocks.is_empty() {
            return Err(RagError::EmptyContext { task });
        }
        context.blocks = blocks.len();
        context.text = blocks.join("\n\n");
        debug!("Recommendation context: {} blocks for k={k}", context.blocks);
        Ok(context)
    }

    /// The [`RULE_CHUNK_K`] rule chunks of `entity` closest to `question`.
    pub async fn rule_context(&self, entity: &str, question: &str) -> Result<Context> {
        let task = Task::RuleQuestion;
        let corpus = match self.entities.open(entity).await {
            Ok(c) => c,
            Err(EntityLookup::Missing) => {
                return Err(RagError::EntityNotFound {
                    entity: entity.to_string(),
                    store: EntityStoreKind::RuleChunks,
                });
            }
            Err(EntityLookup::Unreadable(detail)) => {
                warn!("Rule data for '{entity}' unreadable: {detail}");
                return Err(RagError::DataUnavailable { task, detail });
            }
        };

        let neighbors = self.search(task, &corpus.index, question, RULE_CHUNK_K).await?;
        let chunks: Vec<&str> = neighbors
            .iter()
            .filter_map(|n| n.index().and_then(|i| corpus.chunks.get(i)))
            .map(String::as_str)
            .collect();
        if chunks.len() < neighbors.len() {
            warn!(
                "Rule search for '{entity}' returned {} positions outside {} chunks",
                neighbors.len() - chunks.len(),
                corpus.chunks.len()
            );
        }

        let text = chunks.join("\n\n");
        if text.is_empty() {
            return Err(RagError::NoRelevantContext {
                entity: entity.to_string(),
            });
        }
        Ok(Context {
            text,
            labels: Vec::new(),
            blocks: chunks.len(),
        })
    }

    async fn search(
        &self,
        task: Task,
        index: &dyn VectorIndex,
        text: &str,
        k: usize,
    ) -> Result<Vec<Neighbor>> {
        let vector = self
            .embedder
            .embed(text)
            .await
            .map_err(|e| RagError::backend(task, e))?;
        index
            .search(&vector, k)
            .map_err(|e| RagError::backend(task, BackendError::Index(e.to_string())))
    }
}
