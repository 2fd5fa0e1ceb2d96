//! Deterministic embedders, generators, and data fixtures for unit tests.

use std::collections::VecDeque;
use std::path::Path;
use std::sync::{Arc, Mutex};

use crate::corpus::{EntityStore, FullRecord, GlobalCorpus, RuleBook};
use crate::embedding::{EmbedFuture, Embedder, l2_normalize};
use crate::error::BackendError;
use crate::generation::{GenerateFuture, GenerationRequest, Generator};
use crate::index::{FlatIndex, IndexError, Metric, Neighbor, VectorIndex};
use crate::retrieval::Retriever;
use crate::service::Assistant;
use crate::session::{Role, SessionStore};

/// Keywords the fake embedder projects onto. Dimension 0 is a constant bias
/// so no text maps to the zero vector.
const VOCAB: &[&str] = &[
    "파티", "전략", "교역", "카드", "협력", "보안관", "무법자", "배신자", "부관", "타일",
];

/// Embeds text as normalized keyword presence over [`VOCAB`].
#[derive(Default)]
pub struct KeywordEmbedder;

impl KeywordEmbedder {
    pub fn vector(text: &str) -> Vec<f32> {
        let mut v = Vec::with_capacity(VOCAB.len() + 1);
        v.push(1.0);
        v.extend(VOCAB.iter().map(|w| if text.contains(w) { 1.0 } else { 0.0 }));
        l2_normalize(&mut v);
        v
    }
}

impl Embedder for KeywordEmbedder {
    fn embed<'a>(&'a self, text: &'a str) -> EmbedFuture<'a> {
        Box::pin(async move { Ok(Self::vector(text)) })
    }
}

/// Always fails with a transport error.
pub struct FailingEmbedder;

impl Embedder for FailingEmbedder {
    fn embed<'a>(&'a self, _text: &'a str) -> EmbedFuture<'a> {
        Box::pin(async { Err(BackendError::Request("embedding server down".into())) })
    }
}

/// Index that ignores the query and returns fixed positions.
pub struct StubIndex {
    len: usize,
    positions: Vec<i64>,
}

impl StubIndex {
    pub fn new(len: usize, positions: Vec<i64>) -> Self {
        Self { len, positions }
    }
}

impl VectorIndex for StubIndex {
    fn dimension(&self) -> usize {
        VOCAB.len() + 1
    }

    fn len(&self) -> usize {
        self.len
    }

    fn search(&self, _query: &[f32], k: usize) -> Result<Vec<Neighbor>, IndexError> {
        Ok(self
            .positions
            .iter()
            .take(k)
            .enumerate()
            .map(|(i, &position)| Neighbor {
                distance: i as f32,
                position,
            })
            .collect())
    }
}

// ── Generator ──────────────────────────────────────────────────────

/// One observed `generate` call.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub system: String,
    pub history: Vec<(Role, String)>,
    pub user: String,
}

/// Returns queued replies (or a default) and records every call.
pub struct ScriptedGenerator {
    replies: Mutex<VecDeque<Result<String, BackendError>>>,
    default_reply: String,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedGenerator {
    pub fn new(default_reply: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(VecDeque::new()),
            default_reply: default_reply.into(),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn push_reply(&self, reply: Result<String, BackendError>) {
        self.replies.lock().unwrap().push_back(reply);
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl Generator for ScriptedGenerator {
    fn name(&self) -> &str {
        "scripted"
    }

    fn generate<'a>(&'a self, request: GenerationRequest<'a>) -> GenerateFuture<'a> {
        self.calls.lock().unwrap().push(RecordedCall {
            system: request.system.to_string(),
            history: request
                .history
                .iter()
                .map(|t| (t.role, t.content.clone()))
                .collect(),
            user: request.user.to_string(),
        });
        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(self.default_reply.clone()));
        Box::pin(async move { reply })
    }
}

// ── Fixtures ───────────────────────────────────────────────────────

/// Six games with keyword-bearing descriptions.
pub const GAMES: &[(&str, &str)] = &[
    ("카탄", "자원을 교역하며 섬을 개척하는 전략 게임"),
    ("스플렌더", "보석 카드를 모으는 가벼운 전략 게임"),
    ("뱅", "보안관과 무법자가 대결하는 파티 카드 게임"),
    ("아줄", "타일을 배치하는 추상 전략 게임"),
    ("딕싯", "그림 카드로 이야기하는 파티 게임"),
    ("팬데믹", "질병을 막는 협력 게임"),
];

/// Global corpus over [`GAMES`], embedded with [`KeywordEmbedder`].
pub fn global_corpus() -> GlobalCorpus {
    let vectors: Vec<Vec<f32>> = GAMES
        .iter()
        .map(|(_, text)| KeywordEmbedder::vector(text))
        .collect();
    let index = FlatIndex::from_vectors(Metric::L2, &vectors).unwrap();
    GlobalCorpus::new(
        Some(Arc::new(index) as Arc<dyn VectorIndex>),
        GAMES.iter().map(|(n, _)| n.to_string()).collect(),
        GAMES.iter().map(|(_, t)| t.to_string()).collect(),
    )
}

/// Write `<name>.faiss` and `<name>.json` for one game's rule chunks.
pub fn write_entity(dir: &Path, name: &str, chunks: &[&str]) {
    let mut index = FlatIndex::new(VOCAB.len() + 1, Metric::L2);
    for chunk in chunks {
        index.add(&KeywordEmbedder::vector(chunk)).unwrap();
    }
    index.write(&dir.join(format!("{name}.faiss"))).unwrap();
    std::fs::write(
        dir.join(format!("{name}.json")),
        serde_json::to_string(chunks).unwrap(),
    )
    .unwrap();
}

pub fn rule_book(records: &[(&str, &str)]) -> RuleBook {
    RuleBook::new(
        records
            .iter()
            .map(|(name, text)| FullRecord {
                name: name.to_string(),
                text: text.to_string(),
            })
            .collect(),
    )
}

/// Assistant over [`global_corpus`], rule chunks in `dir`, and `generator`.
pub fn assistant(dir: &Path, rules: RuleBook, generator: Arc<ScriptedGenerator>) -> Assistant {
    let retriever = Retriever::new(
        Arc::new(KeywordEmbedder),
        Arc::new(global_corpus()),
        EntityStore::new(dir),
    );
    Assistant::new(retriever, rules, generator, Arc::new(SessionStore::new()))
}
