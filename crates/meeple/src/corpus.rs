//! Read-only data sets prepared offline.
//!
//! - [`GlobalCorpus`]: one description per game, aligned with the global
//!   vector index (`game_index.faiss`, `game_names.json`, `texts.json`).
//! - [`EntityStore`]: a directory holding, per game, `<name>.faiss` and
//!   `<name>.json` (rule chunks). Read from disk on every lookup.
//! - [`RuleBook`]: full rule records from `game.json`.
//!
//! Loading never fails. Missing or unreadable files are logged and the
//! corresponding data set comes up empty; callers see that through
//! [`GlobalCorpus::is_ready`] or lookup misses.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;
use tokio::fs;
use tracing::{info, warn};

use crate::index::{FlatIndex, VectorIndex};

/// Resolved locations of all data files under one data directory.
#[derive(Debug, Clone)]
pub struct DataPaths {
    pub global_index: PathBuf,
    pub labels: PathBuf,
    pub texts: PathBuf,
    pub rule_book: PathBuf,
    pub entity_dir: PathBuf,
}

impl DataPaths {
    /// Default layout under `data_dir`.
    pub fn under(data_dir: impl AsRef<Path>) -> Self {
        let root = data_dir.as_ref();
        Self {
            global_index: root.join("game_index.faiss"),
            labels: root.join("game_names.json"),
            texts: root.join("texts.json"),
            rule_book: root.join("game.json"),
            entity_dir: root.join("game_data").join("game_data"),
        }
    }
}

impl Default for DataPaths {
    fn default() -> Self {
        Self::under("data")
    }
}

// ── Global corpus ──────────────────────────────────────────────────

/// Recommendation corpus: a vector index with parallel label/text arrays.
#[derive(Clone, Default)]
pub struct GlobalCorpus {
    index: Option<Arc<dyn VectorIndex>>,
    labels: Vec<String>,
    texts: Vec<String>,
}

impl std::fmt::Debug for GlobalCorpus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlobalCorpus")
            .field("index_len", &self.index.as_ref().map(|i| i.len()))
            .field("labels", &self.labels.len())
            .field("texts", &self.texts.len())
            .finish()
    }
}

impl GlobalCorpus {
    pub fn new(
        index: Option<Arc<dyn VectorIndex>>,
        labels: Vec<String>,
        texts: Vec<String>,
    ) -> Self {
        if let Some(ref idx) = index
            && (idx.len() != labels.len() || idx.len() != texts.len())
        {
            warn!(
                "Global corpus arrays are not aligned: index={}, labels={}, texts={}",
                idx.len(),
                labels.len(),
                texts.len()
            );
        }
        Self {
            index,
            labels,
            texts,
        }
    }

    /// Load the index and both arrays, degrading each to empty on failure.
    pub fn load(paths: &DataPaths) -> Self {
        let index = match FlatIndex::read(&paths.global_index) {
            Ok(idx) => {
                info!(
                    "Loaded recommendation index: {} vectors ({} dims)",
                    idx.len(),
                    idx.dimension()
                );
                Some(Arc::new(idx) as Arc<dyn VectorIndex>)
            }
            Err(e) => {
                warn!(
                    "Recommendation index unavailable at {}: {e}",
                    paths.global_index.display()
                );
                None
            }
        };
        let labels = load_string_array(&paths.labels, "game names");
        let texts = load_string_array(&paths.texts, "game texts");
        Self::new(index, labels, texts)
    }

    /// Whether index, labels, and texts are all present and non-empty.
    pub fn is_ready(&self) -> bool {
        self.index.is_some() && !self.labels.is_empty() && !self.texts.is_empty()
    }

    pub fn index(&self) -> Option<&Arc<dyn VectorIndex>> {
        self.index.as_ref()
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// `(label, text)` at `position`, if both arrays reach it.
    pub fn record(&self, position: usize) -> Option<(&str, &str)> {
        let label = self.labels.get(position)?;
        let text = self.texts.get(position)?;
        Some((label.as_str(), text.as_str()))
    }
}

// ── Per-entity chunk store ─────────────────────────────────────────

/// One game's rule chunks and their index, loaded for a single request.
pub struct EntityCorpus {
    pub index: FlatIndex,
    pub chunks: Vec<String>,
}

/// Why a per-entity lookup produced no corpus.
#[derive(Debug)]
pub enum EntityLookup {
    /// Index or chunk file does not exist (or the name is not a plain file name).
    Missing,
    /// Files exist but could not be read or parsed.
    Unreadable(String),
}

/// Directory of per-game `<name>.faiss` + `<name>.json` pairs.
#[derive(Debug, Clone)]
pub struct EntityStore {
    dir: PathBuf,
}

impl EntityStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn file_stem_ok(name: &str) -> bool {
        let mut components = Path::new(name).components();
        matches!(
            (components.next(), components.next()),
            (Some(Component::Normal(_)), None)
        )
    }

    /// Load one game's index and chunks from disk. Nothing is cached.
    pub async fn open(&self, name: &str) -> Result<EntityCorpus, EntityLookup> {
        if !Self::file_stem_ok(name) {
            warn!("Rejected rule lookup for non-file entity name {name:?}");
            return Err(EntityLookup::Missing);
        }
        let index_path = self.dir.join(format!("{name}.faiss"));
        let chunks_path = self.dir.join(format!("{name}.json"));
        if !exists(&index_path).await || !exists(&chunks_path).await {
            return Err(EntityLookup::Missing);
        }

        let unreadable = |path: &Path, e: &dyn std::fmt::Display| {
            EntityLookup::Unreadable(format!("{}: {e}", path.display()))
        };
        let bytes = fs::read(&index_path)
            .await
            .map_err(|e| unreadable(&index_path, &e))?;
        let index = FlatIndex::read_from(bytes.as_slice())
            .map_err(|e| unreadable(&index_path, &e))?;
        let raw = fs::read_to_string(&chunks_path)
            .await
            .map_err(|e| unreadable(&chunks_path, &e))?;
        let chunks: Vec<String> =
            serde_json::from_str(&raw).map_err(|e| unreadable(&chunks_path, &e))?;

        if index.len() != chunks.len() {
            warn!(
                "Rule index for '{name}' has {} vectors but {} chunks",
                index.len(),
                chunks.len()
            );
        }
        Ok(EntityCorpus { index, chunks })
    }
}

async fn exists(path: &Path) -> bool {
    fs::try_exists(path).await.unwrap_or(false)
}

// ── Full rule records ──────────────────────────────────────────────

/// A game's complete rule text.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct FullRecord {
    #[serde(rename = "game_name", default)]
    pub name: String,
    #[serde(default)]
    pub text: String,
}

/// Full rule records, looked up by exact name.
#[derive(Debug, Clone, Default)]
pub struct RuleBook {
    records: Vec<FullRecord>,
}

impl RuleBook {
    pub fn new(records: Vec<FullRecord>) -> Self {
        Self { records }
    }

    pub fn load(path: &Path) -> Self {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Rule records unavailable at {}: {e}", path.display());
                return Self::default();
            }
        };
        match serde_json::from_str::<Vec<FullRecord>>(&raw) {
            Ok(records) => {
                info!("Loaded {} full rule records", records.len());
                Self { records }
            }
            Err(e) => {
                warn!("Skipping malformed rule records at {}: {e}", path.display());
                Self::default()
            }
        }
    }

    /// First record whose name equals `name` exactly.
    pub fn find(&self, name: &str) -> Option<&FullRecord> {
        self.records.iter().find(|r| r.name == name)
    }

    /// Non-empty record names in file order.
    pub fn names(&self) -> Vec<String> {
        self.records
            .iter()
            .filter(|r| !r.name.is_empty())
            .map(|r| r.name.clone())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

fn load_string_array(path: &Path, what: &str) -> Vec<String> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) => {
            warn!("No {what} at {}: {e}", path.display());
            return Vec::new();
        }
    };
    match serde_json::from_str::<Vec<String>>(&raw) {
        Ok(items) => {
            info!("Loaded {} {what}", items.len());
            items
        }
        Err(e) => {
            warn!("Skipping malformed {what} at {}: {e}", path.display());
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::Metric;

    #[test]
    fn missing_files_yield_empty_corpus() {
        let dir = tempfile::tempdir().unwrap();
        let paths = DataPaths::under(dir.path());
        let corpus = GlobalCorpus::load(&paths);
        assert!(!corpus.is_ready());
        assert!(corpus.labels().is_empty());
        assert!(RuleBook::load(&paths.rule_book).is_empty());
    }

    #[test]
    fn global_corpus_loads_aligned_arrays() {
        let dir = tempfile::tempdir().unwrap();
        let paths = DataPaths::under(dir.path());
        FlatIndex::from_vectors(Metric::L2, &[vec![1.0, 0.0], vec![0.0, 1.0]])
            .unwrap()
            .write(&paths.global_index)
            .unwrap();
        std::fs::write(&paths.labels, r#"["카탄","아줄"]"#).unwrap();
        std::fs::write(&paths.texts, r#"["자원 교역","타일 놓기"]"#).unwrap();

        let corpus = GlobalCorpus::load(&paths);
        assert!(corpus.is_ready());
        assert_eq!(corpus.record(1), Some(("아줄", "타일 놓기")));
        assert_eq!(corpus.record(2), None);
    }

    #[test]
    fn malformed_labels_degrade_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("game_names.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(load_string_array(&path, "game names").is_empty());
    }

    #[test]
    fn rule_book_first_exact_match_wins() {
        let book = RuleBook::new(vec![
            FullRecord {
                name: "뱅".into(),
                text: "first".into(),
            },
            FullRecord {
                name: "뱅".into(),
                text: "second".into(),
            },
        ]);
        assert_eq!(book.find("뱅").unwrap().text, "first");
        assert!(book.find("뱅!").is_none());
    }

    #[test]
    fn rule_book_tolerates_missing_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("game.json");
        std::fs::write(&path, r#"[{"game_name":"아줄"},{"text":"nameless"}]"#).unwrap();
        let book = RuleBook::load(&path);
        assert_eq!(book.find("아줄").unwrap().text, "");
        assert_eq!(book.names(), vec!["아줄".to_string()]);
    }

    #[tokio::test]
    async fn entity_store_requires_both_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = EntityStore::new(dir.path());
        FlatIndex::from_vectors(Metric::L2, &[vec![1.0]])
            .unwrap()
            .write(&dir.path().join("뱅.faiss"))
            .unwrap();
        assert!(matches!(store.open("뱅").await, Err(EntityLookup::Missing)));

        std::fs::write(dir.path().join("뱅.json"), r#"["보안관은 공개된다"]"#).unwrap();
        let corpus = store.open("뱅").await.unwrap();
        assert_eq!(corpus.chunks.len(), 1);
        assert_eq!(corpus.index.len(), 1);
    }

    #[tokio::test]
    async fn entity_store_rejects_path_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let store = EntityStore::new(dir.path().join("inner"));
        assert!(matches!(store.open("../secret").await, Err(EntityLookup::Missing)));
        assert!(matches!(store.open("a/b").await, Err(EntityLookup::Missing)));
        assert!(matches!(store.open("").await, Err(EntityLookup::Missing)));
    }

    #[tokio::test]
    async fn entity_store_reports_corrupt_chunks() {
        let dir = tempfile::tempdir().unwrap();
        let store = EntityStore::new(dir.path());
        FlatIndex::from_vectors(Metric::L2, &[vec![1.0]])
            .unwrap()
            .write(&dir.path().join("아줄.faiss"))
            .unwrap();
        std::fs::write(dir.path().join("아줄.json"), "oops").unwrap();
        assert!(matches!(
            store.open("아줄").await,
            Err(EntityLookup::Unreadable(_))
        ));
    }
}
