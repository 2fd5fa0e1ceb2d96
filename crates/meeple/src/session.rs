//! Per-session conversation history.
//!
//! A [`SessionStore`] maps session ids to handles. Each handle is an async
//! mutex so one interaction can hold it across the generation call and
//! append its turn pair without another request interleaving.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who produced a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Human,
    Assistant,
}

/// One message in a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
    pub at: DateTime<Utc>,
}

/// Ordered turns of one conversation, oldest first.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Session {
    id: String,
    turns: Vec<Turn>,
}

impl Session {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            turns: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn push(&mut self, role: Role, content: impl Into<String>) {
        self.turns.push(Turn {
            role,
            content: content.into(),
            at: Utc::now(),
        });
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }
}

/// Shared, lockable session.
pub type SessionHandle = Arc<tokio::sync::Mutex<Session>>;

/// Process-wide session map. Sessions are never evicted.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: Mutex<HashMap<String, SessionHandle>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the session for `id`, creating an empty one on first use.
    pub fn get_or_create(&self, id: &str) -> SessionHandle {
        let mut map = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        map.entry(id.to_string())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(Session::new(id))))
            .clone()
    }

    /// Append a turn to a session the caller already holds locked.
    pub fn append(session: &mut Session, role: Role, content: impl Into<String>) {
        session.push(role, content);
    }

    /// Number of sessions created so far.
    pub fn len(&self) -> usize {
        self.sessions.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of a session's turns. Unknown ids yield an empty history
    /// without creating a session.
    pub async fn history(&self, id: &str) -> Vec<Turn> {
        let handle = {
            let map = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
            map.get(id).cloned()
        };
        match handle {
            Some(h) => h.lock().await.turns().to_vec(),
            None => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn same_id_returns_same_session() {
        let store = SessionStore::new();
        let a = store.get_or_create("s1");
        let b = store.get_or_create("s1");
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(store.len(), 1);

        SessionStore::append(&mut *a.lock().await, Role::Human, "안녕");
        assert_eq!(b.lock().await.turns().len(), 1);
    }

    #[tokio::test]
    async fn ids_are_compared_exactly() {
        let store = SessionStore::new();
        store.get_or_create("abc");
        store.get_or_create("ABC");
        store.get_or_create("abc ");
        assert_eq!(store.len(), 3);
    }

    #[tokio::test]
    async fn history_of_unknown_session_is_empty_and_not_created() {
        let store = SessionStore::new();
        assert!(store.history("missing").await.is_empty());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn turns_keep_insertion_order() {
        let store = SessionStore::new();
        let h = store.get_or_create("s");
        {
            let mut s = h.lock().await;
            SessionStore::append(&mut s, Role::Human, "q1");
            SessionStore::append(&mut s, Role::Assistant, "a1");
        }
        let turns = store.history("s").await;
        let contents: Vec<_> = turns.iter().map(|t| t.content.as_str()).collect();
        assert_eq!(contents, ["q1", "a1"]);
        assert_eq!(turns[0].role, Role::Human);
        assert!(turns[0].at <= turns[1].at);
    }

    #[test]
    fn clear_empties_session() {
        let mut s = Session::new("x");
        s.push(Role::Human, "hi");
        s.clear();
        assert!(s.turns().is_empty());
        assert_eq!(s.id(), "x");
    }
}
