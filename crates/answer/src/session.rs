//! Per-session question log
//!
//! Bounded in-memory history keyed by a caller-supplied session id. Only
//! used for the "what did I previously ask" recall reply; reset on restart.

use std::collections::{HashMap, VecDeque};
use tokio::sync::RwLock;

/// Bounded per-session question store.
pub struct SessionStore {
    max_questions: usize,
    sessions: RwLock<HashMap<String, VecDeque<String>>>,
}

impl SessionStore {
    pub fn new(max_questions: usize) -> Self {
        Self {
            max_questions,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Append a question to the session's history.
    ///
    /// When the history exceeds the cap the oldest entries are dropped
    /// first, so the store always holds the last N questions.
    pub async fn log(&self, session_id: &str, question: &str) {
        let mut sessions = self.sessions.write().await;
        let history = sessions.entry(session_id.to_string()).or_default();
        history.push_back(question.to_string());
        while history.len() > self.max_questions {
            history.pop_front();
        }
    }

    /// Logged questions for a session, oldest first.
    pub async fn recent(&self, session_id: &str) -> Vec<String> {
        let sessions = self.sessions.read().await;
        sessions
            .get(session_id)
            .map(|history| history.iter().cloned().collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_recent_preserves_insertion_order() {
        let store = SessionStore::new(10);
        store.log("s1", "first question").await;
        store.log("s1", "second question").await;

        let history = store.recent("s1").await;
        assert_eq!(history, vec!["first question", "second question"]);
    }

    #[tokio::test]
    async fn test_eviction_drops_oldest_first() {
        let store = SessionStore::new(3);
        for i in 1..=5 {
            store.log("s1", &format!("question {}", i)).await;
        }

        let history = store.recent("s1").await;
        assert_eq!(history, vec!["question 3", "question 4", "question 5"]);
    }

    #[tokio::test]
    async fn test_sessions_are_independent() {
        let store = SessionStore::new(10);
        store.log("alice", "about refunds").await;
        store.log("bob", "about shipping").await;

        assert_eq!(store.recent("alice").await, vec!["about refunds"]);
        assert_eq!(store.recent("bob").await, vec!["about shipping"]);
    }

    #[tokio::test]
    async fn test_unknown_session_is_empty() {
        let store = SessionStore::new(10);
        assert!(store.recent("nobody").await.is_empty());
    }

    #[tokio::test]
    async fn test_zero_cap_keeps_nothing() {
        let store = SessionStore::new(0);
        store.log("s1", "question").await;
        assert!(store.recent("s1").await.is_empty());
    }
}
