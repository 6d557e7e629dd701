// SPDX-FileCopyrightText: 2026 Plounix Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-process session history.
//!
//! Each live session owns a bounded turn buffer. Buffers live in a
//! [`SessionRegistry`], an LRU keyed by `(user_id, session_id)`, so the
//! number of sessions held in memory is capped and lifetimes are explicit.

use std::collections::VecDeque;
use std::num::NonZeroUsize;

use lru::LruCache;
use plounix_config::SessionConfig;
use plounix_core::types::ChatRole;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::debug;

/// One turn of the current conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionTurn {
    pub role: ChatRole,
    pub content: String,
}

impl SessionTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// Ordered, append-only turn buffer that keeps the last `max_turns` turns.
#[derive(Debug, Clone)]
pub struct SessionHistory {
    turns: VecDeque<SessionTurn>,
    max_turns: usize,
}

impl SessionHistory {
    pub fn new(max_turns: usize) -> Self {
        let max_turns = max_turns.max(1);
        Self {
            turns: VecDeque::with_capacity(max_turns),
            max_turns,
        }
    }

    pub fn append(&mut self, turn: SessionTurn) {
        if self.turns.len() == self.max_turns {
            self.turns.pop_front();
        }
        self.turns.push_back(turn);
    }

    /// The most recent `n` turns, oldest first.
    pub fn window(&self, n: usize) -> Vec<SessionTurn> {
        let skip = self.turns.len().saturating_sub(n);
        self.turns.iter().skip(skip).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

type SessionKey = (String, String);

fn session_key(user_id: &str, session_id: &str) -> SessionKey {
    (user_id.to_string(), session_id.to_string())
}

/// Bounded registry of live session buffers.
pub struct SessionRegistry {
    sessions: Mutex<LruCache<SessionKey, SessionHistory>>,
    max_turns: usize,
}

impl SessionRegistry {
    pub fn new(config: &SessionConfig) -> Self {
        let capacity = NonZeroUsize::new(config.max_sessions).unwrap_or(NonZeroUsize::MIN);
        Self {
            sessions: Mutex::new(LruCache::new(capacity)),
            max_turns: config.max_turns,
        }
    }

    /// Appends a turn, creating the session buffer on first use.
    pub async fn append(&self, user_id: &str, session_id: &str, turn: SessionTurn) {
        let key = session_key(user_id, session_id);
        let mut sessions = self.sessions.lock().await;
        if !sessions.contains(&key)
            && let Some(((user, session), _)) =
                sessions.push(key.clone(), SessionHistory::new(self.max_turns))
        {
            debug!(user_id = %user, session_id = %session, "session evicted from registry");
        }
        if let Some(history) = sessions.get_mut(&key) {
            history.append(turn);
        }
    }

    /// The last `n` turns of a session, oldest first. Unknown sessions are empty.
    pub async fn window(&self, user_id: &str, session_id: &str, n: usize) -> Vec<SessionTurn> {
        let key = session_key(user_id, session_id);
        let mut sessions = self.sessions.lock().await;
        sessions
            .get(&key)
            .map(|history| history.window(n))
            .unwrap_or_default()
    }

    /// Drops a session buffer. Returns whether it existed.
    pub async fn end_session(&self, user_id: &str, session_id: &str) -> bool {
        let removed = self
            .sessions
            .lock()
            .await
            .pop(&session_key(user_id, session_id))
            .is_some();
        if removed {
            debug!(user_id = %user_id, session_id = %session_id, "session ended");
        }
        removed
    }

    /// Number of live session buffers.
    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.lock().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(max_sessions: usize, max_turns: usize) -> SessionConfig {
        SessionConfig {
            max_sessions,
            max_turns,
        }
    }

    #[test]
    fn window_is_chronological_tail() {
        let mut history = SessionHistory::new(10);
        for i in 0..4 {
            history.append(SessionTurn::user(format!("turn {i}")));
        }
        let window = history.window(2);
        assert_eq!(window, vec![SessionTurn::user("turn 2"), SessionTurn::user("turn 3")]);
        assert_eq!(history.window(100).len(), 4);
        assert!(history.window(0).is_empty());
    }

    #[test]
    fn buffer_drops_oldest_turns() {
        let mut history = SessionHistory::new(3);
        for i in 0..5 {
            history.append(SessionTurn::assistant(format!("{i}")));
        }
        assert_eq!(history.len(), 3);
        assert_eq!(history.window(3)[0].content, "2");
    }

    #[tokio::test]
    async fn sessions_are_isolated_by_user_and_session() {
        let registry = SessionRegistry::new(&config(8, 10));
        registry.append("alice", "s1", SessionTurn::user("hi from alice")).await;
        registry.append("bob", "s1", SessionTurn::user("hi from bob")).await;

        let alice = registry.window("alice", "s1", 10).await;
        assert_eq!(alice, vec![SessionTurn::user("hi from alice")]);
        assert!(registry.window("alice", "s2", 10).await.is_empty());
        assert_eq!(registry.len().await, 2);
    }

    #[tokio::test]
    async fn least_recently_used_session_is_evicted() {
        let registry = SessionRegistry::new(&config(2, 10));
        registry.append("u", "a", SessionTurn::user("a")).await;
        registry.append("u", "b", SessionTurn::user("b")).await;
        // Reading "a" makes "b" the least recently used.
        assert_eq!(registry.window("u", "a", 1).await.len(), 1);
        registry.append("u", "c", SessionTurn::user("c")).await;

        assert_eq!(registry.len().await, 2);
        assert!(registry.window("u", "b", 10).await.is_empty());
        assert_eq!(registry.window("u", "a", 10).await.len(), 1);
    }

    #[tokio::test]
    async fn end_session_discards_buffer() {
        let registry = SessionRegistry::new(&config(4, 10));
        registry.append("u", "s", SessionTurn::user("x")).await;
        assert!(registry.end_session("u", "s").await);
        assert!(!registry.end_session("u", "s").await);
        assert!(registry.is_empty().await);
    }
}
