// SPDX-FileCopyrightText: 2026 Plounix Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Durable chat history writes.

use std::sync::Arc;

use plounix_core::types::{ChatMessage, ChatRole, now_timestamp};
use plounix_core::{ChatLog, PlounixError};
use tracing::debug;

/// Writes every conversation turn to the durable chat log.
pub struct ConversationPersister {
    log: Arc<dyn ChatLog>,
}

impl ConversationPersister {
    pub fn new(log: Arc<dyn ChatLog>) -> Self {
        Self { log }
    }

    /// Appends one turn and returns the stored message.
    pub async fn persist(
        &self,
        user_id: &str,
        session_id: &str,
        role: ChatRole,
        content: &str,
    ) -> Result<ChatMessage, PlounixError> {
        let message = ChatMessage {
            id: uuid::Uuid::new_v4().to_string(),
            session_id: session_id.to_string(),
            user_id: user_id.to_string(),
            role,
            content: content.to_string(),
            created_at: now_timestamp(),
        };
        self.log.append(&message).await?;
        debug!(session_id = %session_id, role = %role, "persisted chat turn");
        Ok(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plounix_storage::SqliteStorage;
    use plounix_test_utils::FailingStorage;

    #[tokio::test]
    async fn turns_are_appended_in_order() {
        let storage = Arc::new(SqliteStorage::in_memory().await.unwrap());
        let persister = ConversationPersister::new(storage.clone());
        persister.persist("u1", "s1", ChatRole::User, "hi").await.unwrap();
        persister
            .persist("u1", "s1", ChatRole::Assistant, "hello!")
            .await
            .unwrap();

        let recent = storage.recent("u1", "s1", 10).await.unwrap();
        let roles: Vec<ChatRole> = recent.iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![ChatRole::User, ChatRole::Assistant]);
        assert_eq!(recent[1].content, "hello!");
    }

    #[tokio::test]
    async fn log_failure_is_returned() {
        let persister = ConversationPersister::new(Arc::new(FailingStorage));
        let err = persister
            .persist("u1", "s1", ChatRole::User, "hi")
            .await
            .unwrap_err();
        assert!(matches!(err, PlounixError::Storage { .. }));
    }
}
