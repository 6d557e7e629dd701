// SPDX-FileCopyrightText: 2026 Plounix Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage traits for the collaborator stores the memory engine reads and writes.

use async_trait::async_trait;

use crate::error::PlounixError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{ChatMessage, Challenge, Goal, MemoryFact, Transaction, UserProfile};

/// Lifecycle of a persistence backend.
#[async_trait]
pub trait StorageAdapter: PluginAdapter {
    /// Initializes the storage backend (connection, migrations).
    async fn initialize(&self) -> Result<(), PlounixError>;

    /// Closes the storage backend, flushing pending writes.
    async fn close(&self) -> Result<(), PlounixError>;
}

/// Persistent table of memory facts, partitioned by user.
///
/// Implementations must enforce uniqueness of `(user_id, key)` at the
/// storage level; [`FactTable::upsert`] is a single atomic statement.
#[async_trait]
pub trait FactTable: Send + Sync {
    /// Finds the live fact for `(user_id, key)`.
    async fn find_by_key(
        &self,
        user_id: &str,
        key: &str,
    ) -> Result<Option<MemoryFact>, PlounixError>;

    /// Inserts a new row. Fails if `(user_id, key)` already exists.
    async fn insert(&self, fact: &MemoryFact) -> Result<(), PlounixError>;

    /// Replaces the mutable columns of the row with `fact.id`.
    async fn update_by_id(&self, fact: &MemoryFact) -> Result<(), PlounixError>;

    /// Inserts or updates by `(user_id, key)` and returns the stored row.
    ///
    /// On conflict: `value` is overwritten, `importance` becomes the max of old
    /// and new, `last_accessed_at`, `source_session_id` and `expires_at` are
    /// taken from `fact`.
    async fn upsert(&self, fact: &MemoryFact) -> Result<MemoryFact, PlounixError>;

    /// Lists non-expired facts ordered by importance desc, then
    /// last access desc, capped at `limit`.
    async fn list_for_user(
        &self,
        user_id: &str,
        limit: usize,
        now: &str,
    ) -> Result<Vec<MemoryFact>, PlounixError>;

    /// Sets `last_accessed_at = at` on the given facts of `user_id`.
    async fn touch(&self, user_id: &str, ids: &[String], at: &str) -> Result<(), PlounixError>;

    /// Deletes every fact of a user. Returns the number of rows removed.
    async fn delete_all_for_user(&self, user_id: &str) -> Result<u64, PlounixError>;

    /// Deletes facts whose `expires_at` is at or before `now`.
    async fn delete_expired(&self, now: &str) -> Result<u64, PlounixError>;
}

/// Append-only durable chat history.
#[async_trait]
pub trait ChatLog: Send + Sync {
    /// Appends one message.
    async fn append(&self, message: &ChatMessage) -> Result<(), PlounixError>;

    /// Returns the most recent `limit` messages of one user in a session,
    /// oldest first.
    async fn recent(
        &self,
        user_id: &str,
        session_id: &str,
        limit: usize,
    ) -> Result<Vec<ChatMessage>, PlounixError>;
}

/// Read-only access to the user's financial collaborator stores.
///
/// Absence is the common case: every method returns empty data, not an
/// error, when the user has no rows.
#[async_trait]
pub trait FinanceSource: Send + Sync {
    async fn profile(&self, user_id: &str) -> Result<Option<UserProfile>, PlounixError>;

    /// Most recent transactions first.
    async fn transactions(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<Transaction>, PlounixError>;

    async fn goals(&self, user_id: &str) -> Result<Vec<Goal>, PlounixError>;

    async fn challenges(&self, user_id: &str) -> Result<Vec<Challenge>, PlounixError>;
}
