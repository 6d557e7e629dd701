// SPDX-FileCopyrightText: 2026 Plounix Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end integration testing.
//!
//! `TestHarness` assembles the full chat pipeline over a temp SQLite
//! database and a [`MockOracle`]. `send()` drives one turn and waits for any
//! background extraction to finish, so assertions see its writes.

use std::path::PathBuf;
use std::sync::Arc;

use plounix_agent::{ChatPipeline, TurnOutcome};
use plounix_config::{PlounixConfig, StorageConfig};
use plounix_core::types::{Goal, Transaction, UserProfile};
use plounix_core::{PlounixError, StorageAdapter};
use plounix_storage::SqliteStorage;
use plounix_storage::queries::finance;

use crate::mock_oracle::MockOracle;

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    replies: Vec<String>,
    config: PlounixConfig,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            replies: Vec::new(),
            config: PlounixConfig::default(),
        }
    }

    /// Set mock oracle replies.
    pub fn with_replies<I, S>(mut self, replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.replies = replies.into_iter().map(Into::into).collect();
        self
    }

    /// Adjust the configuration before the stack is built.
    pub fn configure(mut self, f: impl FnOnce(&mut PlounixConfig)) -> Self {
        f(&mut self.config);
        self
    }

    /// Build the test harness, creating all required subsystems.
    pub async fn build(mut self) -> Result<TestHarness, PlounixError> {
        let temp_dir = tempfile::TempDir::new().map_err(PlounixError::storage)?;
        let db_path = temp_dir.path().join("plounix-test.db");

        self.config.storage = StorageConfig {
            database_path: db_path.to_string_lossy().to_string(),
            wal_mode: true,
        };
        let storage = Arc::new(SqliteStorage::new(self.config.storage.clone()));
        storage.initialize().await?;

        let oracle = Arc::new(MockOracle::with_replies(self.replies));
        let pipeline = ChatPipeline::new(&self.config, storage.clone(), oracle.clone());

        Ok(TestHarness {
            oracle,
            storage,
            pipeline,
            config: self.config,
            db_path,
            _temp_dir: temp_dir,
        })
    }
}

/// A complete test environment with a mock oracle and temp storage.
pub struct TestHarness {
    /// The mock oracle.
    pub oracle: Arc<MockOracle>,
    /// SQLite storage (temp DB, cleaned up on drop).
    pub storage: Arc<SqliteStorage>,
    pub pipeline: ChatPipeline,
    pub config: PlounixConfig,
    db_path: PathBuf,
    /// Temp directory kept alive for cleanup on drop.
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    /// Create a new builder for configuring the test harness.
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Default harness with the given oracle replies.
    pub async fn with_replies<I, S>(replies: I) -> Result<Self, PlounixError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::builder().with_replies(replies).build().await
    }

    /// Sends one message and waits for background extraction.
    pub async fn send(
        &self,
        user_id: &str,
        session_id: &str,
        text: &str,
    ) -> Result<TurnOutcome, PlounixError> {
        let outcome = self.pipeline.handle_message(user_id, session_id, text).await?;
        self.pipeline.flush().await;
        Ok(outcome)
    }

    pub fn db_path(&self) -> &std::path::Path {
        &self.db_path
    }

    pub async fn seed_profile(&self, profile: &UserProfile) -> Result<(), PlounixError> {
        finance::upsert_profile(self.storage.database()?, profile).await
    }

    pub async fn seed_transaction(&self, tx: &Transaction) -> Result<(), PlounixError> {
        finance::insert_transaction(self.storage.database()?, tx).await
    }

    pub async fn seed_goal(&self, goal: &Goal) -> Result<(), PlounixError> {
        finance::insert_goal(self.storage.database()?, goal).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn harness_round_trips_one_turn() {
        let harness = TestHarness::with_replies(["hello there"]).await.unwrap();
        let outcome = harness.send("u1", "s1", "hi").await.unwrap();
        assert_eq!(outcome.reply, "hello there");
        assert!(harness.db_path().exists());
        assert_eq!(harness.oracle.prompts().await.len(), 1);
    }

    #[tokio::test]
    async fn configure_applies_before_build() {
        let harness = TestHarness::builder()
            .configure(|c| c.memory.enabled = false)
            .build()
            .await
            .unwrap();
        assert!(!harness.config.memory.enabled);
    }
}
