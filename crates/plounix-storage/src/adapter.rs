// SPDX-FileCopyrightText: 2026 Plounix Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the storage collaborator traits.

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::debug;

use plounix_config::model::StorageConfig;
use plounix_core::types::{ChatMessage, Challenge, Goal, MemoryFact, Transaction, UserProfile};
use plounix_core::{
    AdapterType, ChatLog, FactTable, FinanceSource, HealthStatus, PluginAdapter, PlounixError,
    StorageAdapter,
};

use crate::database::{Database, map_tr_err};
use crate::queries;

/// SQLite-backed storage adapter.
///
/// Wraps a [`Database`] handle and delegates all query operations to the
/// typed query modules. The database is lazily initialized on the first
/// call to [`StorageAdapter::initialize`].
pub struct SqliteStorage {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStorage {
    /// Create a new SqliteStorage with the given configuration.
    ///
    /// The database connection is not opened until [`StorageAdapter::initialize`] is called.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    /// An initialized storage over a private in-memory database.
    pub async fn in_memory() -> Result<Self, PlounixError> {
        let storage = Self::new(StorageConfig {
            database_path: ":memory:".to_string(),
            wal_mode: false,
        });
        let db = Database::open_in_memory().await?;
        storage
            .db
            .set(db)
            .map_err(|_| PlounixError::Internal("fresh storage already initialized".into()))?;
        Ok(storage)
    }

    /// Returns the underlying Database, or an error if not initialized.
    pub fn database(&self) -> Result<&Database, PlounixError> {
        self.db.get().ok_or_else(|| PlounixError::Storage {
            source: "storage not initialized -- call initialize() first".into(),
        })
    }

    fn db(&self) -> Result<&Database, PlounixError> {
        self.database()
    }
}

#[async_trait]
impl PluginAdapter for SqliteStorage {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, PlounixError> {
        let db = self.db()?;
        db.connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), PlounixError> {
        if let Some(db) = self.db.get() {
            db.checkpoint().await?;
            debug!("shutdown: WAL checkpoint complete");
        }
        Ok(())
    }
}

#[async_trait]
impl StorageAdapter for SqliteStorage {
    async fn initialize(&self) -> Result<(), PlounixError> {
        let db = Database::open_with(&self.config.database_path, self.config.wal_mode).await?;
        self.db.set(db).map_err(|_| PlounixError::Storage {
            source: "storage already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite storage initialized");
        Ok(())
    }

    async fn close(&self) -> Result<(), PlounixError> {
        self.db()?.checkpoint().await?;
        debug!("WAL checkpoint complete");
        Ok(())
    }
}

#[async_trait]
impl FactTable for SqliteStorage {
    async fn find_by_key(
        &self,
        user_id: &str,
        key: &str,
    ) -> Result<Option<MemoryFact>, PlounixError> {
        queries::facts::find_by_key(self.db()?, user_id, key).await
    }

    async fn insert(&self, fact: &MemoryFact) -> Result<(), PlounixError> {
        queries::facts::insert_fact(self.db()?, fact).await
    }

    async fn update_by_id(&self, fact: &MemoryFact) -> Result<(), PlounixError> {
        queries::facts::update_fact(self.db()?, fact).await
    }

    async fn upsert(&self, fact: &MemoryFact) -> Result<MemoryFact, PlounixError> {
        queries::facts::upsert_fact(self.db()?, fact).await
    }

    async fn list_for_user(
        &self,
        user_id: &str,
        limit: usize,
        now: &str,
    ) -> Result<Vec<MemoryFact>, PlounixError> {
        queries::facts::list_for_user(self.db()?, user_id, limit, now).await
    }

    async fn touch(&self, user_id: &str, ids: &[String], at: &str) -> Result<(), PlounixError> {
        queries::facts::touch_facts(self.db()?, user_id, ids, at).await
    }

    async fn delete_all_for_user(&self, user_id: &str) -> Result<u64, PlounixError> {
        queries::facts::delete_all_for_user(self.db()?, user_id).await
    }

    async fn delete_expired(&self, now: &str) -> Result<u64, PlounixError> {
        queries::facts::delete_expired(self.db()?, now).await
    }
}

#[async_trait]
impl ChatLog for SqliteStorage {
    async fn append(&self, message: &ChatMessage) -> Result<(), PlounixError> {
        queries::messages::insert_message(self.db()?, message).await
    }

    async fn recent(
        &self,
        user_id: &str,
        session_id: &str,
        limit: usize,
    ) -> Result<Vec<ChatMessage>, PlounixError> {
        queries::messages::recent_messages(self.db()?, user_id, session_id, limit).await
    }
}

#[async_trait]
impl FinanceSource for SqliteStorage {
    async fn profile(&self, user_id: &str) -> Result<Option<UserProfile>, PlounixError> {
        queries::finance::get_profile(self.db()?, user_id).await
    }

    async fn transactions(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<Transaction>, PlounixError> {
        queries::finance::recent_transactions(self.db()?, user_id, limit).await
    }

    async fn goals(&self, user_id: &str) -> Result<Vec<Goal>, PlounixError> {
        queries::finance::list_goals(self.db()?, user_id).await
    }

    async fn challenges(&self, user_id: &str) -> Result<Vec<Challenge>, PlounixError> {
        queries::finance::list_challenges(self.db()?, user_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plounix_core::types::{ChatRole, MemoryType};
    use tempfile::tempdir;

    fn make_config(path: &str) -> StorageConfig {
        StorageConfig {
            database_path: path.to_string(),
            wal_mode: true,
        }
    }

    #[tokio::test]
    async fn sqlite_storage_implements_plugin_adapter() {
        let storage = SqliteStorage::new(make_config("unused.db"));
        assert_eq!(storage.name(), "sqlite");
        assert_eq!(storage.version(), semver::Version::new(0, 1, 0));
        assert_eq!(storage.adapter_type(), AdapterType::Storage);
    }

    #[tokio::test]
    async fn initialize_opens_database_at_configured_path() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("init_test.db");
        let storage = SqliteStorage::new(make_config(db_path.to_str().unwrap()));

        storage.initialize().await.unwrap();
        assert!(db_path.exists(), "database file should be created");
    }

    #[tokio::test]
    async fn initialize_twice_returns_error() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("double_init.db");
        let storage = SqliteStorage::new(make_config(db_path.to_str().unwrap()));

        storage.initialize().await.unwrap();
        assert!(storage.initialize().await.is_err());
    }

    #[tokio::test]
    async fn health_check_tracks_initialization() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("health.db");
        let storage = SqliteStorage::new(make_config(db_path.to_str().unwrap()));

        assert!(storage.health_check().await.is_err());
        storage.initialize().await.unwrap();
        assert_eq!(storage.health_check().await.unwrap(), HealthStatus::Healthy);
    }

    #[tokio::test]
    async fn facts_survive_reopen() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("durable.db");
        let path = db_path.to_str().unwrap();

        let first = SqliteStorage::new(make_config(path));
        first.initialize().await.unwrap();
        let fact = MemoryFact {
            id: "f1".to_string(),
            user_id: "u1".to_string(),
            memory_type: MemoryType::Fact,
            category: Some("income".to_string()),
            key: "monthly_income".to_string(),
            value: "₱30,000".to_string(),
            context: None,
            source_session_id: Some("s1".to_string()),
            importance: 8,
            created_at: "2026-01-01T00:00:00.000Z".to_string(),
            last_accessed_at: "2026-01-01T00:00:00.000Z".to_string(),
            expires_at: None,
        };
        first.upsert(&fact).await.unwrap();
        first.shutdown().await.unwrap();
        drop(first);

        let second = SqliteStorage::new(make_config(path));
        second.initialize().await.unwrap();
        let found = second.find_by_key("u1", "monthly_income").await.unwrap();
        assert_eq!(found, Some(fact));
    }

    #[tokio::test]
    async fn chat_log_through_adapter() {
        let storage = SqliteStorage::in_memory().await.unwrap();
        let msg = ChatMessage {
            id: "m1".to_string(),
            session_id: "s1".to_string(),
            user_id: "u1".to_string(),
            role: ChatRole::User,
            content: "hello".to_string(),
            created_at: "2026-01-01T00:00:00.000Z".to_string(),
        };
        storage.append(&msg).await.unwrap();
        assert_eq!(storage.recent("u1", "s1", 10).await.unwrap(), vec![msg]);
        storage.close().await.unwrap();
    }

    #[tokio::test]
    async fn finance_source_is_empty_for_new_user() {
        let storage = SqliteStorage::in_memory().await.unwrap();
        assert!(storage.profile("new").await.unwrap().is_none());
        assert!(storage.transactions("new", 50).await.unwrap().is_empty());
        assert!(storage.goals("new").await.unwrap().is_empty());
        assert!(storage.challenges("new").await.unwrap().is_empty());
    }
}
