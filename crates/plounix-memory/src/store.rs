// SPDX-FileCopyrightText: 2026 Plounix Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Memory store: validated, per-user writes to the fact table.
//!
//! Overwrite types go through the table's atomic upsert; accumulate types
//! are inserted under a freshly derived key so they never replace each other.

use std::sync::Arc;

use chrono::{Duration, Utc};
use plounix_config::MemoryConfig;
use plounix_core::types::{MemoryFact, WriteMode, format_timestamp, now_timestamp};
use plounix_core::{FactTable, PlounixError};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::types::{CandidateFact, truncate_chars};

/// Per-user memory fact store.
pub struct MemoryStore {
    table: Arc<dyn FactTable>,
    max_value_chars: usize,
}

impl MemoryStore {
    pub fn new(table: Arc<dyn FactTable>, config: &MemoryConfig) -> Self {
        Self {
            table,
            max_value_chars: config.max_value_chars,
        }
    }

    /// Validates and writes one candidate, returning the stored row.
    pub async fn save(
        &self,
        user_id: &str,
        session_id: Option<&str>,
        candidate: &CandidateFact,
    ) -> Result<MemoryFact, PlounixError> {
        candidate.validate()?;
        let now = now_timestamp();
        let mode = candidate.memory_type.write_mode();
        let key = match mode {
            WriteMode::Overwrite => candidate.key.trim().to_string(),
            WriteMode::Accumulate => accumulate_key(candidate.key.trim()),
        };

        let fact = MemoryFact {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            memory_type: candidate.memory_type,
            category: candidate.category.clone(),
            key,
            value: truncate_chars(candidate.value.trim(), self.max_value_chars).to_string(),
            context: candidate
                .context
                .as_deref()
                .map(|c| truncate_chars(c, self.max_value_chars).to_string()),
            source_session_id: session_id.map(str::to_string),
            importance: candidate.importance,
            created_at: now.clone(),
            last_accessed_at: now,
            expires_at: candidate.expires_at.clone(),
        };

        let stored = match mode {
            WriteMode::Overwrite => self.table.upsert(&fact).await?,
            WriteMode::Accumulate => {
                self.table.insert(&fact).await?;
                fact
            }
        };
        info!(
            user_id = %user_id,
            key = %stored.key,
            memory_type = %stored.memory_type,
            importance = stored.importance,
            "memory saved"
        );
        Ok(stored)
    }

    /// Writes every candidate, logging and skipping failures.
    ///
    /// Returns the number of facts written. Never fails: a dropped memory
    /// write must not abort the conversation turn.
    pub async fn save_all(
        &self,
        user_id: &str,
        session_id: Option<&str>,
        candidates: &[CandidateFact],
    ) -> usize {
        let mut saved = 0;
        for candidate in candidates {
            match self.save(user_id, session_id, candidate).await {
                Ok(_) => saved += 1,
                Err(e) => warn!(
                    user_id = %user_id,
                    key = %candidate.key,
                    error = %e,
                    "dropping memory write"
                ),
            }
        }
        debug!(user_id = %user_id, saved, total = candidates.len(), "memory batch written");
        saved
    }

    /// Deletes every fact of a user. Irreversible.
    pub async fn clear_all(&self, user_id: &str) -> Result<u64, PlounixError> {
        let removed = self.table.delete_all_for_user(user_id).await?;
        info!(user_id = %user_id, removed, "user memory cleared");
        Ok(removed)
    }

    /// Hard-deletes facts whose expiry has passed.
    pub async fn prune_expired(&self) -> Result<u64, PlounixError> {
        let removed = self.table.delete_expired(&now_timestamp()).await?;
        if removed > 0 {
            info!(removed, "expired memories pruned");
        }
        Ok(removed)
    }

    /// Gives an existing fact a time-to-live counted from now.
    pub async fn set_expiry(
        &self,
        user_id: &str,
        key: &str,
        ttl: Duration,
    ) -> Result<MemoryFact, PlounixError> {
        let mut fact = self
            .table
            .find_by_key(user_id, key)
            .await?
            .ok_or_else(|| PlounixError::NotFound {
                entity: "memory fact".to_string(),
                key: key.to_string(),
            })?;
        fact.expires_at = Some(format_timestamp(Utc::now() + ttl));
        self.table.update_by_id(&fact).await?;
        debug!(user_id = %user_id, key, expires_at = ?fact.expires_at, "expiry set");
        Ok(fact)
    }

    pub async fn get(&self, user_id: &str, key: &str) -> Result<Option<MemoryFact>, PlounixError> {
        self.table.find_by_key(user_id, key).await
    }

    /// Live facts of a user in ranking order, without touching access times.
    pub async fn list(&self, user_id: &str, limit: usize) -> Result<Vec<MemoryFact>, PlounixError> {
        self.table
            .list_for_user(user_id, limit, &now_timestamp())
            .await
    }
}

/// Unique stored key for an accumulating write: `<base>_<unix-millis>_<8 hex>`.
fn accumulate_key(base: &str) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{base}_{}_{}", Utc::now().timestamp_millis(), &suffix[..8])
}

#[cfg(test)]
mod tests {
    use super::*;
    use plounix_core::types::MemoryType;
    use plounix_storage::SqliteStorage;

    async fn store() -> (MemoryStore, Arc<SqliteStorage>) {
        let storage = Arc::new(SqliteStorage::in_memory().await.unwrap());
        let store = MemoryStore::new(storage.clone(), &MemoryConfig::default());
        (store, storage)
    }

    fn income(value: &str, importance: i64) -> CandidateFact {
        CandidateFact::new(MemoryType::Fact, "monthly_income", value, importance)
            .with_category("income")
    }

    #[tokio::test]
    async fn saving_same_key_twice_keeps_one_row() {
        let (store, _db) = store().await;
        store.save("u1", Some("s1"), &income("Monthly income: ₱18,000", 9)).await.unwrap();
        store.save("u1", Some("s1"), &income("Monthly income: ₱18,000", 9)).await.unwrap();

        let facts = store.list("u1", 20).await.unwrap();
        assert_eq!(facts.len(), 1);
    }

    #[tokio::test]
    async fn lower_importance_update_keeps_higher_importance() {
        let (store, _db) = store().await;
        store.save("u1", Some("s1"), &income("Monthly income: ₱18,000", 9)).await.unwrap();
        let updated = store
            .save("u1", Some("s2"), &income("Monthly income: ₱22,000", 6))
            .await
            .unwrap();
        assert_eq!(updated.importance, 9);
        assert_eq!(updated.value, "Monthly income: ₱22,000");
        assert_eq!(updated.source_session_id.as_deref(), Some("s2"));
    }

    #[tokio::test]
    async fn concerns_accumulate() {
        let (store, _db) = store().await;
        let concern = CandidateFact::new(MemoryType::Concern, "concern", "worried about rent", 7);
        let a = store.save("u1", None, &concern).await.unwrap();
        let b = store.save("u1", None, &concern).await.unwrap();
        assert_ne!(a.key, b.key);
        assert!(a.key.starts_with("concern_"));
        assert_eq!(store.list("u1", 20).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn invalid_candidate_never_reaches_table() {
        let (store, _db) = store().await;
        let bad = CandidateFact::new(MemoryType::Fact, "", "value", 5);
        assert!(matches!(
            store.save("u1", None, &bad).await,
            Err(PlounixError::InvalidCandidate(_))
        ));
        assert!(store.list("u1", 20).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn long_values_are_truncated() {
        let (store, _db) = store().await;
        let long = CandidateFact::new(MemoryType::Fact, "note", "₱".repeat(500), 6);
        let saved = store.save("u1", None, &long).await.unwrap();
        assert_eq!(saved.value.chars().count(), 200);
    }

    #[tokio::test]
    async fn save_all_counts_and_skips_failures() {
        let (store, _db) = store().await;
        let batch = vec![
            income("Monthly income: ₱18,000", 9),
            CandidateFact::new(MemoryType::Goal, "savings_goal", "Savings goal: ₱5,000", 99),
            CandidateFact::new(MemoryType::Preference, "preference", "prefers GCash", 6),
        ];
        assert_eq!(store.save_all("u1", Some("s1"), &batch).await, 2);
    }

    #[tokio::test]
    async fn clear_all_is_scoped_to_user() {
        let (store, _db) = store().await;
        store.save("u1", None, &income("Monthly income: ₱18,000", 9)).await.unwrap();
        store.save("u2", None, &income("Monthly income: ₱40,000", 9)).await.unwrap();

        assert_eq!(store.clear_all("u1").await.unwrap(), 1);
        assert!(store.list("u1", 20).await.unwrap().is_empty());
        assert_eq!(store.list("u2", 20).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn expired_facts_are_hidden_then_pruned() {
        let (store, _db) = store().await;
        store.save("u1", None, &income("Monthly income: ₱18,000", 9)).await.unwrap();

        let fact = store
            .set_expiry("u1", "monthly_income", Duration::milliseconds(-1))
            .await
            .unwrap();
        assert!(fact.expires_at.is_some());
        assert!(store.list("u1", 20).await.unwrap().is_empty());
        assert!(store.get("u1", "monthly_income").await.unwrap().is_some());

        assert_eq!(store.prune_expired().await.unwrap(), 1);
        assert!(store.get("u1", "monthly_income").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn redisclosed_fact_clears_lapsed_expiry() {
        let (store, _db) = store().await;
        store.save("u1", Some("s1"), &income("Monthly income: ₱18,000", 9)).await.unwrap();
        store
            .set_expiry("u1", "monthly_income", Duration::milliseconds(-1))
            .await
            .unwrap();
        assert!(store.list("u1", 20).await.unwrap().is_empty());

        let saved = store
            .save("u1", Some("s2"), &income("Monthly income: ₱25,000", 9))
            .await
            .unwrap();
        assert_eq!(saved.expires_at, None);

        let live = store.list("u1", 20).await.unwrap();
        assert_eq!(live.len(), 1);
        assert_eq!(live[0].value, "Monthly income: ₱25,000");
    }

    #[tokio::test]
    async fn set_expiry_on_missing_key_is_not_found() {
        let (store, _db) = store().await;
        let err = store
            .set_expiry("u1", "nothing", Duration::days(1))
            .await
            .unwrap_err();
        assert!(matches!(err, PlounixError::NotFound { .. }));
    }
}
