// SPDX-FileCopyrightText: 2026 Plounix Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Memory inspection and maintenance commands.

use std::sync::Arc;

use plounix_config::PlounixConfig;
use plounix_context::{ContextEngine, SessionRegistry};
use plounix_core::{PlounixError, StorageAdapter};
use plounix_memory::{MemoryRetriever, MemoryStore, RetrievalWeights, RuleBasedExtractor};
use plounix_storage::SqliteStorage;
use serde::Serialize;
use tracing::info;

/// Open and migrate the configured database.
pub async fn open_storage(config: &PlounixConfig) -> Result<Arc<SqliteStorage>, PlounixError> {
    let storage = SqliteStorage::new(config.storage.clone());
    storage.initialize().await?;
    Ok(Arc::new(storage))
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), PlounixError> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| PlounixError::Internal(format!("failed to encode output: {e}")))?;
    println!("{text}");
    Ok(())
}

pub fn extract(user_message: &str, assistant_reply: &str) -> Result<(), PlounixError> {
    let candidates = RuleBasedExtractor::default().extract_turn(user_message, assistant_reply);
    print_json(&candidates)
}

pub async fn remember(
    config: &PlounixConfig,
    user_id: &str,
    session_id: &str,
    user_message: &str,
    assistant_reply: &str,
) -> Result<(), PlounixError> {
    let storage = open_storage(config).await?;
    let store = MemoryStore::new(storage.clone(), &config.memory);
    let candidates = RuleBasedExtractor::default().extract_turn(user_message, assistant_reply);

    let mut saved = Vec::with_capacity(candidates.len());
    for candidate in &candidates {
        saved.push(store.save(user_id, Some(session_id), candidate).await?);
    }
    print_json(&saved)?;
    storage.close().await
}

pub async fn context(
    config: &PlounixConfig,
    user_id: &str,
    session_id: &str,
    message: &str,
) -> Result<(), PlounixError> {
    let storage = open_storage(config).await?;
    let retriever = Arc::new(MemoryRetriever::new(
        storage.clone(),
        RetrievalWeights::from(&config.memory),
    ));
    let engine = ContextEngine::new(
        config,
        retriever,
        Arc::new(SessionRegistry::new(&config.session)),
        storage.clone(),
        storage.clone(),
    );
    let assembled = engine.assemble(user_id, session_id, message).await;
    print!("{}", assembled.prompt);
    storage.close().await
}

pub async fn list(config: &PlounixConfig, user_id: &str, limit: usize) -> Result<(), PlounixError> {
    let storage = open_storage(config).await?;
    let facts = MemoryStore::new(storage.clone(), &config.memory)
        .list(user_id, limit)
        .await?;
    print_json(&facts)?;
    storage.close().await
}

pub async fn get(config: &PlounixConfig, user_id: &str, key: &str) -> Result<(), PlounixError> {
    let storage = open_storage(config).await?;
    let found = MemoryStore::new(storage.clone(), &config.memory)
        .get(user_id, key)
        .await;
    storage.close().await?;
    let fact = found?.ok_or_else(|| PlounixError::NotFound {
        entity: "memory fact".to_string(),
        key: key.to_string(),
    })?;
    print_json(&fact)
}

pub async fn expire(
    config: &PlounixConfig,
    user_id: &str,
    key: &str,
    days: i64,
) -> Result<(), PlounixError> {
    let storage = open_storage(config).await?;
    let fact = MemoryStore::new(storage.clone(), &config.memory)
        .set_expiry(user_id, key, chrono::Duration::days(days))
        .await?;
    print_json(&fact)?;
    storage.close().await
}

pub async fn clear(config: &PlounixConfig, user_id: &str, confirmed: bool) -> Result<(), PlounixError> {
    if !confirmed {
        return Err(PlounixError::Internal(format!(
            "refusing to delete memory of `{user_id}` without --yes"
        )));
    }
    let storage = open_storage(config).await?;
    let removed = MemoryStore::new(storage.clone(), &config.memory)
        .clear_all(user_id)
        .await?;
    println!("removed {removed} fact(s) for {user_id}");
    storage.close().await
}

pub async fn prune(config: &PlounixConfig) -> Result<(), PlounixError> {
    let storage = open_storage(config).await?;
    let removed = MemoryStore::new(storage.clone(), &config.memory)
        .prune_expired()
        .await?;
    info!(removed, "prune finished");
    println!("pruned {removed} expired fact(s)");
    storage.close().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use plounix_config::StorageConfig;

    fn temp_config(dir: &tempfile::TempDir) -> PlounixConfig {
        PlounixConfig {
            storage: StorageConfig {
                database_path: dir.path().join("cli.db").display().to_string(),
                wal_mode: true,
            },
            ..PlounixConfig::default()
        }
    }

    #[tokio::test]
    async fn remember_then_list_reads_same_database() {
        let dir = tempfile::tempdir().unwrap();
        let config = temp_config(&dir);
        remember(&config, "u1", "s1", "My monthly income is ₱18,000", "Noted!")
            .await
            .unwrap();

        let storage = open_storage(&config).await.unwrap();
        let store = MemoryStore::new(storage, &config.memory);
        let fact = store.get("u1", "monthly_income").await.unwrap().unwrap();
        assert_eq!(fact.value, "Monthly income: ₱18,000");
    }

    #[tokio::test]
    async fn clear_requires_confirmation() {
        let dir = tempfile::tempdir().unwrap();
        let config = temp_config(&dir);
        assert!(clear(&config, "u1", false).await.is_err());
        clear(&config, "u1", true).await.unwrap();
    }

    #[tokio::test]
    async fn read_commands_leave_database_reusable() {
        let dir = tempfile::tempdir().unwrap();
        let config = temp_config(&dir);
        remember(&config, "u1", "s1", "My monthly income is ₱18,000", "Noted!")
            .await
            .unwrap();

        list(&config, "u1", 10).await.unwrap();
        get(&config, "u1", "monthly_income").await.unwrap();
        remember(&config, "u1", "s2", "I'm worried about rent", "Let's plan.")
            .await
            .unwrap();

        let storage = open_storage(&config).await.unwrap();
        let facts = MemoryStore::new(storage, &config.memory).list("u1", 10).await.unwrap();
        assert_eq!(facts.len(), 2);
    }

    #[tokio::test]
    async fn get_missing_fact_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let config = temp_config(&dir);
        let err = get(&config, "u1", "nothing").await.unwrap_err();
        assert!(matches!(err, PlounixError::NotFound { .. }));
    }
}
