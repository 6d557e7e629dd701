// SPDX-FileCopyrightText: 2026 Plounix Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Memory fact queries.

use plounix_core::PlounixError;
use plounix_core::types::MemoryFact;
use rusqlite::params;

use crate::database::{Database, map_tr_err};

const FACT_COLUMNS: &str = "id, user_id, memory_type, category, key, value, context, \
     source_session_id, importance, created_at, last_accessed_at, expires_at";

fn row_to_fact(row: &rusqlite::Row<'_>) -> Result<MemoryFact, rusqlite::Error> {
    let memory_type: String = row.get(2)?;
    let memory_type = memory_type.parse().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(MemoryFact {
        id: row.get(0)?,
        user_id: row.get(1)?,
        memory_type,
        category: row.get(3)?,
        key: row.get(4)?,
        value: row.get(5)?,
        context: row.get(6)?,
        source_session_id: row.get(7)?,
        importance: row.get(8)?,
        created_at: row.get(9)?,
        last_accessed_at: row.get(10)?,
        expires_at: row.get(11)?,
    })
}

/// Find the fact stored under `(user_id, key)`, expired or not.
pub async fn find_by_key(
    db: &Database,
    user_id: &str,
    key: &str,
) -> Result<Option<MemoryFact>, PlounixError> {
    let user_id = user_id.to_string();
    let key = key.to_string();
    db.connection()
        .call(move |conn| -> Result<Option<MemoryFact>, rusqlite::Error> {
            let sql = format!("SELECT {FACT_COLUMNS} FROM memory_facts WHERE user_id = ?1 AND key = ?2");
            let mut stmt = conn.prepare(&sql)?;
            let mut rows = stmt.query_map(params![user_id, key], row_to_fact)?;
            rows.next().transpose()
        })
        .await
        .map_err(map_tr_err)
}

/// Insert a new fact. Fails on a duplicate `(user_id, key)`.
pub async fn insert_fact(db: &Database, fact: &MemoryFact) -> Result<(), PlounixError> {
    let fact = fact.clone();
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute(
                "INSERT INTO memory_facts (id, user_id, memory_type, category, key, value, context, \
                 source_session_id, importance, created_at, last_accessed_at, expires_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                params![
                    fact.id,
                    fact.user_id,
                    fact.memory_type.to_string(),
                    fact.category,
                    fact.key,
                    fact.value,
                    fact.context,
                    fact.source_session_id,
                    fact.importance,
                    fact.created_at,
                    fact.last_accessed_at,
                    fact.expires_at,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Rewrite the mutable columns of the row identified by `fact.id`.
pub async fn update_fact(db: &Database, fact: &MemoryFact) -> Result<(), PlounixError> {
    let id = fact.id.clone();
    let fact = fact.clone();
    let changed = db
        .connection()
        .call(move |conn| -> Result<usize, rusqlite::Error> {
            conn.execute(
                "UPDATE memory_facts SET memory_type = ?2, category = ?3, value = ?4, context = ?5, \
                 source_session_id = ?6, importance = ?7, last_accessed_at = ?8, expires_at = ?9 \
                 WHERE id = ?1",
                params![
                    fact.id,
                    fact.memory_type.to_string(),
                    fact.category,
                    fact.value,
                    fact.context,
                    fact.source_session_id,
                    fact.importance,
                    fact.last_accessed_at,
                    fact.expires_at,
                ],
            )
        })
        .await
        .map_err(map_tr_err)?;

    if changed == 0 {
        return Err(PlounixError::NotFound {
            entity: "memory fact".to_string(),
            key: id,
        });
    }
    Ok(())
}

/// Atomically insert or merge by `(user_id, key)`, returning the stored row.
///
/// On conflict the value is replaced, importance keeps the larger of the two,
/// access time and source session are refreshed, and expiry is taken from
/// the new write. `id` and `created_at` of the existing row are preserved.
pub async fn upsert_fact(db: &Database, fact: &MemoryFact) -> Result<MemoryFact, PlounixError> {
    let fact = fact.clone();
    db.connection()
        .call(move |conn| -> Result<MemoryFact, rusqlite::Error> {
            let sql = format!(
                "INSERT INTO memory_facts (id, user_id, memory_type, category, key, value, context, \
                 source_session_id, importance, created_at, last_accessed_at, expires_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12) \
                 ON CONFLICT(user_id, key) DO UPDATE SET \
                     value = excluded.value, \
                     importance = MAX(memory_facts.importance, excluded.importance), \
                     last_accessed_at = excluded.last_accessed_at, \
                     source_session_id = excluded.source_session_id, \
                     expires_at = excluded.expires_at \
                 RETURNING {FACT_COLUMNS}"
            );
            conn.query_row(
                &sql,
                params![
                    fact.id,
                    fact.user_id,
                    fact.memory_type.to_string(),
                    fact.category,
                    fact.key,
                    fact.value,
                    fact.context,
                    fact.source_session_id,
                    fact.importance,
                    fact.created_at,
                    fact.last_accessed_at,
                    fact.expires_at,
                ],
                row_to_fact,
            )
        })
        .await
        .map_err(map_tr_err)
}

/// Non-expired facts of a user, most important first, then most recently used.
pub async fn list_for_user(
    db: &Database,
    user_id: &str,
    limit: usize,
    now: &str,
) -> Result<Vec<MemoryFact>, PlounixError> {
    let user_id = user_id.to_string();
    let now = now.to_string();
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    db.connection()
        .call(move |conn| -> Result<Vec<MemoryFact>, rusqlite::Error> {
            let sql = format!(
                "SELECT {FACT_COLUMNS} FROM memory_facts \
                 WHERE user_id = ?1 AND (expires_at IS NULL OR expires_at > ?2) \
                 ORDER BY importance DESC, last_accessed_at DESC \
                 LIMIT ?3"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params![user_id, now, limit], row_to_fact)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

/// Set `last_accessed_at` on the given facts of one user.
pub async fn touch_facts(
    db: &Database,
    user_id: &str,
    ids: &[String],
    at: &str,
) -> Result<(), PlounixError> {
    if ids.is_empty() {
        return Ok(());
    }
    let user_id = user_id.to_string();
    let ids = ids.to_vec();
    let at = at.to_string();
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            let tx = conn.transaction()?;
            {
                let mut stmt = tx.prepare(
                    "UPDATE memory_facts SET last_accessed_at = ?1 WHERE user_id = ?2 AND id = ?3",
                )?;
                for id in &ids {
                    stmt.execute(params![at, user_id, id])?;
                }
            }
            tx.commit()
        })
        .await
        .map_err(map_tr_err)
}

/// Delete every fact of a user. Returns the number of rows removed.
pub async fn delete_all_for_user(db: &Database, user_id: &str) -> Result<u64, PlounixError> {
    let user_id = user_id.to_string();
    let removed = db
        .connection()
        .call(move |conn| -> Result<usize, rusqlite::Error> {
            conn.execute("DELETE FROM memory_facts WHERE user_id = ?1", params![user_id])
        })
        .await
        .map_err(map_tr_err)?;
    Ok(removed as u64)
}

/// Delete facts whose expiry is at or before `now`.
pub async fn delete_expired(db: &Database, now: &str) -> Result<u64, PlounixError> {
    let now = now.to_string();
    let removed = db
        .connection()
        .call(move |conn| -> Result<usize, rusqlite::Error> {
            conn.execute(
                "DELETE FROM memory_facts WHERE expires_at IS NOT NULL AND expires_at <= ?1",
                params![now],
            )
        })
        .await
        .map_err(map_tr_err)?;
    Ok(removed as u64)
}
