// SPDX-FileCopyrightText: 2026 Plounix Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Durable chat log operations.

use plounix_core::PlounixError;
use plounix_core::types::ChatMessage;
use rusqlite::params;

use crate::database::{Database, map_tr_err};

/// Append a message to the chat log.
pub async fn insert_message(db: &Database, msg: &ChatMessage) -> Result<(), PlounixError> {
    let msg = msg.clone();
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute(
                "INSERT INTO chat_messages (id, session_id, user_id, role, content, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    msg.id,
                    msg.session_id,
                    msg.user_id,
                    msg.role.to_string(),
                    msg.content,
                    msg.created_at,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// The last `limit` messages of one user in a session, returned oldest first.
pub async fn recent_messages(
    db: &Database,
    user_id: &str,
    session_id: &str,
    limit: usize,
) -> Result<Vec<ChatMessage>, PlounixError> {
    let user_id = user_id.to_string();
    let session_id = session_id.to_string();
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    db.connection()
        .call(move |conn| -> Result<Vec<ChatMessage>, rusqlite::Error> {
            // rowid breaks ties between messages written in the same millisecond.
            let mut stmt = conn.prepare(
                "SELECT id, session_id, user_id, role, content, created_at FROM (
                     SELECT rowid AS seq, id, session_id, user_id, role, content, created_at
                     FROM chat_messages WHERE session_id = ?1 AND user_id = ?2
                     ORDER BY created_at DESC, seq DESC LIMIT ?3
                 ) ORDER BY created_at ASC, seq ASC",
            )?;
            let rows = stmt.query_map(params![session_id, user_id, limit], |row| {
                let role: String = row.get(3)?;
                let role = role.parse().map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(
                        3,
                        rusqlite::types::Type::Text,
                        Box::new(e),
                    )
                })?;
                Ok(ChatMessage {
                    id: row.get(0)?,
                    session_id: row.get(1)?,
                    user_id: row.get(2)?,
                    role,
                    content: row.get(4)?,
                    created_at: row.get(5)?,
                })
            })?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}
