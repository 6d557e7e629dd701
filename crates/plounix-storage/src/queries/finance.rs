// SPDX-FileCopyrightText: 2026 Plounix Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Read and seed operations for the financial collaborator tables.
//!
//! The memory engine only reads these tables; the write helpers exist for
//! onboarding imports and tests.

use plounix_core::PlounixError;
use plounix_core::types::{Challenge, Goal, Transaction, UserProfile};
use rusqlite::{OptionalExtension, params};

use crate::database::{Database, map_tr_err};

/// Fetch the profile row of a user, if any.
pub async fn get_profile(db: &Database, user_id: &str) -> Result<Option<UserProfile>, PlounixError> {
    let user_id = user_id.to_string();
    db.connection()
        .call(move |conn| -> Result<Option<UserProfile>, rusqlite::Error> {
            conn.query_row(
                "SELECT user_id, display_name, email, persona, monthly_income, \
                 preferred_language, communication_style \
                 FROM user_profiles WHERE user_id = ?1",
                params![user_id],
                |row| {
                    Ok(UserProfile {
                        user_id: row.get(0)?,
                        display_name: row.get(1)?,
                        email: row.get(2)?,
                        persona: row.get(3)?,
                        monthly_income: row.get(4)?,
                        preferred_language: row.get(5)?,
                        communication_style: row.get(6)?,
                    })
                },
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Insert or replace a profile row.
pub async fn upsert_profile(db: &Database, profile: &UserProfile) -> Result<(), PlounixError> {
    let p = profile.clone();
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute(
                "INSERT OR REPLACE INTO user_profiles (user_id, display_name, email, persona, \
                 monthly_income, preferred_language, communication_style) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    p.user_id,
                    p.display_name,
                    p.email,
                    p.persona,
                    p.monthly_income,
                    p.preferred_language,
                    p.communication_style,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// The most recent `limit` transactions of a user, newest first.
pub async fn recent_transactions(
    db: &Database,
    user_id: &str,
    limit: usize,
) -> Result<Vec<Transaction>, PlounixError> {
    let user_id = user_id.to_string();
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    db.connection()
        .call(move |conn| -> Result<Vec<Transaction>, rusqlite::Error> {
            let mut stmt = conn.prepare(
                "SELECT id, user_id, kind, category, amount, description, occurred_at \
                 FROM transactions WHERE user_id = ?1 \
                 ORDER BY occurred_at DESC LIMIT ?2",
            )?;
            let rows = stmt.query_map(params![user_id, limit], |row| {
                let kind: String = row.get(2)?;
                let kind = kind.parse().map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(
                        2,
                        rusqlite::types::Type::Text,
                        Box::new(e),
                    )
                })?;
                Ok(Transaction {
                    id: row.get(0)?,
                    user_id: row.get(1)?,
                    kind,
                    category: row.get(3)?,
                    amount: row.get(4)?,
                    description: row.get(5)?,
                    occurred_at: row.get(6)?,
                })
            })?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

pub async fn insert_transaction(db: &Database, tx: &Transaction) -> Result<(), PlounixError> {
    let t = tx.clone();
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute(
                "INSERT INTO transactions (id, user_id, kind, category, amount, description, occurred_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    t.id,
                    t.user_id,
                    t.kind.to_string(),
                    t.category,
                    t.amount,
                    t.description,
                    t.occurred_at,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// All goals of a user, active ones first.
pub async fn list_goals(db: &Database, user_id: &str) -> Result<Vec<Goal>, PlounixError> {
    let user_id = user_id.to_string();
    db.connection()
        .call(move |conn| -> Result<Vec<Goal>, rusqlite::Error> {
            let mut stmt = conn.prepare(
                "SELECT id, user_id, title, target_amount, current_amount, status, deadline \
                 FROM goals WHERE user_id = ?1 \
                 ORDER BY (status = 'active') DESC, deadline IS NULL, deadline ASC",
            )?;
            let rows = stmt.query_map(params![user_id], |row| {
                Ok(Goal {
                    id: row.get(0)?,
                    user_id: row.get(1)?,
                    title: row.get(2)?,
                    target_amount: row.get(3)?,
                    current_amount: row.get(4)?,
                    status: row.get(5)?,
                    deadline: row.get(6)?,
                })
            })?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

pub async fn insert_goal(db: &Database, goal: &Goal) -> Result<(), PlounixError> {
    let g = goal.clone();
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute(
                "INSERT INTO goals (id, user_id, title, target_amount, current_amount, status, deadline) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    g.id,
                    g.user_id,
                    g.title,
                    g.target_amount,
                    g.current_amount,
                    g.status,
                    g.deadline,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

pub async fn list_challenges(db: &Database, user_id: &str) -> Result<Vec<Challenge>, PlounixError> {
    let user_id = user_id.to_string();
    db.connection()
        .call(move |conn| -> Result<Vec<Challenge>, rusqlite::Error> {
            let mut stmt = conn.prepare(
                "SELECT id, user_id, title, status, progress FROM challenges \
                 WHERE user_id = ?1 ORDER BY rowid",
            )?;
            let rows = stmt.query_map(params![user_id], |row| {
                Ok(Challenge {
                    id: row.get(0)?,
                    user_id: row.get(1)?,
                    title: row.get(2)?,
                    status: row.get(3)?,
                    progress: row.get(4)?,
                })
            })?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

pub async fn insert_challenge(db: &Database, challenge: &Challenge) -> Result<(), PlounixError> {
    let c = challenge.clone();
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute(
                "INSERT INTO challenges (id, user_id, title, status, progress) \
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![c.id, c.user_id, c.title, c.status, c.progress],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}
