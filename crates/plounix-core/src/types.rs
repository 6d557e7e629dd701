// SPDX-FileCopyrightText: 2026 Plounix Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types used across adapter traits and the Plounix memory engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Timestamp format used for every persisted row.
///
/// Millisecond precision with a fixed width, so lexical order equals time order.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// Formats a UTC instant in the persisted timestamp format.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// Current time in the persisted timestamp format.
pub fn now_timestamp() -> String {
    format_timestamp(Utc::now())
}

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the type of adapter.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Storage,
    Oracle,
}

// --- Memory facts ---

/// Closed tag set for durable memory facts.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MemoryType {
    /// A stable fact about the user (e.g. monthly income).
    Fact,
    /// A stated like or dislike.
    Preference,
    /// A savings or spending target.
    Goal,
    /// A product the user asked about.
    Item,
    /// A worry or financial difficulty.
    Concern,
}

/// How a write for a given memory type interacts with existing rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Upsert by `(user_id, key)`: a later write replaces the value.
    Overwrite,
    /// Every write becomes a new row under a freshly derived key.
    Accumulate,
}

impl MemoryType {
    /// All variants, in declaration order.
    pub const ALL: [MemoryType; 5] = [
        MemoryType::Fact,
        MemoryType::Preference,
        MemoryType::Goal,
        MemoryType::Item,
        MemoryType::Concern,
    ];

    /// Write semantics for this memory type.
    pub fn write_mode(&self) -> WriteMode {
        match self {
            MemoryType::Fact | MemoryType::Goal | MemoryType::Item => WriteMode::Overwrite,
            MemoryType::Concern | MemoryType::Preference => WriteMode::Accumulate,
        }
    }
}

/// A durable, per-user memory fact as stored in the fact table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryFact {
    /// Opaque unique identifier (UUID v4).
    pub id: String,
    /// Owning user. Facts are never read across users.
    pub user_id: String,
    pub memory_type: MemoryType,
    /// Optional sub-classification, e.g. "income" or "purchase_inquiry".
    pub category: Option<String>,
    /// Deduplication key, unique per user.
    pub key: String,
    /// Human-readable fact text.
    pub value: String,
    /// Optional provenance snippet.
    pub context: Option<String>,
    /// Session in which this fact was last written.
    pub source_session_id: Option<String>,
    /// Salience score; higher is more central.
    pub importance: i64,
    pub created_at: String,
    pub last_accessed_at: String,
    /// Optional time-to-live boundary; expired facts are never retrieved.
    pub expires_at: Option<String>,
}

impl MemoryFact {
    /// Whether this fact has expired as of `now` (a persisted-format timestamp).
    pub fn is_expired(&self, now: &str) -> bool {
        self.expires_at
            .as_deref()
            .is_some_and(|expires| expires <= now)
    }
}

// --- Chat log ---

/// Speaker of a chat turn.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    User,
    Assistant,
}

/// One durable chat-log entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub session_id: String,
    pub user_id: String,
    pub role: ChatRole,
    pub content: String,
    pub created_at: String,
}

// --- Finance collaborator rows ---

/// Profile row owned by the profile collaborator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: String,
    pub display_name: Option<String>,
    pub email: Option<String>,
    /// Persona label assigned during onboarding (e.g. "student", "young professional").
    pub persona: Option<String>,
    pub monthly_income: Option<f64>,
    pub preferred_language: Option<String>,
    pub communication_style: Option<String>,
}

/// Direction of a transaction.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Income,
    Expense,
}

/// A single income or expense entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    pub user_id: String,
    pub kind: TransactionKind,
    pub category: String,
    pub amount: f64,
    pub description: Option<String>,
    pub occurred_at: String,
}

/// A savings goal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub target_amount: f64,
    pub current_amount: f64,
    /// "active", "completed" or "abandoned".
    pub status: String,
    pub deadline: Option<String>,
}

/// A gamified savings challenge the user joined.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Challenge {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub status: String,
    /// Completion percentage, 0-100.
    pub progress: i64,
}
