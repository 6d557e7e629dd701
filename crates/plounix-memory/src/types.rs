// SPDX-FileCopyrightText: 2026 Plounix Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Memory domain types for the long-term memory system.

use std::str::FromStr;

use plounix_core::types::{MemoryFact, MemoryType};
use plounix_core::PlounixError;
use serde::{Deserialize, Serialize};

/// Lowest importance a candidate may carry.
pub const MIN_IMPORTANCE: i64 = 1;
/// Highest importance a candidate may carry.
pub const MAX_IMPORTANCE: i64 = 10;
/// Longest key accepted from any extractor.
pub const MAX_KEY_CHARS: usize = 100;

/// A fact proposed by an extractor, not yet persisted.
///
/// For accumulating types (`concern`, `preference`) `key` is a base key; the
/// store derives the unique stored key when it writes the row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateFact {
    pub memory_type: MemoryType,
    pub category: Option<String>,
    pub key: String,
    pub value: String,
    pub context: Option<String>,
    pub importance: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<String>,
}

impl CandidateFact {
    pub fn new(
        memory_type: MemoryType,
        key: impl Into<String>,
        value: impl Into<String>,
        importance: i64,
    ) -> Self {
        Self {
            memory_type,
            category: None,
            key: key.into(),
            value: value.into(),
            context: None,
            importance,
            expires_at: None,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Checks the candidate against the memory fact schema.
    pub fn validate(&self) -> Result<(), PlounixError> {
        let key = self.key.trim();
        if key.is_empty() {
            return Err(PlounixError::InvalidCandidate("empty key".into()));
        }
        if key.chars().count() > MAX_KEY_CHARS {
            return Err(PlounixError::InvalidCandidate(format!(
                "key longer than {MAX_KEY_CHARS} characters"
            )));
        }
        if key.chars().any(char::is_whitespace) {
            return Err(PlounixError::InvalidCandidate(format!(
                "key `{key}` contains whitespace"
            )));
        }
        if self.value.trim().is_empty() {
            return Err(PlounixError::InvalidCandidate(format!(
                "empty value for key `{key}`"
            )));
        }
        if !(MIN_IMPORTANCE..=MAX_IMPORTANCE).contains(&self.importance) {
            return Err(PlounixError::InvalidCandidate(format!(
                "importance {} outside {MIN_IMPORTANCE}..={MAX_IMPORTANCE}",
                self.importance
            )));
        }
        Ok(())
    }
}

/// Raw item of an oracle extraction response, before validation.
///
/// Fields are deliberately loose so that one bad item does not fail the
/// whole array.
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractedFact {
    pub memory_type: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub importance: Option<i64>,
}

/// Importance used when the oracle omits one.
const DEFAULT_ORACLE_IMPORTANCE: i64 = 6;

impl TryFrom<ExtractedFact> for CandidateFact {
    type Error = PlounixError;

    fn try_from(raw: ExtractedFact) -> Result<Self, Self::Error> {
        let memory_type = MemoryType::from_str(raw.memory_type.trim()).map_err(|_| {
            PlounixError::InvalidCandidate(format!("unknown memory_type `{}`", raw.memory_type))
        })?;
        let candidate = CandidateFact {
            memory_type,
            category: raw.category.filter(|c| !c.trim().is_empty()),
            key: raw.key.trim().to_lowercase(),
            value: raw.value.trim().to_string(),
            context: None,
            importance: raw.importance.unwrap_or(DEFAULT_ORACLE_IMPORTANCE),
            expires_at: None,
        };
        candidate.validate()?;
        Ok(candidate)
    }
}

/// A retrieved fact together with the relevance score it was ranked by.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredFact {
    pub fact: MemoryFact,
    pub score: i64,
}

/// Truncates `text` to at most `max_chars` characters on a char boundary.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}
