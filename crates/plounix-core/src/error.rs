// SPDX-FileCopyrightText: 2026 Plounix Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Plounix memory engine.

use thiserror::Error;

/// The primary error type used across all Plounix adapter traits and core operations.
#[derive(Debug, Error)]
pub enum PlounixError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, migration).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Language-model oracle errors (API failure, empty completion).
    #[error("oracle error: {message}")]
    Oracle {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A candidate fact failed schema validation and must not be persisted.
    #[error("invalid memory candidate: {0}")]
    InvalidCandidate(String),

    /// A requested row does not exist.
    #[error("{entity} not found: {key}")]
    NotFound { entity: String, key: String },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl PlounixError {
    /// Wraps any error as a storage error.
    pub fn storage<E>(e: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        PlounixError::Storage {
            source: Box::new(e),
        }
    }
}
