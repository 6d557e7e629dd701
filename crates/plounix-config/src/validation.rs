// SPDX-FileCopyrightText: 2026 Plounix Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates cross-field constraints that cannot be expressed via serde
//! attributes, such as the candidate pool being at least the retrieval limit.

use crate::diagnostic::ConfigError;
use crate::model::PlounixConfig;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns all collected validation errors (does not fail fast).
pub fn validate_config(config: &PlounixConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut fail = |message: String| errors.push(ConfigError::Validation { message });

    if config.storage.database_path.trim().is_empty() {
        fail("storage.database_path must not be empty".to_string());
    }

    if config.agent.assistant_name.trim().is_empty() {
        fail("agent.assistant_name must not be empty".to_string());
    }

    let memory = &config.memory;
    if memory.retrieval_limit < 1 {
        fail("memory.retrieval_limit must be at least 1".to_string());
    }
    if memory.candidate_pool < memory.retrieval_limit {
        fail(format!(
            "memory.candidate_pool ({}) must be at least memory.retrieval_limit ({})",
            memory.candidate_pool, memory.retrieval_limit
        ));
    }
    if memory.min_keyword_chars < 1 {
        fail("memory.min_keyword_chars must be at least 1".to_string());
    }
    if memory.max_value_chars < 16 {
        fail(format!(
            "memory.max_value_chars must be at least 16, got {}",
            memory.max_value_chars
        ));
    }
    if memory.keyword_bonus < 0 || memory.key_bonus < 0 {
        fail("memory.keyword_bonus and memory.key_bonus must be non-negative".to_string());
    }

    if config.context.session_window < 1 {
        fail("context.session_window must be at least 1".to_string());
    }
    if config.session.max_turns < config.context.session_window {
        fail(format!(
            "session.max_turns ({}) must be at least context.session_window ({})",
            config.session.max_turns, config.context.session_window
        ));
    }
    if config.session.max_sessions < 1 {
        fail("session.max_sessions must be at least 1".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn has_message(errors: &[ConfigError], needle: &str) -> bool {
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains(needle)))
    }

    #[test]
    fn default_config_validates() {
        assert!(validate_config(&PlounixConfig::default()).is_ok());
    }

    #[test]
    fn empty_database_path_fails_validation() {
        let mut config = PlounixConfig::default();
        config.storage.database_path = "  ".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(has_message(&errors, "database_path"));
    }

    #[test]
    fn pool_smaller_than_limit_fails() {
        let mut config = PlounixConfig::default();
        config.memory.candidate_pool = 3;
        config.memory.retrieval_limit = 5;
        let errors = validate_config(&config).unwrap_err();
        assert!(has_message(&errors, "candidate_pool"));
    }

    #[test]
    fn window_larger_than_buffer_fails() {
        let mut config = PlounixConfig::default();
        config.context.session_window = 80;
        let errors = validate_config(&config).unwrap_err();
        assert!(has_message(&errors, "session.max_turns"));
    }

    #[test]
    fn collects_every_error() {
        let mut config = PlounixConfig::default();
        config.storage.database_path = String::new();
        config.memory.retrieval_limit = 0;
        config.session.max_sessions = 0;
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.len() >= 3, "got {} errors", errors.len());
    }

    #[test]
    fn zero_floor_is_allowed() {
        let mut config = PlounixConfig::default();
        config.memory.relevance_floor = 0;
        assert!(validate_config(&config).is_ok());
    }
}
