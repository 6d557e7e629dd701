// SPDX-FileCopyrightText: 2026 Plounix Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Plounix memory engine.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Plounix configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PlounixConfig {
    /// Assistant identity and logging settings.
    #[serde(default)]
    pub agent: AgentConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Long-term memory extraction and retrieval settings.
    #[serde(default)]
    pub memory: MemoryConfig,

    /// Prompt context composition settings.
    #[serde(default)]
    pub context: ContextConfig,

    /// In-process session buffer settings.
    #[serde(default)]
    pub session: SessionConfig,
}

/// Assistant identity configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Application name, used in the log filter.
    #[serde(default = "default_agent_name")]
    pub name: String,

    /// Name the assistant uses for itself in prompts.
    #[serde(default = "default_assistant_name")]
    pub assistant_name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
            assistant_name: default_assistant_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_agent_name() -> String {
    "plounix".to_string()
}

fn default_assistant_name() -> String {
    "Fili".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("plounix").join("plounix.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("plounix.db"))
        .display()
        .to_string()
}

fn default_wal_mode() -> bool {
    true
}

/// Which extractor derives candidate facts from a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionStrategy {
    /// Conservative lexical rules.
    #[default]
    Rules,
    /// Ask the oracle for structured JSON, validated before use.
    Oracle,
}

/// Memory system configuration.
///
/// The scoring weights are the regression baseline of the keyword retriever;
/// they are tunable rather than semantically fixed.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MemoryConfig {
    /// Enable the memory system. When false, no memory operations occur.
    #[serde(default = "default_memory_enabled")]
    pub enabled: bool,

    /// Number of facts loaded per user before scoring.
    #[serde(default = "default_candidate_pool")]
    pub candidate_pool: usize,

    /// Maximum facts returned per retrieval.
    #[serde(default = "default_retrieval_limit")]
    pub retrieval_limit: usize,

    /// Facts scoring at or below this value are dropped.
    #[serde(default = "default_relevance_floor")]
    pub relevance_floor: i64,

    /// Score added per fact keyword found in the message.
    #[serde(default = "default_keyword_bonus")]
    pub keyword_bonus: i64,

    /// Score added when the message contains the fact key as a phrase.
    #[serde(default = "default_key_bonus")]
    pub key_bonus: i64,

    /// Minimum characters for a value word to count as a keyword.
    #[serde(default = "default_min_keyword_chars")]
    pub min_keyword_chars: usize,

    /// Maximum characters kept in a fact value.
    #[serde(default = "default_max_value_chars")]
    pub max_value_chars: usize,

    /// Extractor used after each turn.
    #[serde(default)]
    pub extraction: ExtractionStrategy,

    /// Run extraction on a spawned task instead of inline with the turn.
    #[serde(default)]
    pub extract_in_background: bool,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            enabled: default_memory_enabled(),
            candidate_pool: default_candidate_pool(),
            retrieval_limit: default_retrieval_limit(),
            relevance_floor: default_relevance_floor(),
            keyword_bonus: default_keyword_bonus(),
            key_bonus: default_key_bonus(),
            min_keyword_chars: default_min_keyword_chars(),
            max_value_chars: default_max_value_chars(),
            extraction: ExtractionStrategy::default(),
            extract_in_background: false,
        }
    }
}

fn default_memory_enabled() -> bool {
    true
}

fn default_candidate_pool() -> usize {
    20
}

fn default_retrieval_limit() -> usize {
    5
}

fn default_relevance_floor() -> i64 {
    5
}

fn default_keyword_bonus() -> i64 {
    3
}

fn default_key_bonus() -> i64 {
    5
}

fn default_min_keyword_chars() -> usize {
    4
}

fn default_max_value_chars() -> usize {
    200
}

/// Prompt context configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ContextConfig {
    /// Number of recent session turns included in the prompt.
    #[serde(default = "default_session_window")]
    pub session_window: usize,

    /// Per-turn character cap inside the recent-conversation section.
    #[serde(default = "default_max_turn_chars")]
    pub max_turn_chars: usize,

    /// Read the durable chat log when the session buffer is empty.
    #[serde(default = "default_durable_fallback")]
    pub durable_fallback: bool,

    /// Number of recent transactions summarized in the profile snapshot.
    #[serde(default = "default_recent_transactions")]
    pub recent_transactions: usize,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            session_window: default_session_window(),
            max_turn_chars: default_max_turn_chars(),
            durable_fallback: default_durable_fallback(),
            recent_transactions: default_recent_transactions(),
        }
    }
}

fn default_session_window() -> usize {
    10
}

fn default_max_turn_chars() -> usize {
    500
}

fn default_durable_fallback() -> bool {
    true
}

fn default_recent_transactions() -> usize {
    50
}

/// In-process session buffer configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SessionConfig {
    /// Maximum live session buffers before least-recently-used eviction.
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,

    /// Maximum turns retained per session buffer.
    #[serde(default = "default_max_turns")]
    pub max_turns: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_sessions: default_max_sessions(),
            max_turns: default_max_turns(),
        }
    }
}

fn default_max_sessions() -> usize {
    1024
}

fn default_max_turns() -> usize {
    50
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_defaults_match_retriever_baseline() {
        let memory = MemoryConfig::default();
        assert!(memory.enabled);
        assert_eq!(memory.candidate_pool, 20);
        assert_eq!(memory.retrieval_limit, 5);
        assert_eq!(memory.relevance_floor, 5);
        assert_eq!(memory.keyword_bonus, 3);
        assert_eq!(memory.key_bonus, 5);
        assert_eq!(memory.min_keyword_chars, 4);
        assert_eq!(memory.max_value_chars, 200);
        assert_eq!(memory.extraction, ExtractionStrategy::Rules);
        assert!(!memory.extract_in_background);
    }

    #[test]
    fn extraction_strategy_parses_snake_case() {
        let config: PlounixConfig = toml::from_str(
            r#"
[memory]
extraction = "oracle"
"#,
        )
        .unwrap();
        assert_eq!(config.memory.extraction, ExtractionStrategy::Oracle);
    }

    #[test]
    fn assistant_name_defaults_to_fili() {
        assert_eq!(AgentConfig::default().assistant_name, "Fili");
    }
}
