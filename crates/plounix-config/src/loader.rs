// SPDX-FileCopyrightText: 2026 Plounix Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./plounix.toml` > `~/.config/plounix/plounix.toml` > `/etc/plounix/plounix.toml`
//! with environment variable overrides via `PLOUNIX_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::PlounixConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/plounix/plounix.toml` (system-wide)
/// 3. `~/.config/plounix/plounix.toml` (user XDG config)
/// 4. `./plounix.toml` (local directory)
/// 5. `PLOUNIX_*` environment variables
pub fn load_config() -> Result<PlounixConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<PlounixConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(PlounixConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<PlounixConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(PlounixConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading.
///
/// Returns the Figment before extraction so callers can inspect metadata.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(PlounixConfig::default()))
        .merge(Toml::file("/etc/plounix/plounix.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("plounix/plounix.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("plounix.toml"))
        .merge(env_provider())
}

/// Environment provider with explicit section-to-dot mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` because key names contain
/// underscores: `PLOUNIX_MEMORY_RELEVANCE_FLOOR` must map to
/// `memory.relevance_floor`, not `memory.relevance.floor`.
fn env_provider() -> Env {
    Env::prefixed("PLOUNIX_").map(|key| {
        let mapped = map_env_key(key.as_str());
        mapped.into()
    })
}

/// Maps a prefix-stripped env var name to a dotted config path.
///
/// Figment hands the key over before lowercasing it, so case is folded here.
fn map_env_key(key: &str) -> String {
    const SECTIONS: [&str; 5] = ["agent", "storage", "memory", "context", "session"];

    let key = key.to_ascii_lowercase();
    for section in SECTIONS {
        if let Some(rest) = key
            .strip_prefix(section)
            .and_then(|rest| rest.strip_prefix('_'))
        {
            return format!("{section}.{rest}");
        }
    }
    key
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_keys_map_to_sections() {
        assert_eq!(map_env_key("MEMORY_RELEVANCE_FLOOR"), "memory.relevance_floor");
        assert_eq!(map_env_key("STORAGE_DATABASE_PATH"), "storage.database_path");
        assert_eq!(map_env_key("AGENT_LOG_LEVEL"), "agent.log_level");
        assert_eq!(map_env_key("SESSION_MAX_TURNS"), "session.max_turns");
        assert_eq!(map_env_key("memory_key_bonus"), "memory.key_bonus");
    }

    #[test]
    fn context_session_window_is_not_split_twice() {
        // Only the section prefix is rewritten; "session" inside the key stays.
        assert_eq!(map_env_key("CONTEXT_SESSION_WINDOW"), "context.session_window");
    }

    #[test]
    fn string_overrides_defaults() {
        let config = load_config_from_str(
            r#"
[memory]
retrieval_limit = 3
"#,
        )
        .unwrap();
        assert_eq!(config.memory.retrieval_limit, 3);
        assert_eq!(config.memory.candidate_pool, 20);
    }
}
