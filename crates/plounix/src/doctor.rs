// SPDX-FileCopyrightText: 2026 Plounix Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `plounix doctor` command implementation.
//!
//! Runs diagnostic checks against the configuration and the memory
//! database, then prints one line per check.

use std::io::IsTerminal;
use std::time::{Duration, Instant};

use plounix_config::PlounixConfig;
use plounix_core::types::{HealthStatus, now_timestamp};
use plounix_core::{PlounixError, PluginAdapter, StorageAdapter};
use plounix_storage::SqliteStorage;

/// Status of a diagnostic check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckStatus {
    /// Check passed successfully.
    Pass,
    /// Check passed with a warning.
    Warn,
    /// Check failed.
    Fail,
}

/// Result of a single diagnostic check.
#[derive(Debug, Clone)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub duration: Duration,
}

impl CheckResult {
    fn new(name: &str, status: CheckStatus, message: impl Into<String>, start: Instant) -> Self {
        Self {
            name: name.to_string(),
            status,
            message: message.into(),
            duration: start.elapsed(),
        }
    }
}

/// Run the `plounix doctor` command.
pub async fn run_doctor(config: &PlounixConfig, plain: bool) -> Result<(), PlounixError> {
    let use_color = !plain && std::io::stdout().is_terminal();
    let results = run_checks(config).await;

    println!();
    println!("  plounix doctor");
    println!("  {}", "-".repeat(50));
    println!(
        "    assistant: {}  database: {}",
        config.agent.assistant_name, config.storage.database_path
    );
    println!(
        "    retrieval: pool {} limit {} floor {}  extraction: {:?}",
        config.memory.candidate_pool,
        config.memory.retrieval_limit,
        config.memory.relevance_floor,
        config.memory.extraction
    );
    println!();

    let mut issues = 0;
    for result in &results {
        if result.status != CheckStatus::Pass {
            issues += 1;
        }
        println!("{}", render_line(result, use_color));
    }
    println!();

    if issues > 0 {
        let issue_word = if issues == 1 { "issue" } else { "issues" };
        println!("  {issues} {issue_word} found.");
    } else {
        println!("  All checks passed.");
    }
    println!();

    Ok(())
}

fn render_line(result: &CheckResult, use_color: bool) -> String {
    let duration_ms = result.duration.as_millis();
    if use_color {
        use colored::Colorize;
        let (symbol, message) = match result.status {
            CheckStatus::Pass => ("✓".green().to_string(), result.message.normal().to_string()),
            CheckStatus::Warn => ("!".yellow().to_string(), result.message.yellow().to_string()),
            CheckStatus::Fail => ("✗".red().to_string(), result.message.red().to_string()),
        };
        format!("    {symbol} {:<20} {message} ({duration_ms}ms)", result.name)
    } else {
        let tag = match result.status {
            CheckStatus::Pass => "[OK]  ",
            CheckStatus::Warn => "[WARN]",
            CheckStatus::Fail => "[FAIL]",
        };
        format!("    {tag} {:<20} {} ({duration_ms}ms)", result.name, result.message)
    }
}

/// Runs every check in order. Storage checks are skipped if the database
/// cannot be opened.
pub async fn run_checks(config: &PlounixConfig) -> Vec<CheckResult> {
    let mut results = vec![check_config(config)];

    let start = Instant::now();
    let storage = SqliteStorage::new(config.storage.clone());
    if let Err(e) = storage.initialize().await {
        results.push(CheckResult::new(
            "Database",
            CheckStatus::Fail,
            format!("open failed: {e}"),
            start,
        ));
        return results;
    }
    results.push(CheckResult::new(
        "Database",
        CheckStatus::Pass,
        "opened, migrations applied",
        start,
    ));

    results.push(check_health(&storage).await);
    results.push(check_integrity(&storage).await);
    results.push(check_facts(&storage).await);

    if let Err(e) = storage.close().await {
        tracing::warn!(error = %e, "failed to close database after checks");
    }
    results
}

fn check_config(config: &PlounixConfig) -> CheckResult {
    let start = Instant::now();
    if config.memory.enabled {
        CheckResult::new("Configuration", CheckStatus::Pass, "valid", start)
    } else {
        CheckResult::new(
            "Configuration",
            CheckStatus::Warn,
            "valid, but memory is disabled",
            start,
        )
    }
}

async fn check_health(storage: &SqliteStorage) -> CheckResult {
    let start = Instant::now();
    match storage.health_check().await {
        Ok(HealthStatus::Healthy) => CheckResult::new("Health", CheckStatus::Pass, "healthy", start),
        Ok(HealthStatus::Degraded(reason)) => {
            CheckResult::new("Health", CheckStatus::Warn, reason, start)
        }
        Ok(HealthStatus::Unhealthy(reason)) => {
            CheckResult::new("Health", CheckStatus::Fail, reason, start)
        }
        Err(e) => CheckResult::new("Health", CheckStatus::Fail, e.to_string(), start),
    }
}

async fn check_integrity(storage: &SqliteStorage) -> CheckResult {
    let start = Instant::now();
    let db = match storage.database() {
        Ok(db) => db,
        Err(e) => return CheckResult::new("DB integrity", CheckStatus::Fail, e.to_string(), start),
    };
    let result = db
        .connection()
        .call(|conn| -> Result<Vec<String>, rusqlite::Error> {
            let mut stmt = conn.prepare("PRAGMA integrity_check")?;
            let rows = stmt
                .query_map([], |row| row.get(0))?
                .collect::<Result<Vec<String>, _>>()?;
            Ok(rows)
        })
        .await;

    match result {
        Ok(rows) if rows.len() == 1 && rows[0] == "ok" => {
            CheckResult::new("DB integrity", CheckStatus::Pass, "ok", start)
        }
        Ok(rows) => CheckResult::new(
            "DB integrity",
            CheckStatus::Fail,
            format!("{} issue(s) found", rows.len()),
            start,
        ),
        Err(e) => CheckResult::new(
            "DB integrity",
            CheckStatus::Fail,
            format!("check failed: {e}"),
            start,
        ),
    }
}

async fn check_facts(storage: &SqliteStorage) -> CheckResult {
    let start = Instant::now();
    let db = match storage.database() {
        Ok(db) => db,
        Err(e) => return CheckResult::new("Memory facts", CheckStatus::Fail, e.to_string(), start),
    };
    let now = now_timestamp();
    let result = db
        .connection()
        .call(move |conn| -> Result<(i64, i64, i64), rusqlite::Error> {
            conn.query_row(
                "SELECT COUNT(*), COUNT(DISTINCT user_id),
                        COALESCE(SUM(expires_at IS NOT NULL AND expires_at <= ?1), 0)
                 FROM memory_facts",
                [&now],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
        })
        .await;

    match result {
        Ok((total, users, expired)) if expired > 0 => CheckResult::new(
            "Memory facts",
            CheckStatus::Warn,
            format!("{total} fact(s) for {users} user(s), {expired} expired (run `plounix memory prune`)"),
            start,
        ),
        Ok((total, users, _)) => CheckResult::new(
            "Memory facts",
            CheckStatus::Pass,
            format!("{total} fact(s) for {users} user(s)"),
            start,
        ),
        Err(e) => CheckResult::new(
            "Memory facts",
            CheckStatus::Fail,
            format!("count failed: {e}"),
            start,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plounix_config::StorageConfig;

    fn config_at(path: String) -> PlounixConfig {
        PlounixConfig {
            storage: StorageConfig {
                database_path: path,
                wal_mode: true,
            },
            ..PlounixConfig::default()
        }
    }

    #[test]
    fn check_status_equality() {
        assert_eq!(CheckStatus::Pass, CheckStatus::Pass);
        assert_ne!(CheckStatus::Pass, CheckStatus::Fail);
    }

    #[test]
    fn plain_rendering_uses_tags() {
        let result = CheckResult {
            name: "Database".to_string(),
            status: CheckStatus::Warn,
            message: "slow".to_string(),
            duration: Duration::from_millis(5),
        };
        let line = render_line(&result, false);
        assert!(line.contains("[WARN]"));
        assert!(line.contains("slow (5ms)"));
    }

    #[test]
    fn disabled_memory_warns() {
        let mut config = PlounixConfig::default();
        config.memory.enabled = false;
        assert_eq!(check_config(&config).status, CheckStatus::Warn);
    }

    #[tokio::test]
    async fn fresh_database_passes_every_check() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_at(dir.path().join("doctor.db").display().to_string());
        let results = run_checks(&config).await;
        assert_eq!(results.len(), 5);
        assert!(
            results.iter().all(|r| r.status == CheckStatus::Pass),
            "{results:?}"
        );
    }

    #[tokio::test]
    async fn unopenable_database_fails_and_stops() {
        let dir = tempfile::tempdir().unwrap();
        // A directory cannot be opened as a database file.
        let config = config_at(dir.path().display().to_string());
        let results = run_checks(&config).await;
        assert_eq!(results.len(), 2);
        assert_eq!(results[1].status, CheckStatus::Fail);
    }
}
