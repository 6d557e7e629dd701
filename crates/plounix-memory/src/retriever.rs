// SPDX-FileCopyrightText: 2026 Plounix Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Keyword retriever over a bounded candidate pool.
//!
//! Each candidate starts at its importance, gains a bonus for every value
//! keyword found in the message and another when the message contains the
//! fact key as a phrase. Candidates at or below the relevance floor are
//! dropped, and only the facts actually returned are marked accessed.

use std::sync::Arc;

use plounix_config::MemoryConfig;
use plounix_core::types::{MemoryFact, now_timestamp};
use plounix_core::{FactTable, PlounixError};
use tracing::{debug, warn};

use crate::types::ScoredFact;

/// Scoring parameters. Defaults are the regression baseline, not
/// semantically meaningful constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetrievalWeights {
    pub candidate_pool: usize,
    pub limit: usize,
    pub relevance_floor: i64,
    pub keyword_bonus: i64,
    pub key_bonus: i64,
    pub min_keyword_chars: usize,
}

impl Default for RetrievalWeights {
    fn default() -> Self {
        Self::from(&MemoryConfig::default())
    }
}

impl From<&MemoryConfig> for RetrievalWeights {
    fn from(config: &MemoryConfig) -> Self {
        Self {
            candidate_pool: config.candidate_pool,
            limit: config.retrieval_limit,
            relevance_floor: config.relevance_floor,
            keyword_bonus: config.keyword_bonus,
            key_bonus: config.key_bonus,
            min_keyword_chars: config.min_keyword_chars,
        }
    }
}

/// Lowercased keywords of a fact value: whitespace-split words with
/// non-alphanumeric edges trimmed, at least `min_chars` characters long.
pub fn keywords(value: &str, min_chars: usize) -> Vec<String> {
    value
        .split_whitespace()
        .map(|word| word.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|word| word.chars().count() >= min_chars)
        .map(str::to_lowercase)
        .collect()
}

/// Relevance of one fact to an already lowercased message.
pub fn score_fact(fact: &MemoryFact, message_lower: &str, weights: &RetrievalWeights) -> i64 {
    let keyword_hits = keywords(&fact.value, weights.min_keyword_chars)
        .iter()
        .filter(|kw| message_lower.contains(kw.as_str()))
        .count() as i64;

    let key_phrase = fact.key.replace('_', " ").to_lowercase();
    let key_hit = !key_phrase.trim().is_empty() && message_lower.contains(&key_phrase);

    fact.importance
        + keyword_hits * weights.keyword_bonus
        + if key_hit { weights.key_bonus } else { 0 }
}

/// Scores, orders and filters a candidate pool. Pure.
///
/// Sorting is stable, so equal scores keep pool order.
pub fn rank(candidates: Vec<MemoryFact>, message: &str, weights: &RetrievalWeights) -> Vec<ScoredFact> {
    let message_lower = message.to_lowercase();
    let mut scored: Vec<ScoredFact> = candidates
        .into_iter()
        .map(|fact| {
            let score = score_fact(&fact, &message_lower, weights);
            ScoredFact { fact, score }
        })
        .collect();

    scored.sort_by(|a, b| b.score.cmp(&a.score));
    scored.truncate(weights.limit);
    scored.retain(|s| s.score > weights.relevance_floor);
    scored
}

/// Retrieves the facts most relevant to a message for one user.
pub struct MemoryRetriever {
    table: Arc<dyn FactTable>,
    weights: RetrievalWeights,
}

impl MemoryRetriever {
    pub fn new(table: Arc<dyn FactTable>, weights: RetrievalWeights) -> Self {
        Self { table, weights }
    }

    /// Most relevant facts first, at most the configured limit.
    ///
    /// Storage failures degrade to an empty result.
    pub async fn retrieve(&self, user_id: &str, message: &str) -> Vec<ScoredFact> {
        self.retrieve_with_limit(user_id, message, self.weights.limit).await
    }

    pub async fn retrieve_with_limit(
        &self,
        user_id: &str,
        message: &str,
        limit: usize,
    ) -> Vec<ScoredFact> {
        match self.try_retrieve(user_id, message, limit).await {
            Ok(facts) => facts,
            Err(e) => {
                warn!(user_id = %user_id, error = %e, "memory retrieval failed, continuing without memories");
                Vec::new()
            }
        }
    }

    async fn try_retrieve(
        &self,
        user_id: &str,
        message: &str,
        limit: usize,
    ) -> Result<Vec<ScoredFact>, PlounixError> {
        let now = now_timestamp();
        let mut pool = self
            .table
            .list_for_user(user_id, self.weights.candidate_pool, &now)
            .await?;
        pool.retain(|fact| !fact.is_expired(&now));
        if pool.is_empty() {
            return Ok(Vec::new());
        }

        let pool_size = pool.len();
        let weights = RetrievalWeights { limit, ..self.weights };
        let mut ranked = rank(pool, message, &weights);
        debug!(user_id = %user_id, pool_size, returned = ranked.len(), "memories ranked");

        if !ranked.is_empty() {
            let ids: Vec<String> = ranked.iter().map(|s| s.fact.id.clone()).collect();
            match self.table.touch(user_id, &ids, &now).await {
                Ok(()) => {
                    for scored in &mut ranked {
                        scored.fact.last_accessed_at = now.clone();
                    }
                }
                Err(e) => warn!(user_id = %user_id, error = %e, "failed to mark memories accessed"),
            }
        }
        Ok(ranked)
    }
}
