// SPDX-FileCopyrightText: 2026 Plounix Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Long-term memory system for the Plounix assistant.
//!
//! ## Architecture
//!
//! - **FactExtractor**: turns one turn into candidate facts, either with
//!   [`RuleBasedExtractor`] (ordered lexical rules) or [`OracleExtractor`]
//!   (validated JSON from the oracle)
//! - **MemoryStore**: validated writes with per-type overwrite/accumulate semantics
//! - **MemoryRetriever**: importance + keyword scoring over a bounded pool
//! - **Types**: CandidateFact, ExtractedFact, ScoredFact

pub mod extractor;
pub mod retriever;
pub mod store;
pub mod types;

use std::sync::Arc;

use plounix_config::ExtractionStrategy;
use plounix_core::OracleAdapter;

pub use extractor::{
    ExtractionRule, FactExtractor, OracleExtractor, RuleBasedExtractor, Turn, default_rules,
};
pub use retriever::{MemoryRetriever, RetrievalWeights};
pub use store::MemoryStore;
pub use types::{CandidateFact, ExtractedFact, ScoredFact};

/// The extractor selected by `memory.extraction`.
pub fn build_extractor(
    strategy: ExtractionStrategy,
    oracle: Arc<dyn OracleAdapter>,
) -> Arc<dyn FactExtractor> {
    match strategy {
        ExtractionStrategy::Rules => Arc::new(RuleBasedExtractor::default()),
        ExtractionStrategy::Oracle => Arc::new(OracleExtractor::new(oracle)),
    }
}
