// SPDX-FileCopyrightText: 2026 Plounix Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-turn chat pipeline for the Plounix assistant.
//!
//! [`ChatPipeline::handle_message`] runs one turn end to end:
//! - Persists the user message to the durable chat log
//! - Assembles context (memory, session history, financial profile)
//! - Calls the oracle
//! - Persists the reply and appends both turns to the session buffer
//! - Extracts candidate facts from the turn and saves them, inline or on a
//!   background task
//!
//! Only oracle failures reach the caller. Every memory-side failure is
//! logged and the turn continues without it.

pub mod persister;

use std::sync::{Arc, Mutex};

use plounix_config::PlounixConfig;
use plounix_context::{ContextEngine, HistorySource, SessionRegistry, SessionTurn};
use plounix_core::types::ChatRole;
use plounix_core::{ChatLog, FactTable, FinanceSource, OracleAdapter, PlounixError};
use plounix_memory::{
    FactExtractor, MemoryRetriever, MemoryStore, RetrievalWeights, ScoredFact, build_extractor,
};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

pub use persister::ConversationPersister;

/// Result of one handled turn.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub reply: String,
    /// Facts that were placed in the prompt.
    pub facts_used: Vec<ScoredFact>,
    pub history_source: HistorySource,
    /// Facts saved from this turn; `None` when extraction was skipped or
    /// handed to a background task.
    pub facts_saved: Option<usize>,
}

/// Extraction followed by a batch save. Never fails.
struct ExtractionStage {
    extractor: Arc<dyn FactExtractor>,
    store: Arc<MemoryStore>,
}

impl ExtractionStage {
    async fn run(&self, user_id: &str, session_id: &str, message: &str, reply: &str) -> usize {
        let candidates = match self.extractor.extract(message, reply).await {
            Ok(candidates) => candidates,
            Err(e) => {
                warn!(user_id = %user_id, error = %e, "fact extraction failed");
                return 0;
            }
        };
        if candidates.is_empty() {
            return 0;
        }
        self.store
            .save_all(user_id, Some(session_id), &candidates)
            .await
    }
}

/// Coordinates persistence, context assembly, the oracle and extraction.
pub struct ChatPipeline {
    oracle: Arc<dyn OracleAdapter>,
    context: Arc<ContextEngine>,
    persister: ConversationPersister,
    store: Arc<MemoryStore>,
    extraction: Arc<ExtractionStage>,
    memory_enabled: bool,
    extract_in_background: bool,
    pending: Mutex<JoinSet<()>>,
}

impl ChatPipeline {
    /// Wires a pipeline over one storage backend that provides every
    /// collaborator table.
    pub fn new<S>(config: &PlounixConfig, storage: Arc<S>, oracle: Arc<dyn OracleAdapter>) -> Self
    where
        S: FactTable + ChatLog + FinanceSource + 'static,
    {
        let retriever = Arc::new(MemoryRetriever::new(
            storage.clone(),
            RetrievalWeights::from(&config.memory),
        ));
        let sessions = Arc::new(SessionRegistry::new(&config.session));
        let context = Arc::new(ContextEngine::new(
            config,
            retriever,
            sessions,
            storage.clone(),
            storage.clone(),
        ));
        let store = Arc::new(MemoryStore::new(storage.clone(), &config.memory));
        let extractor = build_extractor(config.memory.extraction, oracle.clone());

        Self {
            oracle,
            context,
            persister: ConversationPersister::new(storage),
            extraction: Arc::new(ExtractionStage {
                extractor,
                store: store.clone(),
            }),
            store,
            memory_enabled: config.memory.enabled,
            extract_in_background: config.memory.extract_in_background,
            pending: Mutex::new(JoinSet::new()),
        }
    }

    /// Replaces the extractor chosen by configuration.
    pub fn with_extractor(mut self, extractor: Arc<dyn FactExtractor>) -> Self {
        self.extraction = Arc::new(ExtractionStage {
            extractor,
            store: self.store.clone(),
        });
        self
    }

    pub fn store(&self) -> &Arc<MemoryStore> {
        &self.store
    }

    pub fn context(&self) -> &Arc<ContextEngine> {
        &self.context
    }

    /// Handles one user message and returns the assistant reply.
    pub async fn handle_message(
        &self,
        user_id: &str,
        session_id: &str,
        message: &str,
    ) -> Result<TurnOutcome, PlounixError> {
        if let Err(e) = self
            .persister
            .persist(user_id, session_id, ChatRole::User, message)
            .await
        {
            warn!(session_id = %session_id, error = %e, "failed to persist user message");
        }

        let assembled = self.context.assemble(user_id, session_id, message).await;

        let reply = match self.oracle.complete(&assembled.prompt).await {
            Ok(reply) => reply,
            Err(e) => {
                error!(user_id = %user_id, session_id = %session_id, error = %e, "oracle call failed");
                return Err(e);
            }
        };

        if let Err(e) = self
            .persister
            .persist(user_id, session_id, ChatRole::Assistant, &reply)
            .await
        {
            warn!(session_id = %session_id, error = %e, "failed to persist assistant reply");
        }

        let sessions = self.context.sessions();
        sessions
            .append(user_id, session_id, SessionTurn::user(message))
            .await;
        sessions
            .append(user_id, session_id, SessionTurn::assistant(reply.clone()))
            .await;

        let facts_saved = if !self.memory_enabled {
            None
        } else if self.extract_in_background {
            self.spawn_extraction(user_id, session_id, message, &reply);
            None
        } else {
            Some(
                self.extraction
                    .run(user_id, session_id, message, &reply)
                    .await,
            )
        };

        debug!(
            user_id = %user_id,
            session_id = %session_id,
            facts_used = assembled.facts.len(),
            facts_saved = ?facts_saved,
            "turn handled"
        );

        Ok(TurnOutcome {
            reply,
            facts_used: assembled.facts,
            history_source: assembled.history_source,
            facts_saved,
        })
    }

    fn spawn_extraction(&self, user_id: &str, session_id: &str, message: &str, reply: &str) {
        let stage = self.extraction.clone();
        let (user_id, session_id) = (user_id.to_string(), session_id.to_string());
        let (message, reply) = (message.to_string(), reply.to_string());
        let task = async move {
            stage.run(&user_id, &session_id, &message, &reply).await;
        };

        match self.pending.lock() {
            Ok(mut pending) => {
                // Reap finished tasks so the set stays small.
                while pending.try_join_next().is_some() {}
                pending.spawn(task);
            }
            Err(poisoned) => {
                poisoned.into_inner().spawn(task);
            }
        }
    }

    /// Waits for every background extraction started so far.
    pub async fn flush(&self) {
        let mut pending = match self.pending.lock() {
            Ok(mut guard) => std::mem::take(&mut *guard),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        };
        while let Some(result) = pending.join_next().await {
            if let Err(e) = result {
                warn!(error = %e, "background extraction task failed");
            }
        }
    }

    /// Ends a session, dropping its in-process buffer.
    pub async fn end_session(&self, user_id: &str, session_id: &str) -> bool {
        self.context.sessions().end_session(user_id, session_id).await
    }

    /// Deletes all remembered facts of a user.
    pub async fn reset_user(&self, user_id: &str) -> Result<u64, PlounixError> {
        let removed = self.store.clear_all(user_id).await?;
        info!(user_id = %user_id, removed, "user memory reset");
        Ok(removed)
    }
}
