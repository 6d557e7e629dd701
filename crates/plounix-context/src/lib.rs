// SPDX-FileCopyrightText: 2026 Plounix Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Context engine for Plounix prompt assembly.
//!
//! Gathers three sources for every chat turn:
//! - **Memory**: cross-session facts ranked by the retriever
//! - **Session**: the recent turns of the current conversation, falling back
//!   to the durable chat log after a restart
//! - **Profile**: a snapshot of the user's finances
//!
//! and hands them to the pure [`PromptComposer`]. Every source degrades to
//! empty on failure, so assembly itself never fails.

pub mod composer;
pub mod profile;
pub mod session;

use std::sync::Arc;

use plounix_config::{ContextConfig, PlounixConfig};
use plounix_core::ChatLog;
use plounix_core::FinanceSource;
use plounix_core::types::ChatRole;
use plounix_memory::{MemoryRetriever, ScoredFact};
use serde::Serialize;
use tracing::{debug, warn};

pub use composer::{PromptComposer, format_peso};
pub use profile::{ProfileAggregator, ProfileSnapshot};
pub use session::{SessionHistory, SessionRegistry, SessionTurn};

/// Where the recent-conversation section came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HistorySource {
    /// The in-process session buffer.
    Session,
    /// The durable chat log, used when the buffer was empty.
    ChatLog,
    /// No prior turns were found.
    Empty,
}

/// Result of context assembly.
#[derive(Debug, Clone)]
pub struct AssembledContext {
    /// The prompt ready to send to the oracle.
    pub prompt: String,
    /// Facts included in the remembered section, most relevant first.
    pub facts: Vec<ScoredFact>,
    pub history_source: HistorySource,
    pub profile: ProfileSnapshot,
}

/// Orchestrates memory retrieval, session history and profile aggregation.
pub struct ContextEngine {
    retriever: Arc<MemoryRetriever>,
    sessions: Arc<SessionRegistry>,
    chat_log: Arc<dyn ChatLog>,
    profiles: ProfileAggregator,
    composer: PromptComposer,
    config: ContextConfig,
    memory_enabled: bool,
}

impl ContextEngine {
    pub fn new(
        config: &PlounixConfig,
        retriever: Arc<MemoryRetriever>,
        sessions: Arc<SessionRegistry>,
        chat_log: Arc<dyn ChatLog>,
        finance: Arc<dyn FinanceSource>,
    ) -> Self {
        Self {
            retriever,
            sessions,
            chat_log,
            profiles: ProfileAggregator::new(finance, config.context.recent_transactions),
            composer: PromptComposer::new(
                config.agent.assistant_name.clone(),
                config.context.max_turn_chars,
            ),
            config: config.context.clone(),
            memory_enabled: config.memory.enabled,
        }
    }

    pub fn sessions(&self) -> &Arc<SessionRegistry> {
        &self.sessions
    }

    /// Assembles the prompt for one incoming message.
    ///
    /// The message itself must not yet be in the session buffer; if it was
    /// already written to the durable log it is skipped there.
    pub async fn assemble(
        &self,
        user_id: &str,
        session_id: &str,
        message: &str,
    ) -> AssembledContext {
        let facts_fut = async {
            if self.memory_enabled {
                self.retriever.retrieve(user_id, message).await
            } else {
                Vec::new()
            }
        };
        let (facts, (history, history_source), profile) = tokio::join!(
            facts_fut,
            self.history(user_id, session_id, message),
            self.profiles.snapshot(user_id),
        );

        let prompt = self
            .composer
            .compose(user_id, message, &facts, &history, Some(&profile));
        debug!(
            user_id = %user_id,
            session_id = %session_id,
            facts = facts.len(),
            turns = history.len(),
            history_source = ?history_source,
            "context assembled"
        );

        AssembledContext {
            prompt,
            facts,
            history_source,
            profile,
        }
    }

    async fn history(
        &self,
        user_id: &str,
        session_id: &str,
        message: &str,
    ) -> (Vec<SessionTurn>, HistorySource) {
        let window = self.config.session_window;
        let turns = self.sessions.window(user_id, session_id, window).await;
        if !turns.is_empty() {
            return (turns, HistorySource::Session);
        }
        if !self.config.durable_fallback {
            return (Vec::new(), HistorySource::Empty);
        }

        let logged = match self.chat_log.recent(user_id, session_id, window + 1).await {
            Ok(messages) => messages,
            Err(e) => {
                warn!(session_id = %session_id, error = %e, "chat log unavailable");
                return (Vec::new(), HistorySource::Empty);
            }
        };

        let mut turns: Vec<SessionTurn> = logged
            .into_iter()
            .map(|m| SessionTurn {
                role: m.role,
                content: m.content,
            })
            .collect();
        if turns
            .last()
            .is_some_and(|t| t.role == ChatRole::User && t.content == message)
        {
            turns.pop();
        }
        let skip = turns.len().saturating_sub(window);
        turns.drain(..skip);

        if turns.is_empty() {
            (turns, HistorySource::Empty)
        } else {
            (turns, HistorySource::ChatLog)
        }
    }
}
