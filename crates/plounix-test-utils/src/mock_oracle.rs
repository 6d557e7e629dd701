// SPDX-FileCopyrightText: 2026 Plounix Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock oracle adapter for deterministic testing.
//!
//! `MockOracle` implements `OracleAdapter` with pre-configured replies and
//! records every prompt it receives.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use plounix_core::types::{AdapterType, HealthStatus};
use plounix_core::{OracleAdapter, PlounixError, PluginAdapter};

/// Reply returned once the queue is exhausted.
pub const DEFAULT_REPLY: &str = "mock reply";

/// A mock oracle that returns pre-configured replies.
///
/// Replies are popped from a FIFO queue. When the queue is empty,
/// [`DEFAULT_REPLY`] is returned.
pub struct MockOracle {
    replies: Arc<Mutex<VecDeque<String>>>,
    prompts: Arc<Mutex<Vec<String>>>,
    fail: bool,
}

impl MockOracle {
    /// Create a mock oracle with an empty reply queue.
    pub fn new() -> Self {
        Self {
            replies: Arc::new(Mutex::new(VecDeque::new())),
            prompts: Arc::new(Mutex::new(Vec::new())),
            fail: false,
        }
    }

    /// Create a mock oracle pre-loaded with the given replies.
    pub fn with_replies<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let oracle = Self::new();
        Self {
            replies: Arc::new(Mutex::new(replies.into_iter().map(Into::into).collect())),
            ..oracle
        }
    }

    /// Create a mock oracle whose every call fails.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }

    /// Add a reply to the end of the queue.
    pub async fn add_reply(&self, text: impl Into<String>) {
        self.replies.lock().await.push_back(text.into());
    }

    /// Every prompt received so far, in call order.
    pub async fn prompts(&self) -> Vec<String> {
        self.prompts.lock().await.clone()
    }

    pub async fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().await.last().cloned()
    }
}

impl Default for MockOracle {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockOracle {
    fn name(&self) -> &str {
        "mock-oracle"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Oracle
    }

    async fn health_check(&self) -> Result<HealthStatus, PlounixError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), PlounixError> {
        Ok(())
    }
}

#[async_trait]
impl OracleAdapter for MockOracle {
    async fn complete(&self, prompt: &str) -> Result<String, PlounixError> {
        self.prompts.lock().await.push(prompt.to_string());
        if self.fail {
            return Err(PlounixError::Oracle {
                message: "mock oracle configured to fail".to_string(),
                source: None,
            });
        }
        Ok(self
            .replies
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| DEFAULT_REPLY.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn default_reply_when_queue_empty() {
        let oracle = MockOracle::new();
        assert_eq!(oracle.complete("hi").await.unwrap(), DEFAULT_REPLY);
    }

    #[tokio::test]
    async fn queued_replies_returned_in_order() {
        let oracle = MockOracle::with_replies(["first", "second"]);
        oracle.add_reply("third").await;
        assert_eq!(oracle.complete("a").await.unwrap(), "first");
        assert_eq!(oracle.complete("b").await.unwrap(), "second");
        assert_eq!(oracle.complete("c").await.unwrap(), "third");
        assert_eq!(oracle.prompts().await, vec!["a", "b", "c"]);
        assert_eq!(oracle.last_prompt().await.as_deref(), Some("c"));
    }

    #[tokio::test]
    async fn failing_oracle_still_records_prompt() {
        let oracle = MockOracle::failing();
        assert!(matches!(
            oracle.complete("boom").await,
            Err(PlounixError::Oracle { .. })
        ));
        assert_eq!(oracle.prompts().await.len(), 1);
    }
}
