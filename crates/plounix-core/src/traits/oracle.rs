// SPDX-FileCopyrightText: 2026 Plounix Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Oracle adapter trait for the language-model completion service.

use async_trait::async_trait;

use crate::error::PlounixError;
use crate::traits::adapter::PluginAdapter;

/// Opaque text-completion oracle.
///
/// The memory engine hands it one composed prompt and receives one string.
/// Latency, retries and streaming are properties of the implementation.
#[async_trait]
pub trait OracleAdapter: PluginAdapter {
    /// Completes the given prompt and returns the full response text.
    async fn complete(&self, prompt: &str) -> Result<String, PlounixError>;
}
