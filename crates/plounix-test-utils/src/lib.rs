// SPDX-FileCopyrightText: 2026 Plounix Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Plounix integration tests.
//!
//! Provides mock collaborators and test harness infrastructure for fast,
//! deterministic, CI-runnable tests without external services.
//!
//! # Components
//!
//! - [`MockOracle`] - Mock oracle with pre-configured replies and prompt capture
//! - [`FailingStorage`] - Storage double that fails every call
//! - [`TestHarness`] - Full chat pipeline over a temp SQLite database

pub mod failing_storage;
pub mod harness;
pub mod mock_oracle;

pub use failing_storage::FailingStorage;
pub use harness::{TestHarness, TestHarnessBuilder};
pub use mock_oracle::MockOracle;
