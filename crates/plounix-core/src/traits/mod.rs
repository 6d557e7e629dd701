// SPDX-FileCopyrightText: 2026 Plounix Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter and collaborator trait definitions.
//!
//! All traits use `#[async_trait]` for dynamic dispatch compatibility.

pub mod adapter;
pub mod oracle;
pub mod storage;

pub use adapter::PluginAdapter;
pub use oracle::OracleAdapter;
pub use storage::{ChatLog, FactTable, FinanceSource, StorageAdapter};
