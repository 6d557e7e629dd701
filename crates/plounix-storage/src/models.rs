// SPDX-FileCopyrightText: 2026 Plounix Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain model types for storage entities.
//!
//! The canonical types are defined in `plounix-core::types` for use across
//! collaborator trait boundaries. This module re-exports them for convenience
//! within the storage crate.

pub use plounix_core::types::{
    ChatMessage, ChatRole, Challenge, Goal, MemoryFact, Transaction, TransactionKind, UserProfile,
};
