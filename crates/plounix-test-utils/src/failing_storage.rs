// SPDX-FileCopyrightText: 2026 Plounix Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage double whose every call fails, for outage tests.

use async_trait::async_trait;

use plounix_core::types::{
    AdapterType, ChatMessage, Challenge, Goal, HealthStatus, MemoryFact, Transaction, UserProfile,
};
use plounix_core::{
    ChatLog, FactTable, FinanceSource, PlounixError, PluginAdapter, StorageAdapter,
};

fn unavailable() -> PlounixError {
    PlounixError::storage(std::io::Error::other("storage unavailable"))
}

/// Implements every collaborator trait and fails every call.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingStorage;

#[async_trait]
impl PluginAdapter for FailingStorage {
    fn name(&self) -> &str {
        "failing-storage"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, PlounixError> {
        Ok(HealthStatus::Unhealthy("storage unavailable".to_string()))
    }

    async fn shutdown(&self) -> Result<(), PlounixError> {
        Ok(())
    }
}

#[async_trait]
impl StorageAdapter for FailingStorage {
    async fn initialize(&self) -> Result<(), PlounixError> {
        Err(unavailable())
    }

    async fn close(&self) -> Result<(), PlounixError> {
        Ok(())
    }
}

#[async_trait]
impl FactTable for FailingStorage {
    async fn find_by_key(&self, _: &str, _: &str) -> Result<Option<MemoryFact>, PlounixError> {
        Err(unavailable())
    }

    async fn insert(&self, _: &MemoryFact) -> Result<(), PlounixError> {
        Err(unavailable())
    }

    async fn update_by_id(&self, _: &MemoryFact) -> Result<(), PlounixError> {
        Err(unavailable())
    }

    async fn upsert(&self, _: &MemoryFact) -> Result<MemoryFact, PlounixError> {
        Err(unavailable())
    }

    async fn list_for_user(
        &self,
        _: &str,
        _: usize,
        _: &str,
    ) -> Result<Vec<MemoryFact>, PlounixError> {
        Err(unavailable())
    }

    async fn touch(&self, _: &str, _: &[String], _: &str) -> Result<(), PlounixError> {
        Err(unavailable())
    }

    async fn delete_all_for_user(&self, _: &str) -> Result<u64, PlounixError> {
        Err(unavailable())
    }

    async fn delete_expired(&self, _: &str) -> Result<u64, PlounixError> {
        Err(unavailable())
    }
}

#[async_trait]
impl ChatLog for FailingStorage {
    async fn append(&self, _: &ChatMessage) -> Result<(), PlounixError> {
        Err(unavailable())
    }

    async fn recent(&self, _: &str, _: &str, _: usize) -> Result<Vec<ChatMessage>, PlounixError> {
        Err(unavailable())
    }
}

#[async_trait]
impl FinanceSource for FailingStorage {
    async fn profile(&self, _: &str) -> Result<Option<UserProfile>, PlounixError> {
        Err(unavailable())
    }

    async fn transactions(&self, _: &str, _: usize) -> Result<Vec<Transaction>, PlounixError> {
        Err(unavailable())
    }

    async fn goals(&self, _: &str) -> Result<Vec<Goal>, PlounixError> {
        Err(unavailable())
    }

    async fn challenges(&self, _: &str) -> Result<Vec<Challenge>, PlounixError> {
        Err(unavailable())
    }
}
