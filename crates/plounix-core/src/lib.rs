// SPDX-FileCopyrightText: 2026 Plounix Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Plounix memory engine.
//!
//! This crate provides the error type, the domain rows shared by every other
//! crate (memory facts, chat messages, finance rows), and the collaborator
//! traits that storage backends and oracles implement.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::PlounixError;
pub use types::{AdapterType, HealthStatus, MemoryFact, MemoryType, WriteMode};

pub use traits::{
    ChatLog, FactTable, FinanceSource, OracleAdapter, PluginAdapter, StorageAdapter,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plounix_error_variants_render() {
        let storage = PlounixError::storage(std::io::Error::other("disk full"));
        assert_eq!(storage.to_string(), "storage error: disk full");

        let not_found = PlounixError::NotFound {
            entity: "memory fact".into(),
            key: "monthly_income".into(),
        };
        assert_eq!(not_found.to_string(), "memory fact not found: monthly_income");

        let invalid = PlounixError::InvalidCandidate("empty key".into());
        assert!(invalid.to_string().contains("empty key"));

        let _oracle = PlounixError::Oracle {
            message: "test".into(),
            source: None,
        };
        let _config = PlounixError::Config("test".into());
        let _internal = PlounixError::Internal("test".into());
    }

    #[test]
    fn adapter_type_round_trip() {
        use std::str::FromStr;

        for variant in [AdapterType::Storage, AdapterType::Oracle] {
            let s = variant.to_string();
            let parsed = AdapterType::from_str(&s).expect("should parse back");
            assert_eq!(variant, parsed);
        }
    }

    #[test]
    fn health_status_variants() {
        let healthy = HealthStatus::Healthy;
        assert_ne!(HealthStatus::Degraded("slow".into()), healthy);
        assert_ne!(HealthStatus::Unhealthy("down".into()), healthy);
    }

    #[test]
    fn all_traits_are_exported() {
        fn _assert_storage_adapter<T: StorageAdapter>() {}
        fn _assert_oracle_adapter<T: OracleAdapter>() {}
        fn _assert_fact_table<T: FactTable>() {}
        fn _assert_chat_log<T: ChatLog>() {}
        fn _assert_finance_source<T: FinanceSource>() {}
    }
}
