// SPDX-FileCopyrightText: 2026 Plounix Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Financial profile aggregation.
//!
//! Reads the profile, recent transactions, goals and challenges owned by
//! the finance collaborators and condenses them into one snapshot. Every
//! source is optional: a failing or empty source contributes nothing.

use std::collections::HashMap;
use std::sync::Arc;

use plounix_core::FinanceSource;
use plounix_core::types::{Challenge, Goal, TransactionKind};
use serde::Serialize;
use tracing::warn;

const ACTIVE: &str = "active";
const TOP_CATEGORIES: usize = 5;

/// Condensed view of a user's finances for prompt composition.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProfileSnapshot {
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub persona: Option<String>,
    pub monthly_income: Option<f64>,
    pub preferred_language: Option<String>,
    pub communication_style: Option<String>,
    /// Number of recent transactions the totals are computed over.
    pub transaction_count: usize,
    pub income_total: f64,
    pub expense_total: f64,
    /// Expense totals per category, largest first.
    pub top_spending: Vec<(String, f64)>,
    pub active_goals: Vec<Goal>,
    pub active_challenges: Vec<Challenge>,
}

impl ProfileSnapshot {
    /// Whether there is anything to report beyond name and email.
    pub fn has_profile_details(&self) -> bool {
        self.persona.is_some()
            || self.preferred_language.is_some()
            || self.communication_style.is_some()
            || self.monthly_income.is_some()
            || self.transaction_count > 0
            || !self.active_goals.is_empty()
            || !self.active_challenges.is_empty()
    }
}

/// Builds [`ProfileSnapshot`]s from a [`FinanceSource`].
pub struct ProfileAggregator {
    source: Arc<dyn FinanceSource>,
    recent_transactions: usize,
}

impl ProfileAggregator {
    pub fn new(source: Arc<dyn FinanceSource>, recent_transactions: usize) -> Self {
        Self {
            source,
            recent_transactions,
        }
    }

    /// Fetches all finance sources concurrently. Never fails.
    pub async fn snapshot(&self, user_id: &str) -> ProfileSnapshot {
        let (profile, transactions, goals, challenges) = tokio::join!(
            self.source.profile(user_id),
            self.source.transactions(user_id, self.recent_transactions),
            self.source.goals(user_id),
            self.source.challenges(user_id),
        );

        let profile = profile.unwrap_or_else(|e| {
            warn!(user_id = %user_id, error = %e, "profile unavailable");
            None
        });
        let transactions = transactions.unwrap_or_else(|e| {
            warn!(user_id = %user_id, error = %e, "transactions unavailable");
            Vec::new()
        });
        let goals = goals.unwrap_or_else(|e| {
            warn!(user_id = %user_id, error = %e, "goals unavailable");
            Vec::new()
        });
        let challenges = challenges.unwrap_or_else(|e| {
            warn!(user_id = %user_id, error = %e, "challenges unavailable");
            Vec::new()
        });

        let mut snapshot = ProfileSnapshot::default();
        if let Some(profile) = profile {
            snapshot.display_name = profile.display_name.filter(|s| !s.trim().is_empty());
            snapshot.email = profile.email.filter(|s| !s.trim().is_empty());
            snapshot.persona = profile.persona;
            snapshot.monthly_income = profile.monthly_income;
            snapshot.preferred_language = profile.preferred_language;
            snapshot.communication_style = profile.communication_style;
        }

        let mut by_category: HashMap<String, f64> = HashMap::new();
        for tx in &transactions {
            match tx.kind {
                TransactionKind::Income => snapshot.income_total += tx.amount,
                TransactionKind::Expense => {
                    snapshot.expense_total += tx.amount;
                    *by_category.entry(tx.category.clone()).or_default() += tx.amount;
                }
            }
        }
        snapshot.transaction_count = transactions.len();

        let mut top: Vec<(String, f64)> = by_category.into_iter().collect();
        top.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        top.truncate(TOP_CATEGORIES);
        snapshot.top_spending = top;

        snapshot.active_goals = goals.into_iter().filter(|g| g.status == ACTIVE).collect();
        snapshot.active_challenges = challenges
            .into_iter()
            .filter(|c| c.status == ACTIVE)
            .collect();
        snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use plounix_core::PlounixError;
    use plounix_core::types::{Transaction, UserProfile};

    #[derive(Default)]
    struct FakeFinance {
        profile: Option<UserProfile>,
        transactions: Vec<Transaction>,
        goals: Vec<Goal>,
        fail_transactions: bool,
    }

    #[async_trait]
    impl FinanceSource for FakeFinance {
        async fn profile(&self, _user_id: &str) -> Result<Option<UserProfile>, PlounixError> {
            Ok(self.profile.clone())
        }

        async fn transactions(
            &self,
            _user_id: &str,
            limit: usize,
        ) -> Result<Vec<Transaction>, PlounixError> {
            if self.fail_transactions {
                return Err(PlounixError::Internal("ledger offline".into()));
            }
            Ok(self.transactions.iter().take(limit).cloned().collect())
        }

        async fn goals(&self, _user_id: &str) -> Result<Vec<Goal>, PlounixError> {
            Ok(self.goals.clone())
        }

        async fn challenges(&self, _user_id: &str) -> Result<Vec<Challenge>, PlounixError> {
            Ok(Vec::new())
        }
    }

    fn tx(kind: TransactionKind, category: &str, amount: f64) -> Transaction {
        Transaction {
            id: format!("{category}-{amount}"),
            user_id: "u1".into(),
            kind,
            category: category.into(),
            amount,
            description: None,
            occurred_at: "2026-03-01T00:00:00.000Z".into(),
        }
    }

    fn goal(title: &str, status: &str) -> Goal {
        Goal {
            id: title.into(),
            user_id: "u1".into(),
            title: title.into(),
            target_amount: 50_000.0,
            current_amount: 12_000.0,
            status: status.into(),
            deadline: None,
        }
    }

    #[tokio::test]
    async fn empty_sources_give_empty_snapshot() {
        let aggregator = ProfileAggregator::new(Arc::new(FakeFinance::default()), 20);
        let snapshot = aggregator.snapshot("u1").await;
        assert_eq!(snapshot, ProfileSnapshot::default());
        assert!(!snapshot.has_profile_details());
    }

    #[tokio::test]
    async fn totals_and_categories() {
        let source = FakeFinance {
            transactions: vec![
                tx(TransactionKind::Income, "allowance", 5_000.0),
                tx(TransactionKind::Expense, "food", 300.0),
                tx(TransactionKind::Expense, "transport", 120.0),
                tx(TransactionKind::Expense, "food", 250.0),
            ],
            goals: vec![goal("Emergency fund", "active"), goal("Laptop", "completed")],
            ..FakeFinance::default()
        };
        let snapshot = ProfileAggregator::new(Arc::new(source), 20).snapshot("u1").await;

        assert_eq!(snapshot.transaction_count, 4);
        assert_eq!(snapshot.income_total, 5_000.0);
        assert_eq!(snapshot.expense_total, 670.0);
        assert_eq!(snapshot.top_spending[0], ("food".to_string(), 550.0));
        assert_eq!(snapshot.active_goals.len(), 1);
        assert_eq!(snapshot.active_goals[0].title, "Emergency fund");
        assert!(snapshot.has_profile_details());
    }

    #[tokio::test]
    async fn failing_source_degrades_to_empty() {
        let source = FakeFinance {
            profile: Some(UserProfile {
                user_id: "u1".into(),
                display_name: Some("Marc".into()),
                ..UserProfile::default()
            }),
            fail_transactions: true,
            ..FakeFinance::default()
        };
        let snapshot = ProfileAggregator::new(Arc::new(source), 20).snapshot("u1").await;
        assert_eq!(snapshot.display_name.as_deref(), Some("Marc"));
        assert_eq!(snapshot.transaction_count, 0);
    }

    #[tokio::test]
    async fn respects_transaction_limit() {
        let source = FakeFinance {
            transactions: (0..10)
                .map(|i| tx(TransactionKind::Expense, "food", f64::from(i)))
                .collect(),
            ..FakeFinance::default()
        };
        let snapshot = ProfileAggregator::new(Arc::new(source), 3).snapshot("u1").await;
        assert_eq!(snapshot.transaction_count, 3);
    }
}
