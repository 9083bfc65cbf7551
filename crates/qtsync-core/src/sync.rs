//! Plan preparation and application.

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{error, info, instrument, warn};

use crate::Result;
use crate::accounts::{AccountFetcher, SourceAccount};
use crate::config::AppConfig;
use crate::reconcile::{AccountMapping, PlanEntry, ReconciliationPlan, SyncMode};
use crate::ynab::{BudgetAccount, BudgetApi, ClearedStatus, NewTransaction};

/// Both account sides plus the plan computed from them.
#[derive(Debug, Clone)]
pub struct PreparedSync {
    pub sources: Vec<SourceAccount>,
    pub destinations: Vec<BudgetAccount>,
    pub plan: ReconciliationPlan,
}

/// Fetch both sides concurrently and compute the plan for `mode`.
#[instrument(skip_all, fields(mode = %mode, mappings = mapping.len()))]
pub async fn prepare(
    fetcher: &AccountFetcher,
    budget: &dyn BudgetApi,
    mapping: &AccountMapping,
    mode: SyncMode,
) -> Result<PreparedSync> {
    let (sources, destinations) =
        futures::try_join!(fetcher.fetch_accounts(), budget.list_accounts())?;

    let plan = ReconciliationPlan::compute(&sources, &destinations, mapping).for_mode(mode);
    info!(
        entries = plan.entries.len(),
        skipped = plan.skipped.len(),
        "Computed reconciliation plan"
    );

    Ok(PreparedSync {
        sources,
        destinations,
        plan,
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncFailure {
    pub destination_id: String,
    pub message: String,
}

/// Outcome of applying a plan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub applied: usize,
    pub failed: usize,
    pub skipped: usize,
    pub failures: Vec<SyncFailure>,
}

impl SyncReport {
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }
}

/// Writes plan entries to the budget, one at a time.
pub struct SyncExecutor {
    budget: Arc<dyn BudgetApi>,
    payee: String,
    memo: String,
}

impl SyncExecutor {
    pub fn new(budget: Arc<dyn BudgetApi>, config: &AppConfig) -> Self {
        Self {
            budget,
            payee: config.transaction_payee.clone(),
            memo: config.transaction_memo.clone(),
        }
    }

    /// Apply every entry sequentially. A failing entry is recorded and the
    /// batch continues.
    #[instrument(skip(self, plan), fields(entries = plan.entries.len()))]
    pub async fn apply(&self, plan: &ReconciliationPlan, mode: SyncMode, date: NaiveDate) -> SyncReport {
        let mut report = SyncReport {
            skipped: plan.skipped.len(),
            ..SyncReport::default()
        };

        for entry in &plan.entries {
            if mode == SyncMode::Transaction && entry.is_zero() {
                report.skipped += 1;
                continue;
            }

            match self.apply_entry(entry, mode, date).await {
                Ok(()) => {
                    report.applied += 1;
                    info!(
                        source = %entry.source_id,
                        destination = %entry.destination_id,
                        delta_minor = entry.delta_minor,
                        "Applied balance update"
                    );
                }
                Err(e) => {
                    report.failed += 1;
                    error!(
                        source = %entry.source_id,
                        destination = %entry.destination_id,
                        error = %e,
                        "Failed to apply balance update"
                    );
                    report.failures.push(SyncFailure {
                        destination_id: entry.destination_id.clone(),
                        message: e.to_string(),
                    });
                }
            }
        }

        if report.failed > 0 {
            warn!(failed = report.failed, applied = report.applied, "Sync finished with failures");
        } else {
            info!(applied = report.applied, skipped = report.skipped, "Sync finished");
        }
        report
    }

    async fn apply_entry(&self, entry: &PlanEntry, mode: SyncMode, date: NaiveDate) -> Result<()> {
        match mode {
            SyncMode::Balance => {
                self.budget
                    .update_account_balance(&entry.destination_id, entry.new_minor)
                    .await
            }
            SyncMode::Transaction => {
                let transaction = NewTransaction {
                    account_id: entry.destination_id.clone(),
                    date,
                    amount: entry.delta_minor,
                    payee_name: self.payee.clone(),
                    memo: (!self.memo.is_empty()).then(|| self.memo.clone()),
                    cleared: ClearedStatus::Cleared,
                    approved: true,
                };
                self.budget.create_transaction(&transaction).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use mockall::predicate::eq;

    use super::*;
    use crate::Error;
    use crate::reconcile::{SkipReason, SkippedEntry};
    use crate::ynab::MockBudgetApi;

    fn entry(dest: &str, current: i64, new: i64) -> PlanEntry {
        PlanEntry {
            source_id: format!("src-{dest}"),
            source_kind: "TFSA".to_string(),
            destination_id: dest.to_string(),
            destination_name: dest.to_string(),
            current_minor: current,
            new_minor: new,
            delta_minor: new - current,
        }
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()
    }

    #[tokio::test]
    async fn balance_mode_writes_absolute_balances() {
        let mut budget = MockBudgetApi::new();
        budget
            .expect_update_account_balance()
            .with(eq("D1"), eq(1_000_000))
            .times(1)
            .returning(|_, _| Ok(()));
        budget
            .expect_update_account_balance()
            .with(eq("D2"), eq(500_000))
            .times(1)
            .returning(|_, _| Ok(()));
        budget.expect_create_transaction().never();

        let plan = ReconciliationPlan {
            entries: vec![entry("D1", 950_000, 1_000_000), entry("D2", 500_000, 500_000)],
            skipped: Vec::new(),
        };

        let report = SyncExecutor::new(Arc::new(budget), &AppConfig::default())
            .apply(&plan, SyncMode::Balance, date())
            .await;
        assert_eq!(report.applied, 2);
        assert!(report.is_success());
    }

    #[tokio::test]
    async fn transaction_mode_posts_delta_with_configured_payee() {
        let mut budget = MockBudgetApi::new();
        budget
            .expect_create_transaction()
            .withf(|tx| {
                tx.account_id == "D1"
                    && tx.amount == 50_000
                    && tx.payee_name == "Stock Market"
                    && tx.memo.as_deref() == Some("Questrade sync")
                    && tx.cleared == ClearedStatus::Cleared
                    && tx.approved
                    && tx.date == NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()
            })
            .times(1)
            .returning(|_| Ok(()));

        let plan = ReconciliationPlan {
            entries: vec![entry("D1", 950_000, 1_000_000), entry("D2", 10, 10)],
            skipped: vec![SkippedEntry {
                source_id: "X".to_string(),
                destination_id: "Y".to_string(),
                reason: SkipReason::UnknownSource,
            }],
        };

        let report = SyncExecutor::new(Arc::new(budget), &AppConfig::default())
            .apply(&plan, SyncMode::Transaction, date())
            .await;
        assert_eq!(report.applied, 1);
        assert_eq!(report.skipped, 2);
    }

    #[tokio::test]
    async fn failing_entry_does_not_abort_batch() {
        let mut budget = MockBudgetApi::new();
        budget
            .expect_update_account_balance()
            .with(eq("D1"), eq(1))
            .returning(|_, _| Err(Error::remote(429, "rate limited")));
        budget
            .expect_update_account_balance()
            .with(eq("D2"), eq(2))
            .times(1)
            .returning(|_, _| Ok(()));

        let plan = ReconciliationPlan {
            entries: vec![entry("D1", 0, 1), entry("D2", 0, 2)],
            skipped: Vec::new(),
        };

        let report = SyncExecutor::new(Arc::new(budget), &AppConfig::default())
            .apply(&plan, SyncMode::Balance, date())
            .await;
        assert_eq!(report.applied, 1);
        assert_eq!(report.failed, 1);
        assert_eq!(report.failures[0].destination_id, "D1");
        assert!(!report.is_success());
    }
}
