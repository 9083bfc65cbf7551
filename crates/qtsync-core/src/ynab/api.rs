use async_trait::async_trait;

use super::models::{BudgetAccount, BudgetSummary, NewTransaction};
use crate::Result;

/// Budget ledger calls used by planning and sync.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BudgetApi: Send + Sync {
    /// Open and closed accounts of the configured budget; deleted ones are
    /// filtered out.
    async fn list_accounts(&self) -> Result<Vec<BudgetAccount>>;

    /// Overwrite the cleared balance of an account.
    async fn update_account_balance(&self, account_id: &str, cleared_minor: i64) -> Result<()>;

    async fn create_transaction(&self, transaction: &NewTransaction) -> Result<()>;

    async fn list_budgets(&self) -> Result<Vec<BudgetSummary>>;
}
