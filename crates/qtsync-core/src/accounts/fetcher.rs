use std::sync::Arc;

use async_trait::async_trait;
use futures::StreamExt;
use rust_decimal::Decimal;
use tracing::{debug, info, instrument, warn};

use crate::Result;
use crate::questrade::{Account, AccountBalances};

/// Brokerage data calls needed to build the source account list.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BrokerageApi: Send + Sync {
    async fn list_accounts(&self) -> Result<Vec<Account>>;

    async fn account_balances(&self, account_id: &str) -> Result<AccountBalances>;
}

/// A brokerage account with its balances, if they could be fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceAccount {
    pub account: Account,
    pub balances: Option<AccountBalances>,
}

impl SourceAccount {
    pub fn new(account: Account, balances: Option<AccountBalances>) -> Self {
        Self { account, balances }
    }

    #[inline]
    pub fn id(&self) -> &str {
        &self.account.number
    }

    #[inline]
    pub fn kind(&self) -> &str {
        &self.account.kind
    }

    /// Major-unit equity from the first combined balance; `None` when the
    /// balance fetch failed or returned no combined entry.
    pub fn total_equity(&self) -> Option<Decimal> {
        self.balances.as_ref()?.total_equity()
    }
}

/// Lists source accounts and populates their balances concurrently.
pub struct AccountFetcher {
    api: Arc<dyn BrokerageApi>,
    concurrency: usize,
}

impl AccountFetcher {
    pub fn new(api: Arc<dyn BrokerageApi>, concurrency: usize) -> Self {
        Self {
            api,
            concurrency: concurrency.max(1),
        }
    }

    /// Fetch every account, in listing order.
    ///
    /// A failing listing call is returned as the error. A failing balance
    /// call only leaves that account's balance unset.
    #[instrument(skip(self), fields(concurrency = self.concurrency))]
    pub async fn fetch_accounts(&self) -> Result<Vec<SourceAccount>> {
        let accounts = self.api.list_accounts().await?;
        debug!(count = accounts.len(), "Listed brokerage accounts");

        // One slot per listed account; each task writes only its own index.
        let mut slots: Vec<Option<AccountBalances>> = vec![None; accounts.len()];

        let mut results = futures::stream::iter(accounts.iter().enumerate())
            .map(|(idx, account)| {
                let api = Arc::clone(&self.api);
                async move { (idx, api.account_balances(&account.number).await) }
            })
            .buffer_unordered(self.concurrency);

        let mut failed = 0usize;
        while let Some((idx, result)) = results.next().await {
            match result {
                Ok(balances) => slots[idx] = Some(balances),
                Err(e) => {
                    failed += 1;
                    warn!(
                        account = %accounts[idx].number,
                        error = %e,
                        "Failed to fetch account balances, leaving balance unset"
                    );
                }
            }
        }
        drop(results);

        info!(
            accounts = accounts.len(),
            failed, "Fetched brokerage account balances"
        );

        Ok(accounts
            .into_iter()
            .zip(slots)
            .map(|(account, balances)| SourceAccount::new(account, balances))
            .collect())
    }
}
