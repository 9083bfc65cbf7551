use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use super::api::BudgetApi;
use super::models::{
    AccountsData, BudgetAccount, BudgetSummary, BudgetsData, ClearedBalance, Envelope,
    ErrorResponse, NewTransaction, SaveTransaction, UpdateAccount,
};
use crate::questrade::excerpt;
use crate::utils::http_client::join_url;
use crate::{Error, Result};

pub struct YnabClient {
    client: reqwest::Client,
    base_url: String,
    access_token: String,
    budget_id: String,
}

impl YnabClient {
    pub fn new(
        client: reqwest::Client,
        base_url: impl Into<String>,
        access_token: impl Into<String>,
        budget_id: impl Into<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            access_token: access_token.into(),
            budget_id: budget_id.into(),
        }
    }

    fn budget_url(&self, path: &str) -> Result<String> {
        if self.budget_id.is_empty() {
            return Err(Error::config("no YNAB budget id configured"));
        }
        Ok(join_url(
            &self.base_url,
            &format!("budgets/{}/{}", self.budget_id, path),
        ))
    }

    async fn send(
        &self,
        request: reqwest::RequestBuilder,
        what: &str,
        expected: StatusCode,
    ) -> Result<String> {
        let response = request.bearer_auth(&self.access_token).send().await?;
        let status = response.status();
        let body = response.text().await?;
        debug!(what, status = status.as_u16(), bytes = body.len(), "YNAB response");

        if status == StatusCode::UNAUTHORIZED {
            return Err(Error::auth(format!("YNAB {what}: {}", error_detail(&body))));
        }
        if status != expected {
            return Err(Error::remote(
                status.as_u16(),
                format!("YNAB {what}: {}", error_detail(&body)),
            ));
        }
        Ok(body)
    }

    async fn get<T: DeserializeOwned>(&self, url: String, what: &str) -> Result<T> {
        let body = self.send(self.client.get(url), what, StatusCode::OK).await?;
        let envelope: Envelope<T> =
            serde_json::from_str(&body).map_err(|e| Error::Decode(format!("YNAB {what}: {e}")))?;
        Ok(envelope.data)
    }
}

fn error_detail(body: &str) -> String {
    match serde_json::from_str::<ErrorResponse>(body) {
        Ok(ErrorResponse { error }) if !error.name.is_empty() || !error.detail.is_empty() => {
            format!("{} - {} (id {})", error.name, error.detail, error.id)
        }
        _ => excerpt(body),
    }
}

#[async_trait]
impl BudgetApi for YnabClient {
    #[instrument(skip(self))]
    async fn list_accounts(&self) -> Result<Vec<BudgetAccount>> {
        let data: AccountsData = self.get(self.budget_url("accounts")?, "list accounts").await?;
        Ok(data
            .accounts
            .into_iter()
            .filter(|account| !account.deleted)
            .collect())
    }

    #[instrument(skip(self))]
    async fn update_account_balance(&self, account_id: &str, cleared_minor: i64) -> Result<()> {
        let url = self.budget_url(&format!("accounts/{account_id}"))?;
        let payload = UpdateAccount {
            account: ClearedBalance {
                cleared: cleared_minor,
            },
        };
        self.send(
            self.client.put(url).json(&payload),
            "update account",
            StatusCode::OK,
        )
        .await?;
        Ok(())
    }

    #[instrument(skip_all, fields(account_id = %transaction.account_id, amount = transaction.amount))]
    async fn create_transaction(&self, transaction: &NewTransaction) -> Result<()> {
        let url = self.budget_url("transactions")?;
        self.send(
            self.client.post(url).json(&SaveTransaction { transaction }),
            "create transaction",
            StatusCode::CREATED,
        )
        .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn list_budgets(&self) -> Result<Vec<BudgetSummary>> {
        let url = join_url(&self.base_url, "budgets");
        let data: BudgetsData = self.get(url, "list budgets").await?;
        Ok(data.budgets)
    }
}
