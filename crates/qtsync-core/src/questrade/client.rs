//! Authenticated Questrade data calls.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use super::auth::excerpt;
use super::models::{Account, AccountBalances, AccountsResponse, ApiError};
use crate::accounts::BrokerageApi;
use crate::credentials::TokenStore;
use crate::utils::http_client::join_url;
use crate::{Error, Result};

/// Data client bound to one access token and API server.
pub struct QuestradeClient {
    client: reqwest::Client,
    access_token: String,
    api_server: String,
}

impl QuestradeClient {
    pub fn new(client: reqwest::Client, tokens: &TokenStore) -> Self {
        Self {
            client,
            access_token: tokens.access_token().to_string(),
            api_server: tokens.api_server().to_string(),
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = join_url(&self.api_server, path);
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.access_token)
            .send()
            .await?;
        decode_response(response, path).await
    }
}

/// Map a data-call response: 401 is an auth error, other non-2xx is a
/// remote error, and an undecodable 2xx body is a decode error.
async fn decode_response<T: DeserializeOwned>(response: reqwest::Response, what: &str) -> Result<T> {
    let status = response.status();
    let body = response.text().await?;
    debug!(what, status = status.as_u16(), bytes = body.len(), "Questrade response");

    if status == StatusCode::UNAUTHORIZED {
        return Err(Error::auth(format!("{what}: {}", error_detail(&body))));
    }
    if !status.is_success() {
        return Err(Error::remote(status.as_u16(), format!("{what}: {}", error_detail(&body))));
    }

    serde_json::from_str(&body).map_err(|e| Error::Decode(format!("{what}: {e}")))
}

fn error_detail(body: &str) -> String {
    match serde_json::from_str::<ApiError>(body) {
        Ok(ApiError {
            code: Some(code),
            message: Some(message),
        }) => format!("{message} (code {code})"),
        Ok(ApiError {
            message: Some(message),
            ..
        }) => message,
        _ => excerpt(body),
    }
}

#[async_trait]
impl BrokerageApi for QuestradeClient {
    #[instrument(skip(self))]
    async fn list_accounts(&self) -> Result<Vec<Account>> {
        let response: AccountsResponse = self.get("v1/accounts").await?;
        Ok(response.accounts)
    }

    #[instrument(skip(self))]
    async fn account_balances(&self, account_id: &str) -> Result<AccountBalances> {
        self.get(&format!("v1/accounts/{account_id}/balances")).await
    }
}
