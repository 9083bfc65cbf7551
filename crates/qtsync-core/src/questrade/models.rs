//! Questrade wire types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// `POST /oauth2/token` response.
///
/// Every field is optional on the wire; required ones are checked by the
/// auth endpoint so a missing value is reported, never defaulted.
#[derive(Default, Deserialize)]
pub struct TokenResponse {
    pub access_token: Option<String>,
    pub token_type: Option<String>,
    pub expires_in: Option<i64>,
    pub refresh_token: Option<String>,
    pub api_server: Option<String>,
}

/// One brokerage account from `GET v1/accounts`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    #[serde(rename = "type", default)]
    pub kind: String,
    pub number: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub is_primary: bool,
    #[serde(default)]
    pub is_billing: bool,
    #[serde(default)]
    pub client_account_type: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountsResponse {
    pub accounts: Vec<Account>,
    #[serde(default)]
    pub user_id: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerCurrencyBalance {
    #[serde(default)]
    pub currency: String,
    #[serde(default)]
    pub cash: Decimal,
    #[serde(default)]
    pub market_value: Decimal,
    pub total_equity: Decimal,
    #[serde(default)]
    pub buying_power: Decimal,
    #[serde(default)]
    pub maintenance_excess: Decimal,
    #[serde(default)]
    pub is_real_time: bool,
}

/// `GET v1/accounts/{id}/balances` response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountBalances {
    #[serde(default)]
    pub per_currency_balances: Vec<PerCurrencyBalance>,
    #[serde(default)]
    pub combined_balances: Vec<PerCurrencyBalance>,
}

impl AccountBalances {
    /// Total equity of the first combined balance, the authoritative one.
    pub fn total_equity(&self) -> Option<Decimal> {
        self.combined_balances.first().map(|b| b.total_equity)
    }
}

/// Error body, e.g. `{"code":1017,"message":"Access token is invalid"}`.
#[derive(Debug, Default, Deserialize)]
pub struct ApiError {
    pub code: Option<i64>,
    pub message: Option<String>,
}
