//! YNAB wire types. Amounts are integer milliunits.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::reconcile::money;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetAccount {
    pub id: String,
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    /// Working balance in milliunits.
    pub balance: i64,
    #[serde(default)]
    pub cleared_balance: i64,
    #[serde(default)]
    pub uncleared_balance: i64,
    #[serde(default)]
    pub closed: bool,
    #[serde(default)]
    pub deleted: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl BudgetAccount {
    /// Balance in major units.
    pub fn balance_major(&self) -> Decimal {
        money::from_minor(self.balance)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetSummary {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ClearedStatus {
    Cleared,
    Uncleared,
    Reconciled,
}

/// Transaction to create.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewTransaction {
    pub account_id: String,
    pub date: NaiveDate,
    /// Milliunits; positive is an inflow.
    pub amount: i64,
    pub payee_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
    pub cleared: ClearedStatus,
    pub approved: bool,
}

#[derive(Deserialize)]
pub(crate) struct Envelope<T> {
    pub data: T,
}

#[derive(Deserialize)]
pub(crate) struct AccountsData {
    pub accounts: Vec<BudgetAccount>,
}

#[derive(Deserialize)]
pub(crate) struct BudgetsData {
    pub budgets: Vec<BudgetSummary>,
}

#[derive(Serialize)]
pub(crate) struct SaveTransaction<'a> {
    pub transaction: &'a NewTransaction,
}

#[derive(Serialize)]
pub(crate) struct UpdateAccount {
    pub account: ClearedBalance,
}

#[derive(Serialize)]
pub(crate) struct ClearedBalance {
    pub cleared: i64,
}

/// `{"error":{"id":"401","name":"unauthorized","detail":"..."}}`
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ErrorDetail {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub detail: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transaction_serializes_in_wire_shape() {
        let tx = NewTransaction {
            account_id: "acc-1".to_string(),
            date: NaiveDate::from_ymd_opt(2026, 1, 5).unwrap(),
            amount: -12_340,
            payee_name: "Stock Market".to_string(),
            memo: None,
            cleared: ClearedStatus::Cleared,
            approved: true,
        };

        let value = serde_json::to_value(SaveTransaction { transaction: &tx }).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "transaction": {
                    "account_id": "acc-1",
                    "date": "2026-01-05",
                    "amount": -12340,
                    "payee_name": "Stock Market",
                    "cleared": "cleared",
                    "approved": true
                }
            })
        );
    }

    #[test]
    fn account_balance_in_major_units() {
        let account: BudgetAccount = serde_json::from_str(
            r#"{"id":"d1","name":"Questrade TFSA","type":"otherAsset","on_budget":false,
                "closed":false,"balance":950000,"cleared_balance":950000,"uncleared_balance":0,
                "deleted":false}"#,
        )
        .unwrap();

        assert_eq!(account.kind, "otherAsset");
        assert_eq!(account.balance_major(), "950".parse::<Decimal>().unwrap());
    }
}
