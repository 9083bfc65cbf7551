//! YNAB budget API client.

mod api;
mod client;
pub mod models;

pub use api::BudgetApi;
#[cfg(test)]
pub use api::MockBudgetApi;
pub use client::YnabClient;
pub use models::{BudgetAccount, BudgetSummary, ClearedStatus, NewTransaction};
