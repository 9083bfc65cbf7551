//! Questrade brokerage API: OAuth refresh, token validation and account data.

mod auth;
mod client;
pub mod models;

pub(crate) use auth::excerpt;
pub use auth::{QuestradeAuth, classify_validation};
pub use client::QuestradeClient;
pub use models::{Account, AccountBalances, PerCurrencyBalance};
