//! qtsync core library.
//!
//! Keeps the Questrade access token valid, fetches brokerage and budget
//! accounts, and reconciles balances between them.

pub mod accounts;
pub mod config;
pub mod credentials;
pub mod error;
pub mod persistence;
pub mod questrade;
pub mod reconcile;
pub mod sync;
pub mod utils;
pub mod ynab;

pub use config::AppConfig;
pub use error::{Error, Result};
