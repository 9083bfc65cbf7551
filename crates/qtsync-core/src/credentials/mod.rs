//! Credential management module.
//!
//! Keeps the brokerage access token valid across invocations: validation
//! of cached tokens, refresh-token exchange with rotation, interactive
//! recovery and persistence.
//!
//! # Architecture
//!
//! - [`TokenStore`]: In-memory credential state
//! - [`AuthEndpoint`]: Remote refresh and validation calls
//! - [`TokenPrompt`]: Interactive source of refresh tokens
//! - [`CredentialStore`]: Durable storage of the credential
//! - [`TokenLifecycleManager`]: Orchestrates the lifecycle state machine

mod error;
mod manager;
mod service;
mod store;
mod types;

pub use error::CredentialError;
pub use manager::{AuthEndpoint, TokenPrompt};
pub use service::TokenLifecycleManager;
pub use store::CredentialStore;
pub use types::{
    CredentialRecord, LifecycleState, PromptReason, RefreshedTokens, TokenStatus, TokenStore,
    expiry_after, redact,
};
