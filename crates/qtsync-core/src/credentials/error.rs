//! Credential error types.

use thiserror::Error;

/// Errors that can occur while obtaining a usable access token.
#[derive(Debug, Error)]
pub enum CredentialError {
    /// No refresh token available and the user declined to supply one.
    #[error("No refresh token provided - re-authorization required")]
    MissingCredential,

    /// The live validation check could not reach a verdict.
    ///
    /// The cached token state is left untouched and the current operation
    /// must be aborted.
    #[error("Could not validate access token: {0}")]
    Validation(String),

    /// The auth endpoint answered 200 but the body is unusable.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// A single refresh attempt failed.
    #[error("Token refresh failed: {0}")]
    RefreshFailed(String),

    /// The refresh after the interactive recovery prompt failed as well.
    #[error("Token refresh failed after re-authorization: {0}")]
    RefreshExhausted(String),

    /// Durable storage of credential state failed.
    #[error("Failed to persist credentials: {0}")]
    Persistence(String),

    /// The interactive prompt itself failed (closed stdin, interrupted).
    #[error("Prompt failed: {0}")]
    Prompt(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl CredentialError {
    /// Check if this error requires the user to supply a new refresh token.
    pub fn requires_relogin(&self) -> bool {
        matches!(self, Self::MissingCredential | Self::RefreshExhausted(_))
    }
}

impl From<std::io::Error> for CredentialError {
    fn from(err: std::io::Error) -> Self {
        Self::Persistence(err.to_string())
    }
}
