//! Collaborator traits used by the token lifecycle.

use async_trait::async_trait;

use super::CredentialError;
use super::types::{PromptReason, RefreshedTokens, TokenStatus};

/// Remote auth endpoint for the brokerage API.
///
/// Implements exactly one refresh-token exchange and one bearer-token
/// validation call.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuthEndpoint: Send + Sync {
    /// Live, side-effect-free check of a cached access token.
    ///
    /// # Returns
    /// * `Ok(TokenStatus::Valid)` - the endpoint accepted the token
    /// * `Ok(TokenStatus::Invalid { .. })` - the endpoint rejected the token
    /// * `Err(CredentialError::Validation(..))` - no verdict (network error,
    ///   unexpected status)
    async fn validate(
        &self,
        access_token: &str,
        api_server: &str,
    ) -> Result<TokenStatus, CredentialError>;

    /// Exchange a refresh token for a new access token.
    ///
    /// Any failure, including a malformed 200 body, means the token
    /// could not be refreshed.
    async fn refresh(&self, refresh_token: &str) -> Result<RefreshedTokens, CredentialError>;
}

/// Interactive source of refresh tokens.
///
/// The terminal implementation lives in the CLI; the lifecycle itself
/// never touches stdin.
#[cfg_attr(test, mockall::automock)]
pub trait TokenPrompt: Send + Sync {
    /// Ask the user for a refresh token. An empty string means "declined".
    fn prompt_for_token(&self, reason: PromptReason) -> Result<String, CredentialError>;
}
