//! Token lifecycle service.
//!
//! Orchestrates validation, refresh, interactive recovery and persistence
//! of the brokerage credential.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error, info, instrument, warn};

use super::error::CredentialError;
use super::manager::{AuthEndpoint, TokenPrompt};
use super::store::CredentialStore;
use super::types::{LifecycleState, PromptReason, TokenStatus, TokenStore};

/// Keeps the brokerage access token valid across invocations.
///
/// A single instance owns the in-memory [`TokenStore`]; callers serialize
/// access through `&mut self`, so validation and refresh never overlap.
pub struct TokenLifecycleManager {
    tokens: TokenStore,
    state: LifecycleState,
    endpoint: Arc<dyn AuthEndpoint>,
    prompt: Arc<dyn TokenPrompt>,
    store: Arc<dyn CredentialStore>,
}

impl TokenLifecycleManager {
    pub fn new(
        tokens: TokenStore,
        endpoint: Arc<dyn AuthEndpoint>,
        prompt: Arc<dyn TokenPrompt>,
        store: Arc<dyn CredentialStore>,
    ) -> Self {
        let state = LifecycleState::initial(&tokens, Utc::now());
        Self {
            tokens,
            state,
            endpoint,
            prompt,
            store,
        }
    }

    /// Build a manager from the persisted credential record.
    pub async fn load(
        endpoint: Arc<dyn AuthEndpoint>,
        prompt: Arc<dyn TokenPrompt>,
        store: Arc<dyn CredentialStore>,
    ) -> Result<Self, CredentialError> {
        let record = store.load_source().await?;
        let tokens = TokenStore::from_record(&record, Utc::now());
        debug!(?tokens, "Loaded brokerage credential");
        Ok(Self::new(tokens, endpoint, prompt, store))
    }

    /// Current lifecycle state.
    #[inline]
    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// Current in-memory credential.
    #[inline]
    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    /// Return a credential whose access token is currently valid.
    ///
    /// Uses the fewest network calls possible: a cached token is validated
    /// live and reused; otherwise the refresh token is exchanged. The user
    /// is prompted only when no refresh token exists or the exchange failed,
    /// and the exchange is retried exactly once after that prompt.
    #[instrument(skip(self), fields(state = %self.state))]
    pub async fn ensure_valid(&mut self) -> Result<&TokenStore, CredentialError> {
        match self.state {
            LifecycleState::Failed => {
                return Err(CredentialError::RefreshExhausted(
                    "credential recovery already failed in this invocation".to_string(),
                ));
            }
            LifecycleState::Ready if self.tokens.is_usable(Utc::now()) => {
                return Ok(&self.tokens);
            }
            _ => {}
        }

        let mut state = LifecycleState::initial(&self.tokens, Utc::now());
        let mut recovered = false;

        loop {
            self.state = state;
            debug!(state = %state, "Token lifecycle step");

            state = match state {
                LifecycleState::NoRefreshToken => {
                    let token = self.ask(PromptReason::Initial)?;
                    self.tokens.replace_refresh_token(token);
                    self.persist("initial refresh token").await;
                    LifecycleState::HaveRefreshOnly
                }
                LifecycleState::HaveRefreshOnly => LifecycleState::Refreshing,
                LifecycleState::CachedAccessToken => LifecycleState::Validating,
                LifecycleState::Validating => self.validate().await?,
                LifecycleState::Refreshing => self.refresh(recovered).await?,
                LifecycleState::RecoveryPrompt => {
                    let token = self.ask(PromptReason::Recovery)?;
                    self.tokens.replace_refresh_token(token);
                    self.persist("recovery refresh token").await;
                    recovered = true;
                    LifecycleState::Refreshing
                }
                LifecycleState::Ready => {
                    info!(
                        expires_at = ?self.tokens.expires_at(),
                        api_server = %self.tokens.api_server(),
                        "Brokerage access token ready"
                    );
                    return Ok(&self.tokens);
                }
                // Never produced by a transition; failures return through `fail`.
                LifecycleState::Failed => {
                    return Err(self.fail(CredentialError::RefreshExhausted(
                        "lifecycle entered the failed state".to_string(),
                    )));
                }
            };
        }
    }

    /// Live validation of the cached access token.
    ///
    /// An indeterminate result leaves both the state and the credential
    /// untouched and aborts the current operation.
    async fn validate(&mut self) -> Result<LifecycleState, CredentialError> {
        let verdict = self
            .endpoint
            .validate(self.tokens.access_token(), self.tokens.api_server())
            .await;

        match verdict {
            Ok(TokenStatus::Valid) => {
                debug!("Cached access token affirmed valid");
                Ok(LifecycleState::Ready)
            }
            Ok(TokenStatus::Invalid { reason }) => {
                info!(%reason, "Cached access token rejected, refreshing");
                Ok(LifecycleState::Refreshing)
            }
            Err(e) => {
                warn!(error = %e, "Access token validation was inconclusive");
                Err(match e {
                    CredentialError::Validation(_) => e,
                    other => CredentialError::Validation(other.to_string()),
                })
            }
        }
    }

    /// Exchange the refresh token once.
    async fn refresh(&mut self, after_recovery: bool) -> Result<LifecycleState, CredentialError> {
        info!(after_recovery, "Refreshing brokerage access token");

        match self.endpoint.refresh(self.tokens.refresh_token()).await {
            Ok(refreshed) => {
                let rotated = self.tokens.apply_refresh(&refreshed, Utc::now());
                info!(
                    rotated,
                    expires_in = refreshed.expires_in,
                    "Token refresh successful"
                );
                self.persist("refreshed tokens").await;
                Ok(LifecycleState::Ready)
            }
            Err(e) if !after_recovery => {
                warn!(error = %e, "Token refresh failed, asking for a new refresh token");
                Ok(LifecycleState::RecoveryPrompt)
            }
            Err(e) => Err(self.fail(CredentialError::RefreshExhausted(e.to_string()))),
        }
    }

    /// Ask the user for a refresh token; an empty answer is fatal.
    fn ask(&mut self, reason: PromptReason) -> Result<String, CredentialError> {
        let answer = match self.prompt.prompt_for_token(reason) {
            Ok(answer) => answer,
            Err(e) => return Err(self.fail(e)),
        };

        let token = answer.trim();
        if token.is_empty() {
            return Err(self.fail(CredentialError::MissingCredential));
        }
        Ok(token.to_string())
    }

    /// Persist the current credential. Failures are non-fatal: the token in
    /// memory is valid for the lifetime of this process.
    async fn persist(&self, what: &'static str) {
        let record = self.tokens.to_record(Utc::now());
        match self.store.save_source(&record).await {
            Ok(()) => debug!(what, "Persisted brokerage credential"),
            Err(e) => warn!(what, error = %e, "Failed to persist credential (non-fatal)"),
        }
    }

    fn fail(&mut self, err: CredentialError) -> CredentialError {
        self.state = LifecycleState::Failed;
        error!(error = %err, "Credential lifecycle failed");
        err
    }
}
