//! Questrade OAuth token exchange and live token validation.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::StatusCode;
use tracing::{debug, instrument, warn};

use super::models::TokenResponse;
use crate::credentials::{
    AuthEndpoint, CredentialError, RefreshedTokens, TokenStatus, expiry_after,
};
use crate::utils::http_client::join_url;

/// Lightweight resource used for live validation.
const VALIDATION_PATH: &str = "v1/time";

/// Longest body excerpt carried into error messages.
const BODY_EXCERPT_LEN: usize = 200;

pub struct QuestradeAuth {
    client: reqwest::Client,
    auth_url: String,
}

impl QuestradeAuth {
    pub fn new(client: reqwest::Client, auth_url: impl Into<String>) -> Self {
        Self {
            client,
            auth_url: auth_url.into(),
        }
    }
}

/// Classify the response of the validation call.
///
/// 200 is valid, 401 is invalid, and a body mentioning both "invalid" and
/// "access" is invalid whatever the status. Anything else has no verdict.
pub fn classify_validation(status: StatusCode, body: &str) -> Result<TokenStatus, CredentialError> {
    if status == StatusCode::OK {
        return Ok(TokenStatus::Valid);
    }
    if status == StatusCode::UNAUTHORIZED {
        return Ok(TokenStatus::Invalid {
            reason: "401 Unauthorized".to_string(),
        });
    }

    let lower = body.to_lowercase();
    if lower.contains("invalid") && lower.contains("access") {
        return Ok(TokenStatus::Invalid {
            reason: format!("status {}: {}", status.as_u16(), excerpt(body)),
        });
    }

    Err(CredentialError::Validation(format!(
        "unexpected status {}: {}",
        status.as_u16(),
        excerpt(body)
    )))
}

pub(crate) fn excerpt(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.chars().count() <= BODY_EXCERPT_LEN {
        return trimmed.to_string();
    }
    let cut: String = trimmed.chars().take(BODY_EXCERPT_LEN).collect();
    format!("{cut}...")
}

fn into_refreshed(response: TokenResponse) -> Result<RefreshedTokens, CredentialError> {
    let non_empty = |value: Option<String>| value.filter(|s| !s.is_empty());

    let access_token = non_empty(response.access_token).ok_or_else(|| {
        CredentialError::MalformedResponse("token response has no access_token".to_string())
    })?;
    let api_server = non_empty(response.api_server).ok_or_else(|| {
        CredentialError::MalformedResponse("token response has no api_server".to_string())
    })?;
    let expires_in = response.expires_in.filter(|secs| *secs > 0).ok_or_else(|| {
        CredentialError::MalformedResponse(
            "token response has no positive expires_in".to_string(),
        )
    })?;
    if expiry_after(Utc::now(), expires_in).is_none() {
        return Err(CredentialError::MalformedResponse(format!(
            "token response expires_in {expires_in} is out of range"
        )));
    }

    Ok(RefreshedTokens {
        access_token,
        api_server,
        expires_in,
        refresh_token: non_empty(response.refresh_token),
    })
}

#[async_trait]
impl AuthEndpoint for QuestradeAuth {
    #[instrument(skip_all, fields(api_server = %api_server))]
    async fn validate(
        &self,
        access_token: &str,
        api_server: &str,
    ) -> Result<TokenStatus, CredentialError> {
        if access_token.is_empty() || api_server.is_empty() {
            return Ok(TokenStatus::Invalid {
                reason: "no cached access token".to_string(),
            });
        }

        let url = join_url(api_server, VALIDATION_PATH);
        let response = self
            .client
            .get(&url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| CredentialError::Validation(format!("request failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| CredentialError::Validation(format!("failed to read body: {e}")))?;

        let verdict = classify_validation(status, &body);
        debug!(status = status.as_u16(), ?verdict, "Validation response");
        verdict
    }

    #[instrument(skip_all, fields(auth_url = %self.auth_url))]
    async fn refresh(&self, refresh_token: &str) -> Result<RefreshedTokens, CredentialError> {
        if refresh_token.is_empty() {
            return Err(CredentialError::RefreshFailed(
                "no refresh token to exchange".to_string(),
            ));
        }

        let response = self
            .client
            .post(&self.auth_url)
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
            ])
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "Token endpoint rejected refresh token");
            return Err(CredentialError::RefreshFailed(format!(
                "status {}: {}",
                status.as_u16(),
                excerpt(&body)
            )));
        }

        let body = response.text().await?;
        let parsed: TokenResponse = serde_json::from_str(&body).map_err(|e| {
            CredentialError::MalformedResponse(format!("token response is not valid JSON: {e}"))
        })?;

        into_refreshed(parsed)
    }
}
