//! Core credential types.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Current credential state for the brokerage API.
///
/// Mutated in place on every successful refresh. The access token, API
/// server and expiry are always overwritten together; the refresh token is
/// only overwritten when the auth endpoint rotates it.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct TokenStore {
    refresh_token: String,
    access_token: String,
    api_server: String,
    expires_at: Option<DateTime<Utc>>,
}

impl TokenStore {
    /// Create a store holding only a refresh token.
    pub fn new(refresh_token: impl Into<String>) -> Self {
        Self {
            refresh_token: refresh_token.into(),
            ..Self::default()
        }
    }

    /// Rebuild the in-memory state from a persisted record.
    ///
    /// The record only stores a duration, so the absolute expiry is computed
    /// from `loaded_at`. A zero or out-of-range duration means "no cached
    /// expiry".
    pub fn from_record(record: &CredentialRecord, loaded_at: DateTime<Utc>) -> Self {
        let expires_at = record
            .expires_in
            .and_then(|secs| expiry_after(loaded_at, secs));

        Self {
            refresh_token: record.refresh_token.clone(),
            access_token: record.access_token.clone().unwrap_or_default(),
            api_server: record.api_server.clone().unwrap_or_default(),
            expires_at,
        }
    }

    /// Seed the cached access token (used by tests and by `from_record`).
    pub fn with_access_token(
        mut self,
        access_token: impl Into<String>,
        api_server: impl Into<String>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        self.access_token = access_token.into();
        self.api_server = api_server.into();
        self.expires_at = Some(expires_at);
        self
    }

    #[inline]
    pub fn refresh_token(&self) -> &str {
        &self.refresh_token
    }

    #[inline]
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    #[inline]
    pub fn api_server(&self) -> &str {
        &self.api_server
    }

    #[inline]
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    #[inline]
    pub fn has_refresh_token(&self) -> bool {
        !self.refresh_token.is_empty()
    }

    /// Access token, API server and expiry are all present and the expiry
    /// has not passed.
    pub fn is_usable(&self, now: DateTime<Utc>) -> bool {
        !self.access_token.is_empty()
            && !self.api_server.is_empty()
            && self.expires_at.is_some_and(|at| now < at)
    }

    /// Seconds until expiry, clamped at zero.
    pub fn expires_in(&self, now: DateTime<Utc>) -> Option<i64> {
        self.expires_at
            .map(|at| (at - now).num_seconds().max(0))
    }

    /// Replace the refresh token and drop the cached access token.
    pub fn replace_refresh_token(&mut self, refresh_token: impl Into<String>) {
        self.refresh_token = refresh_token.into();
        self.access_token.clear();
        self.api_server.clear();
        self.expires_at = None;
    }

    /// Apply the result of a successful token exchange.
    ///
    /// Returns `true` when the refresh token was rotated.
    pub fn apply_refresh(&mut self, tokens: &RefreshedTokens, now: DateTime<Utc>) -> bool {
        self.access_token = tokens.access_token.clone();
        self.api_server = tokens.api_server.clone();
        self.expires_at = expiry_after(now, tokens.expires_in);

        match tokens.refresh_token.as_deref() {
            Some(rotated) if !rotated.is_empty() => {
                self.refresh_token = rotated.to_string();
                true
            }
            _ => false,
        }
    }

    /// Snapshot for persistence.
    pub fn to_record(&self, now: DateTime<Utc>) -> CredentialRecord {
        let non_empty = |s: &str| (!s.is_empty()).then(|| s.to_string());
        CredentialRecord {
            refresh_token: self.refresh_token.clone(),
            access_token: non_empty(&self.access_token),
            api_server: non_empty(&self.api_server),
            expires_in: self.expires_in(now).filter(|secs| *secs > 0),
        }
    }
}

/// `now + secs`, or `None` when `secs` is not positive or the instant is
/// not representable.
pub fn expiry_after(now: DateTime<Utc>, secs: i64) -> Option<DateTime<Utc>> {
    if secs <= 0 {
        return None;
    }
    now.checked_add_signed(Duration::try_seconds(secs)?)
}

impl fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenStore")
            .field("refresh_token", &redact(&self.refresh_token))
            .field("access_token", &redact(&self.access_token))
            .field("api_server", &self.api_server)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Persisted form of the brokerage credential.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialRecord {
    #[serde(default)]
    pub refresh_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_server: Option<String>,
    /// Seconds of validity remaining when the record was written.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<i64>,
}

impl fmt::Debug for CredentialRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialRecord")
            .field("refresh_token", &redact(&self.refresh_token))
            .field(
                "access_token",
                &self.access_token.as_deref().map(redact),
            )
            .field("api_server", &self.api_server)
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

/// Result of a successful token exchange.
#[derive(Clone, PartialEq, Eq)]
pub struct RefreshedTokens {
    pub access_token: String,
    pub api_server: String,
    /// Validity in seconds, relative to the moment the response arrived.
    pub expires_in: i64,
    /// `None` or empty means the endpoint did not rotate the refresh token.
    pub refresh_token: Option<String>,
}

impl fmt::Debug for RefreshedTokens {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RefreshedTokens")
            .field("access_token", &redact(&self.access_token))
            .field("api_server", &self.api_server)
            .field("expires_in", &self.expires_in)
            .field("rotated", &self.refresh_token.as_deref().is_some_and(|t| !t.is_empty()))
            .finish()
    }
}

/// Verdict of the live validation check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenStatus {
    /// The endpoint affirmed the token works.
    Valid,
    /// The endpoint affirmed the token is invalid or expired.
    Invalid { reason: String },
}

impl TokenStatus {
    #[inline]
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }
}

/// Why the user is being asked for a refresh token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptReason {
    /// Nothing is stored yet.
    Initial,
    /// The stored refresh token was rejected.
    Recovery,
}

/// States of the token lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    NoRefreshToken,
    HaveRefreshOnly,
    CachedAccessToken,
    Validating,
    Refreshing,
    Ready,
    RecoveryPrompt,
    Failed,
}

impl LifecycleState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoRefreshToken => "no_refresh_token",
            Self::HaveRefreshOnly => "have_refresh_only",
            Self::CachedAccessToken => "cached_access_token",
            Self::Validating => "validating",
            Self::Refreshing => "refreshing",
            Self::Ready => "ready",
            Self::RecoveryPrompt => "recovery_prompt",
            Self::Failed => "failed",
        }
    }

    /// Initial state for a freshly loaded credential.
    pub fn initial(store: &TokenStore, now: DateTime<Utc>) -> Self {
        if !store.has_refresh_token() {
            Self::NoRefreshToken
        } else if store.is_usable(now) {
            Self::CachedAccessToken
        } else {
            Self::HaveRefreshOnly
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Redacted form of a secret for logs and debug output.
pub fn redact(secret: &str) -> String {
    if secret.is_empty() {
        return String::new();
    }
    let visible: String = secret.chars().take(4).collect();
    format!("{}…({} chars)", visible, secret.chars().count())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(refresh: Option<&str>) -> RefreshedTokens {
        RefreshedTokens {
            access_token: "new-access".to_string(),
            api_server: "https://api05.iq.questrade.com/".to_string(),
            expires_in: 1800,
            refresh_token: refresh.map(String::from),
        }
    }

    #[test]
    fn usable_requires_all_cached_fields_and_future_expiry() {
        let now = Utc::now();
        let store = TokenStore::new("rt");
        assert!(!store.is_usable(now));

        let store = store.with_access_token("at", "https://api01/", now + Duration::minutes(5));
        assert!(store.is_usable(now));
        assert!(!store.is_usable(now + Duration::minutes(6)));

        let no_server = TokenStore::new("rt").with_access_token("at", "", now + Duration::hours(1));
        assert!(!no_server.is_usable(now));
    }

    #[test]
    fn out_of_range_expiry_is_not_cached() {
        let now = Utc::now();
        assert_eq!(expiry_after(now, 0), None);
        assert_eq!(expiry_after(now, i64::MAX), None);
        assert_eq!(expiry_after(now, 60), Some(now + Duration::seconds(60)));

        let record = CredentialRecord {
            refresh_token: "rt".to_string(),
            access_token: Some("at".to_string()),
            api_server: Some("https://api01/".to_string()),
            expires_in: Some(i64::MAX),
        };
        let store = TokenStore::from_record(&record, now);
        assert_eq!(store.expires_at(), None);
        assert!(!store.is_usable(now));
        assert_eq!(LifecycleState::initial(&store, now), LifecycleState::HaveRefreshOnly);
    }

    #[test]
    fn apply_refresh_keeps_rotation_when_expiry_overflows() {
        let now = Utc::now();
        let mut store = TokenStore::new("old-refresh");
        let mut refreshed = tokens(Some("new-refresh"));
        refreshed.expires_in = i64::MAX;

        assert!(store.apply_refresh(&refreshed, now));
        assert_eq!(store.refresh_token(), "new-refresh");
        assert_eq!(store.expires_at(), None);
        assert_eq!(store.to_record(now).refresh_token, "new-refresh");
    }

    #[test]
    fn apply_refresh_overwrites_cache_and_rotates_when_supplied() {
        let now = Utc::now();
        let mut store = TokenStore::new("old-refresh").with_access_token(
            "old-access",
            "https://old/",
            now,
        );

        assert!(store.apply_refresh(&tokens(Some("new-refresh")), now));
        assert_eq!(store.refresh_token(), "new-refresh");
        assert_eq!(store.access_token(), "new-access");
        assert_eq!(store.api_server(), "https://api05.iq.questrade.com/");
        assert_eq!(store.expires_at(), Some(now + Duration::seconds(1800)));
    }

    #[test]
    fn apply_refresh_keeps_refresh_token_without_rotation() {
        let now = Utc::now();
        let mut store = TokenStore::new("keep-me");

        assert!(!store.apply_refresh(&tokens(None), now));
        assert_eq!(store.refresh_token(), "keep-me");

        assert!(!store.apply_refresh(&tokens(Some("")), now));
        assert_eq!(store.refresh_token(), "keep-me");
        assert_eq!(store.access_token(), "new-access");
    }

    #[test]
    fn record_expiry_is_relative_to_load_time() {
        let loaded_at = Utc::now();
        let record = CredentialRecord {
            refresh_token: "rt".to_string(),
            access_token: Some("at".to_string()),
            api_server: Some("https://api01/".to_string()),
            expires_in: Some(600),
        };

        let store = TokenStore::from_record(&record, loaded_at);
        assert_eq!(store.expires_at(), Some(loaded_at + Duration::seconds(600)));
        assert_eq!(LifecycleState::initial(&store, loaded_at), LifecycleState::CachedAccessToken);

        let snapshot = store.to_record(loaded_at + Duration::seconds(100));
        assert_eq!(snapshot.expires_in, Some(500));
    }

    #[test]
    fn initial_state_without_cache_or_token() {
        let now = Utc::now();
        assert_eq!(
            LifecycleState::initial(&TokenStore::default(), now),
            LifecycleState::NoRefreshToken
        );

        let zero = CredentialRecord {
            refresh_token: "rt".to_string(),
            access_token: Some("at".to_string()),
            api_server: Some("https://api01/".to_string()),
            expires_in: Some(0),
        };
        let store = TokenStore::from_record(&zero, now);
        assert_eq!(store.expires_at(), None);
        assert_eq!(LifecycleState::initial(&store, now), LifecycleState::HaveRefreshOnly);
    }

    #[test]
    fn replacing_refresh_token_drops_cached_access() {
        let now = Utc::now();
        let mut store =
            TokenStore::new("old").with_access_token("at", "https://api01/", now + Duration::hours(1));
        store.replace_refresh_token("fresh");

        assert_eq!(store.refresh_token(), "fresh");
        assert!(store.access_token().is_empty());
        assert_eq!(store.expires_at(), None);
    }

    #[test]
    fn debug_output_never_contains_secrets() {
        let store = TokenStore::new("supersecretrefresh");
        let debug = format!("{:?}", store);
        assert!(!debug.contains("supersecretrefresh"));
        assert!(debug.contains("supe…(18 chars)"));
    }
}
