//! Versioned on-disk form of `config.json`.
//!
//! Decoding is explicit: a document that is not an object, carries an
//! unknown version, or has a field of the wrong type is rejected with
//! [`CredentialError::MalformedResponse`]. Cache fields that are absent,
//! empty or non-positive decode to `None`.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::credentials::{CredentialError, CredentialRecord, redact};

/// Version written by this build.
pub const CURRENT_VERSION: u64 = 1;

/// Budget API credentials. Read-only input to the sync core.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DestinationCredentials {
    #[serde(default)]
    pub access_token: String,
    #[serde(default)]
    pub budget_id: String,
}

impl DestinationCredentials {
    pub fn is_complete(&self) -> bool {
        !self.access_token.is_empty() && !self.budget_id.is_empty()
    }
}

impl fmt::Debug for DestinationCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DestinationCredentials")
            .field("access_token", &redact(&self.access_token))
            .field("budget_id", &self.budget_id)
            .finish()
    }
}

/// Decoded `config.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoredConfig {
    pub source: CredentialRecord,
    pub destination: DestinationCredentials,
}

#[derive(Serialize, Deserialize)]
struct VersionedConfig {
    version: u64,
    #[serde(default)]
    source: CredentialRecord,
    #[serde(default)]
    destination: DestinationCredentials,
}

/// Unversioned flat layout written by earlier releases.
#[derive(Default, Deserialize)]
#[serde(default)]
struct LegacyConfig {
    questrade_refresh_token: String,
    questrade_access_token: Option<String>,
    questrade_api_server: Option<String>,
    questrade_expires_in: Option<i64>,
    ynab_access_token: String,
    ynab_budget_id: String,
}

impl From<LegacyConfig> for StoredConfig {
    fn from(legacy: LegacyConfig) -> Self {
        Self {
            source: CredentialRecord {
                refresh_token: legacy.questrade_refresh_token,
                access_token: legacy.questrade_access_token,
                api_server: legacy.questrade_api_server,
                expires_in: legacy.questrade_expires_in,
            },
            destination: DestinationCredentials {
                access_token: legacy.ynab_access_token,
                budget_id: legacy.ynab_budget_id,
            },
        }
    }
}

fn malformed(msg: impl fmt::Display) -> CredentialError {
    CredentialError::MalformedResponse(format!("config.json: {msg}"))
}

fn normalize(mut record: CredentialRecord) -> CredentialRecord {
    record.refresh_token = record.refresh_token.trim().to_string();
    record.access_token = record.access_token.filter(|s| !s.is_empty());
    record.api_server = record.api_server.filter(|s| !s.is_empty());
    record.expires_in = record.expires_in.filter(|secs| *secs > 0);
    record
}

/// Decode `config.json`, accepting the current and the legacy layout.
pub fn decode_config(text: &str) -> Result<StoredConfig, CredentialError> {
    let value: Value = serde_json::from_str(text).map_err(|e| malformed(format!("invalid JSON: {e}")))?;

    let version = match &value {
        Value::Object(map) => map.get("version").map(Value::as_u64),
        _ => return Err(malformed("expected a JSON object")),
    };

    let config = match version {
        None => {
            let legacy: LegacyConfig = serde_json::from_value(value).map_err(malformed)?;
            StoredConfig::from(legacy)
        }
        Some(Some(CURRENT_VERSION)) => {
            let versioned: VersionedConfig = serde_json::from_value(value).map_err(malformed)?;
            StoredConfig {
                source: versioned.source,
                destination: versioned.destination,
            }
        }
        Some(Some(other)) => return Err(malformed(format!("unsupported version {other}"))),
        Some(None) => return Err(malformed("field `version` must be a non-negative integer")),
    };

    Ok(StoredConfig {
        source: normalize(config.source),
        destination: config.destination,
    })
}

/// Encode in the current versioned layout.
pub fn encode_config(config: &StoredConfig) -> Result<String, CredentialError> {
    let versioned = VersionedConfig {
        version: CURRENT_VERSION,
        source: config.source.clone(),
        destination: config.destination.clone(),
    };
    serde_json::to_string_pretty(&versioned)
        .map_err(|e| CredentialError::Persistence(format!("failed to encode config: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn decodes_versioned_layout() {
        let config = decode_config(
            r#"{
                "version": 1,
                "source": {
                    "refresh_token": "rt",
                    "access_token": "at",
                    "api_server": "https://api01.iq.questrade.com/",
                    "expires_in": 1200
                },
                "destination": { "access_token": "ynab", "budget_id": "b-1" }
            }"#,
        )
        .unwrap();

        assert_eq!(config.source.refresh_token, "rt");
        assert_eq!(config.source.expires_in, Some(1200));
        assert_eq!(config.destination.budget_id, "b-1");
        assert!(config.destination.is_complete());
    }

    #[test]
    fn oversized_cached_expiry_loads_without_a_cached_token() {
        use chrono::Utc;

        use crate::credentials::{LifecycleState, TokenStore};

        let config = decode_config(
            r#"{
                "version": 1,
                "source": {
                    "refresh_token": "rt",
                    "access_token": "at",
                    "api_server": "https://api01.iq.questrade.com/",
                    "expires_in": 9223372036854775807
                },
                "destination": { "access_token": "ynab", "budget_id": "b-1" }
            }"#,
        )
        .unwrap();

        let now = Utc::now();
        let tokens = TokenStore::from_record(&config.source, now);
        assert_eq!(tokens.expires_at(), None);
        assert_eq!(tokens.refresh_token(), "rt");
        assert_eq!(LifecycleState::initial(&tokens, now), LifecycleState::HaveRefreshOnly);
    }

    #[test]
    fn decodes_legacy_flat_layout() {
        let config = decode_config(
            r#"{
                "questrade_refresh_token": "rt",
                "questrade_access_token": "",
                "questrade_expires_in": 0,
                "ynab_access_token": "ynab",
                "ynab_budget_id": "b-1"
            }"#,
        )
        .unwrap();

        assert_eq!(config.source.refresh_token, "rt");
        assert_eq!(config.source.access_token, None);
        assert_eq!(config.source.api_server, None);
        assert_eq!(config.source.expires_in, None);
        assert_eq!(config.destination.access_token, "ynab");
    }

    #[rstest]
    #[case::not_json("{")]
    #[case::not_an_object("[1, 2]")]
    #[case::unknown_version(r#"{"version": 7}"#)]
    #[case::string_version(r#"{"version": "1"}"#)]
    #[case::wrong_field_type(r#"{"version": 1, "source": {"refresh_token": 42}}"#)]
    #[case::legacy_wrong_type(r#"{"questrade_expires_in": "soon"}"#)]
    fn rejects_malformed_documents(#[case] doc: &str) {
        let err = decode_config(doc).unwrap_err();
        assert!(
            matches!(err, CredentialError::MalformedResponse(_)),
            "{doc}: {err}"
        );
    }

    #[test]
    fn encoding_always_writes_current_version() {
        let config = StoredConfig {
            source: CredentialRecord {
                refresh_token: "rt".to_string(),
                ..CredentialRecord::default()
            },
            destination: DestinationCredentials::default(),
        };

        let text = encode_config(&config).unwrap();
        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["version"], 1);
        assert!(value["source"].get("access_token").is_none());
        assert_eq!(decode_config(&text).unwrap(), config);
    }
}
