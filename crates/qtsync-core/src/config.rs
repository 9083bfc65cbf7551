//! Application configuration.
//!
//! An explicit value threaded into every constructor; nothing here is
//! process-global. Values come from an optional `settings.toml` in the data
//! directory and fall back to defaults field by field.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{Error, Result};

/// Name of the data directory under the user's home.
pub const DEFAULT_DIR_NAME: &str = ".questrade-ynab";
/// Optional settings file inside the data directory.
pub const SETTINGS_FILE: &str = "settings.toml";
/// Credential file inside the data directory.
pub const CONFIG_FILE: &str = "config.json";
/// Account mapping file inside the data directory.
pub const MAPPINGS_FILE: &str = "mappings.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Brokerage OAuth token endpoint.
    pub auth_url: String,
    /// Budget API base URL.
    pub budget_api_url: String,
    /// Per-request network timeout, applied uniformly.
    pub request_timeout_secs: u64,
    /// Upper bound on concurrent balance fetches.
    pub balance_fetch_concurrency: usize,
    /// Payee name on adjustment transactions.
    pub transaction_payee: String,
    /// Memo on adjustment transactions.
    pub transaction_memo: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            auth_url: "https://login.questrade.com/oauth2/token".to_string(),
            budget_api_url: "https://api.ynab.com/v1".to_string(),
            request_timeout_secs: 10,
            balance_fetch_concurrency: 8,
            transaction_payee: "Stock Market".to_string(),
            transaction_memo: "Questrade sync".to_string(),
        }
    }
}

impl AppConfig {
    /// Load `settings.toml` from `dir`. A missing file yields the defaults.
    pub fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(SETTINGS_FILE);
        if !path.exists() {
            debug!(path = %path.display(), "No settings file, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)?;
        let config = Self::from_toml(&content)
            .map_err(|e| Error::config(format!("{}: {}", path.display(), e)))?;
        debug!(path = %path.display(), ?config, "Loaded settings");
        Ok(config)
    }

    /// Parse and validate a TOML document.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(|e| Error::config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.request_timeout_secs == 0 {
            return Err(Error::config("request_timeout_secs must be greater than 0"));
        }
        if self.balance_fetch_concurrency == 0 {
            return Err(Error::config(
                "balance_fetch_concurrency must be greater than 0",
            ));
        }
        for (name, value) in [
            ("auth_url", &self.auth_url),
            ("budget_api_url", &self.budget_api_url),
        ] {
            url::Url::parse(value).map_err(|e| Error::config(format!("{name}: {e}")))?;
        }
        Ok(())
    }

    #[inline]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Resolve the data directory: explicit override, else `~/.questrade-ynab`.
pub fn resolve_data_dir(override_dir: Option<&Path>) -> Result<PathBuf> {
    if let Some(dir) = override_dir {
        return Ok(dir.to_path_buf());
    }
    dirs::home_dir()
        .map(|home| home.join(DEFAULT_DIR_NAME))
        .ok_or_else(|| Error::config("could not determine the home directory"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_settings_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load(dir.path()).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn partial_settings_keep_remaining_defaults() {
        let config = AppConfig::from_toml(
            r#"
            request_timeout_secs = 30
            transaction_memo = "weekly"
            "#,
        )
        .unwrap();

        assert_eq!(config.request_timeout_secs, 30);
        assert_eq!(config.transaction_memo, "weekly");
        assert_eq!(config.transaction_payee, "Stock Market");
        assert_eq!(config.balance_fetch_concurrency, 8);
    }

    #[test]
    fn invalid_settings_are_configuration_errors() {
        for doc in [
            "request_timeout_secs = \"soon\"",
            "balance_fetch_concurrency = 0",
            "auth_url = \"not a url\"",
        ] {
            let err = AppConfig::from_toml(doc).unwrap_err();
            assert!(matches!(err, Error::Configuration(_)), "{doc}: {err}");
        }
    }

    #[test]
    fn settings_file_is_read_from_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(SETTINGS_FILE),
            "budget_api_url = \"http://localhost:9000/v1\"\n",
        )
        .unwrap();

        let config = AppConfig::load(dir.path()).unwrap();
        assert_eq!(config.budget_api_url, "http://localhost:9000/v1");
    }

    #[test]
    fn explicit_data_dir_wins() {
        let dir = resolve_data_dir(Some(Path::new("/tmp/qtsync"))).unwrap();
        assert_eq!(dir, PathBuf::from("/tmp/qtsync"));
    }
}
