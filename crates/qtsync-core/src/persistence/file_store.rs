use std::path::PathBuf;

use async_trait::async_trait;
use tracing::{debug, info};

use super::record::{DestinationCredentials, StoredConfig, decode_config, encode_config};
use crate::config::{CONFIG_FILE, MAPPINGS_FILE};
use crate::credentials::{CredentialError, CredentialRecord, CredentialStore};
use crate::reconcile::AccountMapping;
use crate::utils::fs::{read_optional, write_atomic};
use crate::{Error, Result};

/// JSON files in the data directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn config_path(&self) -> PathBuf {
        self.dir.join(CONFIG_FILE)
    }

    pub fn mapping_path(&self) -> PathBuf {
        self.dir.join(MAPPINGS_FILE)
    }

    /// Load `config.json`. A missing file is an empty configuration.
    pub async fn load(&self) -> std::result::Result<StoredConfig, CredentialError> {
        let path = self.config_path();
        match read_optional(&path).await? {
            Some(text) => decode_config(&text),
            None => {
                debug!(path = %path.display(), "No stored credentials");
                Ok(StoredConfig::default())
            }
        }
    }

    /// Overwrite `config.json` entirely.
    pub async fn replace_all(
        &self,
        config: &StoredConfig,
    ) -> std::result::Result<(), CredentialError> {
        let text = encode_config(config)?;
        write_atomic(&self.config_path(), text.as_bytes()).await?;
        info!(path = %self.config_path().display(), "Saved credentials");
        Ok(())
    }

    /// Budget API credentials; both fields must be present.
    pub async fn load_destination(&self) -> Result<DestinationCredentials> {
        let destination = self.load().await?.destination;
        if !destination.is_complete() {
            return Err(Error::config(
                "missing YNAB access token or budget id; run `qtsync auth set` first",
            ));
        }
        Ok(destination)
    }

    /// Load the account mapping, fresh on every call.
    pub async fn load_mapping(&self) -> Result<AccountMapping> {
        let path = self.mapping_path();
        let Some(text) = read_optional(&path).await? else {
            return Err(Error::config(format!(
                "no account mapping at {}; run `qtsync mapping set` first",
                path.display()
            )));
        };

        let mapping: AccountMapping = serde_json::from_str(&text)
            .map_err(|e| Error::config(format!("{}: {}", path.display(), e)))?;
        debug!(entries = mapping.len(), "Loaded account mapping");
        Ok(mapping)
    }

    pub async fn save_mapping(&self, mapping: &AccountMapping) -> Result<()> {
        let text = serde_json::to_string_pretty(mapping)?;
        write_atomic(&self.mapping_path(), text.as_bytes()).await?;
        info!(entries = mapping.len(), "Saved account mapping");
        Ok(())
    }
}

#[async_trait]
impl CredentialStore for FileStore {
    async fn load_source(&self) -> std::result::Result<CredentialRecord, CredentialError> {
        Ok(self.load().await?.source)
    }

    async fn save_source(
        &self,
        record: &CredentialRecord,
    ) -> std::result::Result<(), CredentialError> {
        let mut config = self.load().await?;
        config.source = record.clone();
        let text = encode_config(&config)?;
        write_atomic(&self.config_path(), text.as_bytes()).await?;
        debug!(?record, "Persisted source credential");
        Ok(())
    }
}
