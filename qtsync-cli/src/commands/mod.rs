pub mod auth;
pub mod budgets;
pub mod mapping;
pub mod sync;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use qtsync_core::AppConfig;
use qtsync_core::accounts::AccountFetcher;
use qtsync_core::config::resolve_data_dir;
use qtsync_core::credentials::{TokenLifecycleManager, TokenStore};
use qtsync_core::persistence::FileStore;
use qtsync_core::questrade::{QuestradeAuth, QuestradeClient};
use qtsync_core::utils::http_client::build_client;
use qtsync_core::ynab::YnabClient;
use tracing::debug;

use crate::prompt::TerminalPrompt;

/// Settings, store and HTTP client shared by one invocation.
pub struct CommandContext {
    pub config: AppConfig,
    pub store: Arc<FileStore>,
    pub http: reqwest::Client,
}

impl CommandContext {
    pub fn new(config_dir: Option<&Path>) -> Result<Self> {
        let data_dir = resolve_data_dir(config_dir)?;
        let config = AppConfig::load(&data_dir)
            .with_context(|| format!("Failed to load settings from {}", data_dir.display()))?;
        let http = build_client(&config)?;
        debug!(data_dir = %data_dir.display(), ?config, "Loaded settings");

        Ok(Self {
            store: Arc::new(FileStore::new(data_dir)),
            config,
            http,
        })
    }

    /// Run the credential lifecycle and return a currently valid credential.
    pub async fn ensure_credential(&self) -> Result<TokenStore> {
        let auth = QuestradeAuth::new(self.http.clone(), self.config.auth_url.clone());
        let mut manager =
            TokenLifecycleManager::load(Arc::new(auth), Arc::new(TerminalPrompt), self.store.clone())
                .await?;
        let tokens = manager.ensure_valid().await?;
        Ok(tokens.clone())
    }

    pub async fn budget_client(&self) -> Result<YnabClient> {
        let destination = self.store.load_destination().await?;
        Ok(YnabClient::new(
            self.http.clone(),
            self.config.budget_api_url.clone(),
            destination.access_token,
            destination.budget_id,
        ))
    }

    pub fn fetcher(&self, tokens: &TokenStore) -> AccountFetcher {
        let client = QuestradeClient::new(self.http.clone(), tokens);
        AccountFetcher::new(Arc::new(client), self.config.balance_fetch_concurrency)
    }
}

/// Stderr spinner for network waits; hidden when stderr is not a terminal.
pub fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.enable_steady_tick(Duration::from_millis(120));
    if let Ok(style) = ProgressStyle::with_template("{spinner:.blue} {msg}") {
        pb.set_style(style.tick_strings(&[
            "▹▹▹▹▹",
            "▸▹▹▹▹",
            "▹▸▹▹▹",
            "▹▹▸▹▹",
            "▹▹▹▸▹",
            "▹▹▹▹▸",
            "▪▪▪▪▪",
        ]));
    }
    pb.set_message(message.to_string());
    pb
}
