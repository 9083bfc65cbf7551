use std::sync::OnceLock;

use tracing::debug;

use crate::Result;
use crate::config::AppConfig;

pub fn install_rustls_provider() {
    static PROVIDER_INSTALLED: OnceLock<()> = OnceLock::new();
    PROVIDER_INSTALLED.get_or_init(|| {
        if let Err(e) = rustls::crypto::aws_lc_rs::default_provider().install_default() {
            debug!(existing_provider = ?e, "rustls CryptoProvider already installed");
        }
    });
}

/// Build the single HTTP client shared by every remote call of an invocation.
///
/// The timeout applies uniformly to each request; there are no retries at
/// this layer.
pub fn build_client(config: &AppConfig) -> Result<reqwest::Client> {
    install_rustls_provider();

    let client = reqwest::Client::builder()
        .timeout(config.request_timeout())
        .user_agent(concat!("qtsync/", env!("CARGO_PKG_VERSION")))
        .build()?;
    Ok(client)
}

/// Join `path` onto `base`, tolerating a missing or duplicated `/`.
pub fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_url_tolerates_trailing_slash() {
        assert_eq!(
            join_url("https://api01.iq.questrade.com/", "v1/accounts"),
            "https://api01.iq.questrade.com/v1/accounts"
        );
        assert_eq!(
            join_url("https://api01.iq.questrade.com", "/v1/time"),
            "https://api01.iq.questrade.com/v1/time"
        );
    }

    #[test]
    fn client_builds_with_default_config() {
        assert!(build_client(&AppConfig::default()).is_ok());
    }
}
