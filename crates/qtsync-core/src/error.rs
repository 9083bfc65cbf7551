//! Crate-wide error types.

use thiserror::Error;

use crate::credentials::CredentialError;

/// Crate-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Crate-wide error type.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Credential(#[from] CredentialError),

    /// 401 from a data call made with a credential that was just validated.
    #[error("Unauthorized: {detail}")]
    Auth { detail: String },

    #[error("Remote API returned status {status}: {detail}")]
    Remote { status: u16, detail: String },

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn remote(status: u16, detail: impl Into<String>) -> Self {
        Self::Remote {
            status,
            detail: detail.into(),
        }
    }

    pub fn auth(detail: impl Into<String>) -> Self {
        Self::Auth {
            detail: detail.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Whether the user has to re-authorize before anything else can succeed.
    ///
    /// A 401 from a data call after a successful validation is treated the
    /// same as an exhausted refresh: nothing is retried silently.
    pub fn requires_reauth(&self) -> bool {
        match self {
            Self::Auth { .. } => true,
            Self::Credential(e) => e.requires_relogin(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_and_exhausted_refresh_require_reauth() {
        assert!(Error::auth("token revoked").requires_reauth());
        assert!(
            Error::from(CredentialError::RefreshExhausted("400".to_string())).requires_reauth()
        );
        assert!(Error::from(CredentialError::MissingCredential).requires_reauth());
    }

    #[test]
    fn transient_failures_do_not_require_reauth() {
        assert!(!Error::remote(503, "maintenance").requires_reauth());
        assert!(!Error::Decode("eof".to_string()).requires_reauth());
        assert!(
            !Error::from(CredentialError::Validation("timeout".to_string())).requires_reauth()
        );
    }
}
