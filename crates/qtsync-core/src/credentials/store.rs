//! Credential persistence abstraction.
//!
//! The lifecycle writes refreshed and rotated tokens back through this
//! trait. The file-backed implementation lives in [`crate::persistence`].

use async_trait::async_trait;

use super::error::CredentialError;
use super::types::CredentialRecord;

#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Load the persisted brokerage credential (empty record if none).
    async fn load_source(&self) -> Result<CredentialRecord, CredentialError>;

    /// Persist the brokerage credential, leaving every other stored value
    /// untouched.
    async fn save_source(&self, record: &CredentialRecord) -> Result<(), CredentialError>;
}
