use keyring::Entry;
use tracing::debug;

use super::{CredentialError, CredentialStore, Result, validate};

/// Service name the token is filed under by default.
pub const DEFAULT_SERVICE: &str = "git_token";

/// Secrets kept in the host keyring, one entry per identity.
///
/// On Linux the kernel keyring caches entries held by the Secret Service,
/// so a stored token outlives reboots.
#[derive(Debug, Clone)]
pub struct KeyringStore {
    service: String,
}

impl KeyringStore {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    fn entry(&self, identity: &str) -> Result<Entry> {
        Entry::new(&self.service, identity).map_err(|e| map_error(identity, e))
    }
}

impl Default for KeyringStore {
    fn default() -> Self {
        Self::new(DEFAULT_SERVICE)
    }
}

impl CredentialStore for KeyringStore {
    fn put(&self, identity: &str, secret: &str) -> Result<()> {
        validate(identity, Some(secret))?;
        debug!(service = %self.service, identity, "storing secret in keyring");
        self.entry(identity)?
            .set_password(secret)
            .map_err(|e| map_error(identity, e))
    }

    fn get(&self, identity: &str) -> Result<String> {
        validate(identity, None)?;
        debug!(service = %self.service, identity, "reading secret from keyring");
        self.entry(identity)?
            .get_password()
            .map_err(|e| map_error(identity, e))
    }

    fn delete(&self, identity: &str) -> Result<()> {
        validate(identity, None)?;
        self.entry(identity)?
            .delete_credential()
            .map_err(|e| map_error(identity, e))
    }
}

fn map_error(identity: &str, err: keyring::Error) -> CredentialError {
    match err {
        keyring::Error::NoEntry => CredentialError::NotFound(identity.to_string()),
        other => CredentialError::Backend(other.to_string()),
    }
}
