//! Durable secret storage keyed by account identity.
//!
//! [`KeyringStore`] talks to the host keyring; [`MemoryStore`] keeps
//! secrets in process memory for tests. Neither touches the filesystem.

mod error;
mod os_keyring;
#[cfg(test)]
mod memory;

pub use error::{CredentialError, Result};
pub use os_keyring::{DEFAULT_SERVICE, KeyringStore};
#[cfg(test)]
pub use memory::MemoryStore;

/// Storage for one secret per identity.
pub trait CredentialStore {
    /// Store `secret` for `identity`, replacing any previous value.
    fn put(&self, identity: &str, secret: &str) -> Result<()>;

    /// Fetch the secret for `identity`.
    ///
    /// Returns [`CredentialError::NotFound`] when nothing is stored, so
    /// callers can tell a missing entry from an unreachable backend.
    fn get(&self, identity: &str) -> Result<String>;

    /// Remove the secret for `identity`.
    fn delete(&self, identity: &str) -> Result<()>;
}

fn validate(identity: &str, secret: Option<&str>) -> Result<()> {
    if identity.is_empty() {
        return Err(CredentialError::InvalidInput("identity must not be empty"));
    }
    if secret.is_some_and(str::is_empty) {
        return Err(CredentialError::InvalidInput("secret must not be empty"));
    }
    Ok(())
}
