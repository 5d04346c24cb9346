use std::collections::HashMap;
use std::sync::Mutex;

use super::{CredentialError, CredentialStore, Result, validate};

/// In-process credential store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    secrets: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_secret(identity: &str, secret: &str) -> Self {
        let store = Self::new();
        store
            .lock()
            .insert(identity.to_string(), secret.to_string());
        store
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.secrets
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl CredentialStore for MemoryStore {
    fn put(&self, identity: &str, secret: &str) -> Result<()> {
        validate(identity, Some(secret))?;
        self.lock()
            .insert(identity.to_string(), secret.to_string());
        Ok(())
    }

    fn get(&self, identity: &str) -> Result<String> {
        validate(identity, None)?;
        self.lock()
            .get(identity)
            .cloned()
            .ok_or_else(|| CredentialError::NotFound(identity.to_string()))
    }

    fn delete(&self, identity: &str) -> Result<()> {
        validate(identity, None)?;
        self.lock()
            .remove(identity)
            .map(|_| ())
            .ok_or_else(|| CredentialError::NotFound(identity.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::simple("me@example.com", "ghp_token")]
    #[case::unicode("ユーザー@example.com", "sëcret with spaces")]
    #[case::symbols("a+b@example.com", "!@#$%^&*()\"'\\")]
    #[case::whitespace_identity(" ", "token")]
    fn put_then_get_returns_same_secret(#[case] identity: &str, #[case] secret: &str) {
        let store = MemoryStore::new();

        store.put(identity, secret).unwrap();

        assert_eq!(store.get(identity).unwrap(), secret);
    }

    #[test]
    fn put_replaces_previous_secret() {
        let store = MemoryStore::with_secret("me@example.com", "old");

        store.put("me@example.com", "new").unwrap();

        assert_eq!(store.get("me@example.com").unwrap(), "new");
    }

    #[test]
    fn get_unknown_identity_is_not_found() {
        let store = MemoryStore::with_secret("someone@example.com", "token");

        let err = store.get("me@example.com").unwrap_err();

        assert!(matches!(err, CredentialError::NotFound(id) if id == "me@example.com"));
    }

    #[test]
    fn delete_removes_secret() {
        let store = MemoryStore::with_secret("me@example.com", "token");

        store.delete("me@example.com").unwrap();

        assert!(matches!(
            store.get("me@example.com"),
            Err(CredentialError::NotFound(_))
        ));
        assert!(matches!(
            store.delete("me@example.com"),
            Err(CredentialError::NotFound(_))
        ));
    }
}
