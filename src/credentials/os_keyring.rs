//! Credential persistence via the OS keyring
//!
//! Uses the operating system's native credential store (Keychain on macOS,
//! Secret Service on Linux, Windows Credential Manager on Windows). Each key
//! becomes its own keyring entry under a shared service name, so clearing the
//! token never touches unrelated secrets.

use crate::credentials::KeyValueStore;
use crate::error::{ParleyError, Result};

/// Service name used when the caller does not supply one.
const DEFAULT_SERVICE: &str = "parley";

/// Stateless accessor for the OS native keyring.
///
/// # Examples
///
/// ```no_run
/// use parley::credentials::{KeyValueStore, KeyringStore};
///
/// let store = KeyringStore::new();
/// store.set("user_token", "abc").unwrap();
/// assert_eq!(store.get("user_token").unwrap().as_deref(), Some("abc"));
/// ```
#[derive(Debug, Clone)]
pub struct KeyringStore {
    service: String,
}

impl KeyringStore {
    /// Creates a store under the default `parley` service name.
    pub fn new() -> Self {
        Self::with_service(DEFAULT_SERVICE)
    }

    /// Creates a store under a custom service name.
    pub fn with_service(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    fn entry(&self, key: &str) -> Result<keyring::Entry> {
        keyring::Entry::new(&self.service, key).map_err(|e| ParleyError::Keyring(e).into())
    }
}

impl Default for KeyringStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyValueStore for KeyringStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        match self.entry(key)?.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(ParleyError::Keyring(e).into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entry(key)?
            .set_password(value)
            .map_err(ParleyError::Keyring)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        match self.entry(key)?.delete_password() {
            Ok(()) => Ok(()),
            Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(ParleyError::Keyring(e).into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_service_name() {
        assert_eq!(KeyringStore::new().service, "parley");
    }

    #[test]
    fn test_custom_service_name() {
        assert_eq!(KeyringStore::with_service("other").service, "other");
    }

    #[test]
    #[ignore = "requires system keyring"]
    fn test_set_get_remove_via_keyring() {
        let store = KeyringStore::with_service("parley-test");
        store.set("user_token", "integration").expect("set");
        assert_eq!(
            store.get("user_token").expect("get").as_deref(),
            Some("integration")
        );
        store.remove("user_token").expect("remove");
        assert!(store.get("user_token").expect("get after remove").is_none());
    }

    #[test]
    #[ignore = "requires system keyring"]
    fn test_remove_is_idempotent() {
        let store = KeyringStore::with_service("parley-test-idempotent");
        store.remove("user_token").expect("first remove");
        store.remove("user_token").expect("second remove is no-op");
    }
}
