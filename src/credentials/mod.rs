//! Bearer credential persistence
//!
//! The request gateway and the auth client never touch a storage backend
//! directly. They go through [`CredentialStore`], which keeps the bearer token
//! and the user's display name under two fixed keys of a [`KeyValueStore`].
//!
//! # Module Layout
//!
//! - [`file`]       -- JSON file in the user data directory (default backend)
//! - [`memory`]     -- in-process map, used by tests and `--credentials memory`
//! - [`os_keyring`] -- OS native credential store

pub mod file;
pub mod memory;
pub mod os_keyring;

use std::sync::Arc;

use crate::config::{CredentialBackend, CredentialsConfig};
use crate::error::Result;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use os_keyring::KeyringStore;

/// Key under which the bearer token is stored.
pub const TOKEN_KEY: &str = "user_token";

/// Key under which the display name is stored.
pub const NAME_KEY: &str = "user_name";

/// Durable string key-value store.
///
/// Implementations must treat removing an absent key as success.
pub trait KeyValueStore: Send + Sync + std::fmt::Debug {
    /// Returns the value stored under `key`, or `None` when absent.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Removes `key`. A missing key is not an error.
    fn remove(&self, key: &str) -> Result<()>;

    /// Removes every key in `keys`.
    ///
    /// Backends that can apply this as one write override it so readers
    /// never see a partial removal. The default attempts each removal and
    /// returns the first error.
    fn remove_all(&self, keys: &[&str]) -> Result<()> {
        keys.iter()
            .map(|key| self.remove(key))
            .fold(Ok(()), |first, next| first.and(next))
    }
}

/// Typed accessor for the token/name pair.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use parley::credentials::{CredentialStore, MemoryStore};
///
/// let store = CredentialStore::new(Arc::new(MemoryStore::new()));
/// store.save("tok", "Ana").unwrap();
/// assert_eq!(store.token().unwrap().as_deref(), Some("tok"));
///
/// store.clear().unwrap();
/// assert!(store.token().unwrap().is_none());
/// assert!(store.display_name().unwrap().is_none());
/// ```
#[derive(Debug, Clone)]
pub struct CredentialStore {
    backend: Arc<dyn KeyValueStore>,
}

impl CredentialStore {
    /// Wraps an existing backend.
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self { backend }
    }

    /// Builds the backend selected by configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the file backend cannot determine or create its
    /// data directory.
    pub fn from_config(config: &CredentialsConfig) -> Result<Self> {
        let backend: Arc<dyn KeyValueStore> = match config.backend {
            CredentialBackend::File => match &config.path {
                Some(path) => Arc::new(FileStore::new_with_path(path)?),
                None => Arc::new(FileStore::new()?),
            },
            CredentialBackend::Keyring => Arc::new(KeyringStore::new()),
            CredentialBackend::Memory => Arc::new(MemoryStore::new()),
        };
        tracing::debug!("Using {:?} credential backend", config.backend);
        Ok(Self::new(backend))
    }

    /// Current bearer token, if logged in.
    pub fn token(&self) -> Result<Option<String>> {
        self.backend.get(TOKEN_KEY)
    }

    /// Display name saved alongside the token.
    pub fn display_name(&self) -> Result<Option<String>> {
        self.backend.get(NAME_KEY)
    }

    /// Persists a freshly issued token and its display name.
    pub fn save(&self, token: &str, display_name: &str) -> Result<()> {
        self.backend.set(TOKEN_KEY, token)?;
        self.backend.set(NAME_KEY, display_name)
    }

    /// Removes both token and display name in one backend operation.
    pub fn clear(&self) -> Result<()> {
        self.backend.remove_all(&[TOKEN_KEY, NAME_KEY])
    }
}
