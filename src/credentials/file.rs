//! JSON file credential backend
//!
//! All keys live in a single flat JSON object. Every write rewrites the file
//! through a temporary sibling and a rename so a crash never leaves a
//! half-written credential file behind.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Context;
use directories::ProjectDirs;
use parking_lot::Mutex;

use crate::credentials::KeyValueStore;
use crate::error::{ParleyError, Result};

/// File name used inside the user data directory.
const CREDENTIALS_FILE: &str = "credentials.json";

/// Credential backend persisting to a JSON file.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process.
    write_lock: Mutex<()>,
}

impl FileStore {
    /// Creates a store in the platform data directory.
    ///
    /// The `PARLEY_CREDENTIALS_PATH` environment variable overrides the
    /// location.
    ///
    /// # Errors
    ///
    /// Returns [`ParleyError::Credentials`] if no data directory can be
    /// determined or created.
    pub fn new() -> Result<Self> {
        if let Ok(override_path) = std::env::var("PARLEY_CREDENTIALS_PATH") {
            return Self::new_with_path(override_path);
        }

        let proj_dirs = ProjectDirs::from("com", "parley", "parley")
            .ok_or_else(|| ParleyError::Credentials("Could not determine data directory".into()))?;

        Self::new_with_path(proj_dirs.data_dir().join(CREDENTIALS_FILE))
    }

    /// Creates a store backed by the given file path.
    ///
    /// The parent directory is created if needed. The file itself is created
    /// lazily on the first write.
    ///
    /// # Examples
    ///
    /// ```
    /// use parley::credentials::{FileStore, KeyValueStore};
    ///
    /// let dir = tempfile::TempDir::new().unwrap();
    /// let store = FileStore::new_with_path(dir.path().join("creds.json")).unwrap();
    /// store.set("user_token", "abc").unwrap();
    /// assert_eq!(store.get("user_token").unwrap().as_deref(), Some("abc"));
    /// ```
    pub fn new_with_path<P: Into<PathBuf>>(path: P) -> Result<Self> {
        let path = path.into();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .context("Failed to create credential directory")
                    .map_err(|e| ParleyError::Credentials(e.to_string()))?;
            }
        }

        Ok(Self {
            path,
            write_lock: Mutex::new(()),
        })
    }

    /// Location of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(ParleyError::Io(e).into()),
        };

        if contents.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        serde_json::from_str(&contents).map_err(|e| {
            ParleyError::Credentials(format!(
                "Corrupt credential file {}: {}",
                self.path.display(),
                e
            ))
            .into()
        })
    }

    fn write_all(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        let json = serde_json::to_string_pretty(entries)?;
        let tmp_path = self.path.with_extension("json.tmp");

        write_private(&tmp_path, json.as_bytes())?;
        std::fs::rename(&tmp_path, &self.path)
            .context("Failed to replace credential file")
            .map_err(|e| ParleyError::Credentials(e.to_string()))?;
        Ok(())
    }

    fn update<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce(&mut BTreeMap<String, String>) -> bool,
    {
        let _guard = self.write_lock.lock();

        let mut entries = self.read_all()?;
        if f(&mut entries) {
            self.write_all(&entries)?;
        }
        Ok(())
    }
}

#[cfg(unix)]
fn write_private(path: &Path, bytes: &[u8]) -> Result<()> {
    use std::io::Write;
    use std::os::unix::fs::OpenOptionsExt;

    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    file.write_all(bytes)?;
    file.sync_all()?;
    Ok(())
}

#[cfg(not(unix))]
fn write_private(path: &Path, bytes: &[u8]) -> Result<()> {
    std::fs::write(path, bytes)?;
    Ok(())
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read_all()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.update(|entries| {
            entries.insert(key.to_string(), value.to_string());
            true
        })
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.update(|entries| entries.remove(key).is_some())
    }

    fn remove_all(&self, keys: &[&str]) -> Result<()> {
        self.update(|entries| {
            let mut changed = false;
            for key in keys {
                changed |= entries.remove(*key).is_some();
            }
            changed
        })
    }
}
