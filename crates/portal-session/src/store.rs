//! Persistence for the locally issued fallback token.
//!
//! When a user signs in through the backend's own login endpoint (not the
//! external provider), the backend hands back a token. That token must
//! survive a restart, so it lives in a [`TokenStore`]:
//!
//! - [`MemoryTokenStore`] → process memory only (tests, ephemeral tools)
//! - [`FileTokenStore`] → a small JSON file, one key, plain text
//!
//! The store is a leaf: it knows nothing about providers or sessions.
//! Deciding *when* to clear it is the engine's job.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::SessionError;

/// The storage key the token lives under.
pub const TOKEN_STORAGE_KEY: &str = "token";

/// The persisted fallback credential.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRecord {
    pub value: Option<String>,
}

/// Get/set/clear access to the fallback token.
///
/// Methods are synchronous: sign-out must be able to clear the token
/// before it awaits anything.
pub trait TokenStore: Send + Sync + 'static {
    /// The stored token, or `None` if absent or unreadable.
    fn get(&self) -> Option<String>;

    /// Stores `token`, replacing any previous value.
    ///
    /// # Errors
    /// [`SessionError::Storage`] if the value could not be persisted.
    fn set(&self, token: &str) -> Result<(), SessionError>;

    /// Removes the token. Failures are logged, never returned: a token
    /// that can't be removed is still treated as gone by this process.
    fn clear(&self);

    /// The current value as a [`TokenRecord`].
    fn record(&self) -> TokenRecord {
        TokenRecord { value: self.get() }
    }
}

// ---------------------------------------------------------------------------
// MemoryTokenStore
// ---------------------------------------------------------------------------

/// A [`TokenStore`] that forgets everything when the process exits.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that starts out holding `token`.
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Mutex::new(Some(token.into())),
        }
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<String>> {
        // A panic while holding this lock can't leave a half-written
        // Option behind, so a poisoned lock is still usable.
        self.token.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self) -> Option<String> {
        self.slot().clone().filter(|t| !t.is_empty())
    }

    fn set(&self, token: &str) -> Result<(), SessionError> {
        *self.slot() = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) {
        *self.slot() = None;
    }
}

// ---------------------------------------------------------------------------
// FileTokenStore
// ---------------------------------------------------------------------------

/// A [`TokenStore`] backed by a JSON file such as
/// `{ "token": "eyJhbGciOi..." }`.
///
/// The file is a small key-value map, so other keys written by other
/// tools are preserved. The token is stored in plain text.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

type StorageMap = BTreeMap<String, serde_json::Value>;

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_map(&self) -> std::io::Result<StorageMap> {
        match std::fs::read(&self.path) {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map_err(|e| std::io::Error::new(ErrorKind::InvalidData, e)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(StorageMap::new()),
            Err(e) => Err(e),
        }
    }

    /// Writes to a sibling temp file and renames it over the target so a
    /// crash mid-write never leaves a truncated file.
    fn write_map(&self, map: &StorageMap) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let bytes = serde_json::to_vec_pretty(map)
            .map_err(|e| std::io::Error::new(ErrorKind::InvalidData, e))?;
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, bytes)?;
        std::fs::rename(&tmp, &self.path)
    }
}

impl TokenStore for FileTokenStore {
    fn get(&self) -> Option<String> {
        match self.read_map() {
            Ok(map) => map
                .get(TOKEN_STORAGE_KEY)
                .and_then(|v| v.as_str())
                .filter(|t| !t.is_empty())
                .map(str::to_string),
            Err(e) => {
                tracing::error!(path = %self.path.display(), error = %e, "unable to read stored token");
                None
            }
        }
    }

    fn set(&self, token: &str) -> Result<(), SessionError> {
        // An unreadable file is replaced rather than blocking login.
        let mut map = self.read_map().unwrap_or_default();
        map.insert(
            TOKEN_STORAGE_KEY.to_string(),
            serde_json::Value::String(token.to_string()),
        );
        self.write_map(&map).map_err(SessionError::Storage)
    }

    fn clear(&self) {
        let mut map = match self.read_map() {
            Ok(map) => map,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "stored token unreadable, discarding file");
                if let Err(e) = std::fs::remove_file(&self.path) {
                    tracing::error!(error = %e, "unable to remove token file");
                }
                return;
            }
        };
        if map.remove(TOKEN_STORAGE_KEY).is_none() {
            return;
        }
        if let Err(e) = self.write_map(&map) {
            tracing::error!(path = %self.path.display(), error = %e, "unable to remove stored token");
        }
    }
}
