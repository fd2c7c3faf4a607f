//! Durable key-value cache.
//!
//! Backs sign-up resumability: the identity candidate gathered in the
//! sign-up form survives a full reload so the flow can reopen at the
//! profile step once the email is verified. The storage medium is an
//! implementation choice behind [`DurableCache`].

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

/// Cache keys used by the sign-up flow.
pub mod keys {
    /// Email candidate gathered in the sign-up form.
    pub const PENDING_EMAIL: &str = "pending_email";

    /// Full-name candidate gathered in the sign-up form.
    pub const PENDING_NAME: &str = "pending_name";

    /// `"true"` once the email has been verified.
    pub const EMAIL_VERIFIED: &str = "email_verified";
}

/// A key-value store whose contents survive a full reload.
///
/// Reads and writes are best-effort: implementations log failures rather
/// than surfacing them, matching how a browser's local storage is used.
pub trait DurableCache: Send + Sync {
    /// Get the value for `key`, if present.
    fn get(&self, key: &str) -> Option<String>;

    /// Set `key` to `value`.
    fn set(&self, key: &str, value: &str);

    /// Remove `key` if present.
    fn remove(&self, key: &str);
}

/// In-memory cache for tests and ephemeral embedders.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl DurableCache for MemoryCache {
    fn get(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_owned(), value.to_owned());
    }

    fn remove(&self, key: &str) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
    }
}

/// File-backed cache persisting entries as a JSON object.
///
/// Every mutation writes through to disk. A missing or unreadable file
/// degrades to an empty cache with a warning.
#[derive(Debug)]
pub struct FileCache {
    path: PathBuf,
    entries: Mutex<HashMap<String, String>>,
}

impl FileCache {
    /// Open a cache at `path`, loading any existing entries.
    #[must_use]
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let entries = match std::fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(entries) => entries,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "cache file unreadable, starting empty");
                    HashMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "cache file unreadable, starting empty");
                HashMap::new()
            }
        };

        Self {
            path,
            entries: Mutex::new(entries),
        }
    }

    fn persist(&self, entries: &HashMap<String, String>) {
        let json = match serde_json::to_string_pretty(entries) {
            Ok(json) => json,
            Err(e) => {
                tracing::error!(error = %e, "failed to serialize cache");
                return;
            }
        };

        if let Err(e) = std::fs::write(&self.path, json) {
            tracing::error!(path = %self.path.display(), error = %e, "failed to write cache file");
        }
    }
}

impl DurableCache for FileCache {
    fn get(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_owned(), value.to_owned());
        self.persist(&entries);
    }

    fn remove(&self, key: &str) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        if entries.remove(key).is_some() {
            self.persist(&entries);
        }
    }
}
