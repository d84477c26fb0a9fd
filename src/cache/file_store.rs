//! File-backed cache store
//!
//! Entries live at `<root>/<h0>/<h1>/<hash>.json`, where `hash` is the hex
//! SHA-256 of the key. Each file holds the expiry timestamp next to the value.
//! Writes go to a temporary file in the target directory and are renamed into
//! place, so readers see either the old entry or the new one.

use chrono::{DateTime, Utc};
use ring::digest::{digest, SHA256};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use super::{CacheStore, Clock, SystemClock, DEFAULT_TTL};
use crate::error::{CacheError, ConfigError};

/// Longest TTL honoured; larger values are clamped
const MAX_TTL: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

/// On-disk record for a single cache entry
#[derive(Debug, Serialize, Deserialize)]
struct CacheRecord<T> {
    /// When the entry was written
    cached_at: DateTime<Utc>,
    /// Entry reads as absent from this instant on
    expires_at: DateTime<Utc>,
    /// The stored value
    value: T,
}

/// Returns the lowercase hex SHA-256 digest of `key`
pub fn hash_key(key: &str) -> String {
    hex::encode(digest(&SHA256, key.as_bytes()).as_ref())
}

/// Cache store persisting entries as JSON files under a root directory
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
    default_ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl FileStore {
    /// Opens a store rooted at an existing, readable and writable directory
    ///
    /// # Errors
    /// Returns `ConfigError` if the path is empty, does not exist, is not a
    /// directory, cannot be listed, or does not accept new files.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let root = root.into();

        if root.as_os_str().is_empty() {
            return Err(ConfigError::new("The cache directory is not specified."));
        }
        if !root.exists() {
            return Err(ConfigError::new(format!(
                "The cache directory {} does not exist.",
                root.display()
            )));
        }
        if !root.is_dir() {
            return Err(ConfigError::new(format!(
                "The cache path {} is not a directory.",
                root.display()
            )));
        }
        if let Err(e) = fs::read_dir(&root) {
            return Err(ConfigError::new(format!(
                "The cache directory {} is not readable: {}",
                root.display(),
                e
            )));
        }
        if let Err(e) = tempfile::tempfile_in(&root) {
            return Err(ConfigError::new(format!(
                "The cache directory {} is not writable: {}",
                root.display(),
                e
            )));
        }

        debug!(path = %root.display(), "File cache opened");

        Ok(Self {
            root,
            default_ttl: DEFAULT_TTL,
            clock: Arc::new(SystemClock),
        })
    }

    /// Overrides the TTL used by `set_default`
    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    /// Replaces the time source used for expiry
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the file path holding the entry for `key`
    pub fn entry_path(&self, key: &str) -> PathBuf {
        let hash = hash_key(key);
        self.shard_dir(&hash).join(format!("{}.json", hash))
    }

    /// Two directory levels from the first two hex characters of the hash
    fn shard_dir(&self, hash: &str) -> PathBuf {
        self.root.join(&hash[0..1]).join(&hash[1..2])
    }
}

impl CacheStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        let path = self.entry_path(key);

        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(_) => {
                debug!(path = %path.display(), "Cache entry not found");
                return None;
            }
        };

        let record: CacheRecord<String> = match serde_json::from_str(&content) {
            Ok(record) => record,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Ignoring unreadable cache entry");
                return None;
            }
        };

        if self.clock.now() >= record.expires_at {
            debug!(path = %path.display(), expires_at = %record.expires_at, "Cache entry expired");
            return None;
        }

        Some(record.value)
    }

    fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let hash = hash_key(key);
        let dir = self.shard_dir(&hash);
        let path = dir.join(format!("{}.json", hash));

        fs::create_dir_all(&dir)?;

        let now = self.clock.now();
        let expires_at = chrono::Duration::from_std(ttl.min(MAX_TTL))
            .ok()
            .and_then(|ttl| now.checked_add_signed(ttl))
            .unwrap_or(now);
        let record = CacheRecord {
            cached_at: now,
            expires_at,
            value,
        };
        let json = serde_json::to_string(&record)?;

        let mut file = NamedTempFile::new_in(&dir)?;
        file.write_all(json.as_bytes())?;
        file.persist(&path)?;

        debug!(path = %path.display(), expires_at = %expires_at, "Cache entry stored");
        Ok(())
    }

    fn default_ttl(&self) -> Duration {
        self.default_ttl
    }
}
