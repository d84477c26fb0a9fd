//! Cache stores for serialized responses
//!
//! Two stores satisfy the `CacheStore` contract: `NullStore`, used when caching
//! is disabled, and `FileStore`, which persists one JSON file per key with an
//! expiry timestamp. Expired entries read as absent and are left on disk until
//! the next write for the same key replaces them.

mod file_store;

pub use file_store::{hash_key, FileStore};

use chrono::{DateTime, Utc};
use std::fmt::Debug;
use std::time::Duration;

use crate::error::CacheError;

/// Default time-to-live for cache entries (3 hours)
pub const DEFAULT_TTL: Duration = Duration::from_secs(3 * 60 * 60);

/// Key-value store with per-entry expiry
pub trait CacheStore: Send + Sync + Debug {
    /// Returns the stored value, or `None` when the entry is missing, unreadable or expired
    fn get(&self, key: &str) -> Option<String>;

    /// Stores `value` under `key` for `ttl`, replacing any previous entry
    fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError>;

    /// TTL applied by [`CacheStore::set_default`]
    fn default_ttl(&self) -> Duration {
        DEFAULT_TTL
    }

    fn set_default(&self, key: &str, value: &str) -> Result<(), CacheError> {
        self.set(key, value, self.default_ttl())
    }
}

/// Store used when caching is disabled: never holds anything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullStore;

impl CacheStore for NullStore {
    fn get(&self, _key: &str) -> Option<String> {
        None
    }

    fn set(&self, _key: &str, _value: &str, _ttl: Duration) -> Result<(), CacheError> {
        Ok(())
    }
}

/// Source of the current time for expiry checks
pub trait Clock: Send + Sync + Debug {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to
#[cfg(test)]
#[derive(Debug)]
pub(crate) struct ManualClock(std::sync::Mutex<DateTime<Utc>>);

#[cfg(test)]
impl ManualClock {
    pub(crate) fn new(start: DateTime<Utc>) -> Self {
        Self(std::sync::Mutex::new(start))
    }

    pub(crate) fn advance(&self, by: Duration) {
        let mut now = self.0.lock().unwrap();
        *now += chrono::Duration::from_std(by).unwrap();
    }
}

#[cfg(test)]
impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.0.lock().unwrap()
    }
}
