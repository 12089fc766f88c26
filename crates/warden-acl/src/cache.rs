//! Cache store port used to memoize effective permission sets

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::RwLock;

use crate::error::Result;

/// Key-value store with per-entry expiry.
///
/// Values are JSON so any backend that can hold a string can implement this.
pub trait CacheStore: Send + Sync {
    /// Fetch a live value
    fn get(&self, key: &str) -> Result<Option<serde_json::Value>>;

    /// Store a value for `ttl`
    fn put(&self, key: &str, value: serde_json::Value, ttl: Duration) -> Result<()>;

    /// Drop a value, returning whether one was present
    fn forget(&self, key: &str) -> Result<bool>;
}

/// Cached value and its expiry
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub value: serde_json::Value,
    /// None when the TTL reaches past what `Instant` can represent
    pub expires_at: Option<Instant>,
}

impl CacheEntry {
    pub fn new(value: serde_json::Value, ttl: Duration) -> Self {
        Self {
            value,
            expires_at: Instant::now().checked_add(ttl),
        }
    }

    /// An entry is dead from its expiry instant on
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(expires_at) => Instant::now() >= expires_at,
            None => false,
        }
    }
}

/// In-memory cache store
#[derive(Default)]
pub struct MemoryCacheStore {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries, expired ones included until touched
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries
            .read()
            .get(key)
            .map(|entry| !entry.is_expired())
            .unwrap_or(false)
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }
}

impl CacheStore for MemoryCacheStore {
    fn get(&self, key: &str) -> Result<Option<serde_json::Value>> {
        {
            let entries = self.entries.read();
            match entries.get(key) {
                None => return Ok(None),
                Some(entry) if !entry.is_expired() => return Ok(Some(entry.value.clone())),
                Some(_) => {}
            }
        }

        // Expired: evict so the map does not grow with dead keys. The entry may
        // have been replaced between the two locks.
        let mut entries = self.entries.write();
        match entries.get(key).map(CacheEntry::is_expired) {
            Some(false) => Ok(entries.get(key).map(|entry| entry.value.clone())),
            Some(true) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    fn put(&self, key: &str, value: serde_json::Value, ttl: Duration) -> Result<()> {
        self.entries
            .write()
            .insert(key.to_string(), CacheEntry::new(value, ttl));
        Ok(())
    }

    fn forget(&self, key: &str) -> Result<bool> {
        Ok(self.entries.write().remove(key).is_some())
    }
}
