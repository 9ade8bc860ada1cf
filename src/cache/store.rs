//! Cache Store Module
//!
//! Main cache engine: a HashMap of TTL-stamped entries with lazy expiry.

use std::collections::HashMap;

use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

use crate::cache::{current_timestamp_ms, CacheEntry, CacheStats, ReadOutcome};

// == Cache Lookup ==
/// Result of a non-evicting read.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheLookup<V> {
    /// Entry present and within its TTL
    Fresh(V),
    /// Entry present but past its TTL; kept for degraded fallback
    Stale(V),
    /// No entry under this key
    Miss,
}

impl<V> CacheLookup<V> {
    /// Returns the value only if fresh.
    pub fn fresh(self) -> Option<V> {
        match self {
            CacheLookup::Fresh(value) => Some(value),
            _ => None,
        }
    }

    /// Returns the value whether fresh or stale.
    pub fn any(self) -> Option<V> {
        match self {
            CacheLookup::Fresh(value) | CacheLookup::Stale(value) => Some(value),
            CacheLookup::Miss => None,
        }
    }
}

// == Cache Store ==
/// In-memory key-value storage with per-entry TTL.
#[derive(Debug)]
pub struct CacheStore<V> {
    /// Key-value storage
    entries: HashMap<String, CacheEntry<V>>,
    /// Performance statistics
    stats: CacheStats,
}

impl<V> Default for CacheStore<V> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
            stats: CacheStats::default(),
        }
    }
}

impl<V: Clone> CacheStore<V> {
    // == Constructor ==
    /// Creates an empty CacheStore.
    pub fn new() -> Self {
        Self::default()
    }

    // == Set ==
    /// Stores a value under `key` for `ttl_ms` milliseconds.
    ///
    /// Overwriting an existing key replaces the value and restarts its TTL.
    pub fn set(&mut self, key: impl Into<String>, value: V, ttl_ms: u64) {
        self.set_at(key, value, ttl_ms, current_timestamp_ms());
    }

    /// Same as [`CacheStore::set`] with an explicit creation time.
    pub fn set_at(&mut self, key: impl Into<String>, value: V, ttl_ms: u64, now: u64) {
        self.entries
            .insert(key.into(), CacheEntry::created_at(value, ttl_ms, now));
    }

    // == Get ==
    /// Retrieves a value by key.
    ///
    /// Returns the value while `now - created_at <= ttl`. A stale entry is
    /// removed and reported as a miss.
    pub fn get(&mut self, key: &str) -> Option<V> {
        self.get_at(key, current_timestamp_ms())
    }

    /// Same as [`CacheStore::get`] evaluated at `now`.
    pub fn get_at(&mut self, key: &str, now: u64) -> Option<V> {
        match self.entries.get(key) {
            Some(entry) if entry.is_fresh_at(now) => {
                let value = entry.value.clone();
                self.stats.record(ReadOutcome::Hit);
                debug!(key, "cache hit");
                Some(value)
            }
            Some(_) => {
                self.entries.remove(key);
                self.stats.record(ReadOutcome::Expired);
                debug!(key, "cache miss (expired)");
                None
            }
            None => {
                self.stats.record(ReadOutcome::Miss);
                debug!(key, "cache miss");
                None
            }
        }
    }

    // == Has ==
    /// Mirrors `get`'s validity check without returning data.
    ///
    /// Stale entries are evicted here too. Hits and misses are not counted.
    pub fn has(&mut self, key: &str) -> bool {
        self.has_at(key, current_timestamp_ms())
    }

    /// Same as [`CacheStore::has`] evaluated at `now`.
    pub fn has_at(&mut self, key: &str, now: u64) -> bool {
        match self.entries.get(key) {
            Some(entry) if entry.is_fresh_at(now) => true,
            Some(_) => {
                self.entries.remove(key);
                self.stats.record_eviction();
                false
            }
            None => false,
        }
    }

    // == Lookup ==
    /// Reads an entry without evicting it, distinguishing fresh from stale.
    ///
    /// This is the only way to reach a stale value; callers use it to serve
    /// expired data when the upstream refresh fails.
    pub fn lookup(&self, key: &str) -> CacheLookup<V> {
        self.lookup_at(key, current_timestamp_ms())
    }

    /// Same as [`CacheStore::lookup`] evaluated at `now`.
    pub fn lookup_at(&self, key: &str, now: u64) -> CacheLookup<V> {
        match self.entries.get(key) {
            Some(entry) if entry.is_fresh_at(now) => CacheLookup::Fresh(entry.value.clone()),
            Some(entry) => CacheLookup::Stale(entry.value.clone()),
            None => CacheLookup::Miss,
        }
    }

    // == Delete ==
    /// Removes an entry unconditionally. Returns whether the key existed.
    pub fn delete(&mut self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    // == Clear ==
    /// Removes every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        self.stats.snapshot(self.entries.len())
    }

    // == Length ==
    /// Returns the number of stored entries, stale ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when no entries are stored.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// == Typed Access ==
impl CacheStore<serde_json::Value> {
    /// Fresh read decoded into `T`. A value of the wrong shape is a miss.
    pub fn get_as<T: DeserializeOwned>(&mut self, key: &str) -> Option<T> {
        let value = self.get(key)?;
        match serde_json::from_value(value) {
            Ok(decoded) => Some(decoded),
            Err(err) => {
                debug!(key, error = %err, "cached value has unexpected shape");
                None
            }
        }
    }

    /// Non-evicting read decoded into `T`.
    pub fn lookup_as<T: DeserializeOwned>(&self, key: &str) -> CacheLookup<T> {
        match self.lookup(key) {
            CacheLookup::Fresh(value) => serde_json::from_value(value)
                .map(CacheLookup::Fresh)
                .unwrap_or(CacheLookup::Miss),
            CacheLookup::Stale(value) => serde_json::from_value(value)
                .map(CacheLookup::Stale)
                .unwrap_or(CacheLookup::Miss),
            CacheLookup::Miss => CacheLookup::Miss,
        }
    }

    /// Encodes `value` and stores it. Values that fail to encode are skipped.
    pub fn set_as<T: Serialize>(&mut self, key: impl Into<String>, value: &T, ttl_ms: u64) {
        let key = key.into();
        match serde_json::to_value(value) {
            Ok(encoded) => self.set(key, encoded, ttl_ms),
            Err(err) => debug!(key = %key, error = %err, "value not cacheable"),
        }
    }
}
