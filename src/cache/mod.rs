//! Cache Module
//!
//! Provides an in-memory cache with per-entry TTL and lazy expiry.
//! There is no background sweeper: stale entries are dropped when a read
//! notices them.

mod entry;
mod stats;
mod store;


use std::sync::Arc;

use tokio::sync::RwLock;

// Re-export public types
pub use entry::{current_timestamp_ms, CacheEntry};
pub use stats::{CacheStats, ReadOutcome};
pub use store::{CacheLookup, CacheStore};

/// Process-wide cache shared by every handler.
pub type SharedCache = Arc<RwLock<CacheStore<serde_json::Value>>>;

/// Creates an empty shared cache.
pub fn shared_cache() -> SharedCache {
    Arc::new(RwLock::new(CacheStore::new()))
}
