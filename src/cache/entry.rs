//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.

// == Cache Entry ==
/// Represents a single cache entry with value and metadata.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The stored value
    pub value: V,
    /// Creation timestamp (Unix milliseconds)
    pub created_at: u64,
    /// Time to live in milliseconds
    pub ttl_ms: u64,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates a cache entry stamped with `created_at`.
    pub fn created_at(value: V, ttl_ms: u64, created_at: u64) -> Self {
        Self {
            value,
            created_at,
            ttl_ms,
        }
    }

    // == Is Fresh ==
    /// Checks whether the entry is still valid at `now`.
    ///
    /// Boundary condition: an entry whose age equals its TTL is still fresh.
    /// It expires strictly after `created_at + ttl_ms`.
    pub fn is_fresh_at(&self, now: u64) -> bool {
        now.saturating_sub(self.created_at) <= self.ttl_ms
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or(0)
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;
    use std::time::Duration;

    #[test]
    fn test_entry_creation() {
        let entry = CacheEntry::created_at("test_value".to_string(), 60_000, current_timestamp_ms());

        assert_eq!(entry.value, "test_value");
        assert_eq!(entry.ttl_ms, 60_000);
        assert!(entry.is_fresh_at(current_timestamp_ms()));
    }

    #[test]
    fn test_entry_goes_stale_on_wall_clock() {
        let entry = CacheEntry::created_at("test_value".to_string(), 50, current_timestamp_ms());

        sleep(Duration::from_millis(120));

        assert!(!entry.is_fresh_at(current_timestamp_ms()));
    }

    #[test]
    fn test_clock_before_creation_is_fresh() {
        let entry = CacheEntry::created_at("v", 10, 1_000);
        assert!(entry.is_fresh_at(500));
    }

    #[test]
    fn test_freshness_boundary_condition() {
        let entry = CacheEntry::created_at("test".to_string(), 1_000, 5_000);

        assert!(entry.is_fresh_at(5_000));
        assert!(entry.is_fresh_at(6_000), "age == ttl is still fresh");
        assert!(!entry.is_fresh_at(6_001), "age > ttl is expired");
    }

    #[test]
    fn test_zero_ttl_is_fresh_only_at_creation_instant() {
        let entry = CacheEntry::created_at(1u8, 0, 100);
        assert!(entry.is_fresh_at(100));
        assert!(!entry.is_fresh_at(101));
    }
}
