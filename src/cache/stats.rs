//! Cache Statistics Module
//!
//! Counters fed by every read that goes through `get`. `has` and `lookup`
//! are invisible here, except that `has` may still drop a stale entry.

use serde::Serialize;

/// What a single `get` found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOutcome {
    Hit,
    Miss,
    /// Entry was present but stale and has been dropped; also a miss
    Expired,
}

// == Cache Stats ==
/// Snapshot of cache activity since startup.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub hits: u64,
    /// Includes reads that found a stale entry
    pub misses: u64,
    /// Stale entries dropped by a read
    pub expirations: u64,
    /// Entries held when the snapshot was taken, stale ones included
    pub total_entries: usize,
}

impl CacheStats {
    /// Counts one `get`.
    pub fn record(&mut self, outcome: ReadOutcome) {
        match outcome {
            ReadOutcome::Hit => self.hits += 1,
            ReadOutcome::Miss => self.misses += 1,
            ReadOutcome::Expired => {
                self.misses += 1;
                self.expirations += 1;
            }
        }
    }

    /// Counts a stale entry dropped outside `get`.
    pub fn record_eviction(&mut self) {
        self.expirations += 1;
    }

    /// Copy of the counters with `total_entries` filled in.
    pub fn snapshot(&self, total_entries: usize) -> Self {
        Self {
            total_entries,
            ..self.clone()
        }
    }

    /// Share of `get` calls that hit; 0.0 before the first read.
    pub fn hit_rate(&self) -> f64 {
        match self.hits + self.misses {
            0 => 0.0,
            reads => self.hits as f64 / reads as f64,
        }
    }
}
