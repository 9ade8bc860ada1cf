//! Rate Limit Module
//!
//! Sliding-window request limiting per service id. A single timestamp list
//! per service backs three overlapping windows (minute, hour, day).

mod limiter;

#[cfg(test)]
mod property_tests;

use std::sync::Arc;

use tokio::sync::Mutex;

pub use limiter::{RateLimitConfig, RateLimitDecision, RateLimiter, DAY_MS, HOUR_MS, MINUTE_MS};

/// Rate limiter shared by every handler.
pub type SharedRateLimiter = Arc<Mutex<RateLimiter>>;

/// Creates an empty shared rate limiter.
pub fn shared_rate_limiter() -> SharedRateLimiter {
    Arc::new(Mutex::new(RateLimiter::new()))
}
