//! Sliding-window limiter over a per-service timestamp list.

use std::collections::{HashMap, VecDeque};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::cache::current_timestamp_ms;

pub const MINUTE_MS: u64 = 60 * 1000;
pub const HOUR_MS: u64 = 60 * MINUTE_MS;
pub const DAY_MS: u64 = 24 * HOUR_MS;

// == Rate Limit Config ==
/// Request budget for one service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitConfig {
    pub requests_per_minute: usize,
    pub requests_per_hour: usize,
    pub requests_per_day: usize,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_minute: 60,
            requests_per_hour: 1000,
            requests_per_day: 10_000,
        }
    }
}

// == Decision ==
/// Outcome of a rate limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitDecision {
    /// Request admitted and recorded
    Allowed,
    /// Request rejected; `reset_at_ms` is when the oldest counted request
    /// leaves the rejecting window
    Limited { reset_at_ms: u64 },
}

impl RateLimitDecision {
    /// Returns true if the request was admitted.
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateLimitDecision::Allowed)
    }
}

// == Rate Limiter ==
/// Per-service sliding-window limiter.
///
/// Each service keeps an ascending list of admitted request times, pruned to
/// the trailing 24 hours on every check. Growth within a day is linear in the
/// number of admitted requests.
#[derive(Debug, Default)]
pub struct RateLimiter {
    windows: HashMap<String, VecDeque<u64>>,
}

impl RateLimiter {
    // == Constructor ==
    /// Creates a limiter with no recorded requests.
    pub fn new() -> Self {
        Self::default()
    }

    // == Check ==
    /// Checks and records a request for `service_id` at the current time.
    pub fn check(&mut self, service_id: &str, limits: &RateLimitConfig) -> RateLimitDecision {
        self.check_at(service_id, limits, current_timestamp_ms())
    }

    /// Checks and records a request for `service_id` at `now`.
    ///
    /// Windows are evaluated minute, hour, then day. The first window whose
    /// count is at or over its limit rejects the request.
    pub fn check_at(
        &mut self,
        service_id: &str,
        limits: &RateLimitConfig,
        now: u64,
    ) -> RateLimitDecision {
        let requests = self.windows.entry(service_id.to_string()).or_default();

        // Keep only the trailing 24h
        let day_start = now.saturating_sub(DAY_MS);
        while requests.front().is_some_and(|&t| t <= day_start) {
            requests.pop_front();
        }

        let windows = [
            (MINUTE_MS, limits.requests_per_minute),
            (HOUR_MS, limits.requests_per_hour),
            (DAY_MS, limits.requests_per_day),
        ];

        for (span, limit) in windows {
            let start = now.saturating_sub(span);
            let in_window = requests.iter().filter(|&&t| t > start);
            let count = in_window.clone().count();

            if count >= limit {
                let oldest = in_window.min().copied().unwrap_or(now);
                let reset_at_ms = oldest + span;
                warn!(
                    service_id,
                    window_ms = span,
                    count,
                    limit,
                    reset_at_ms,
                    "rate limit exceeded"
                );
                return RateLimitDecision::Limited { reset_at_ms };
            }
        }

        requests.push_back(now);
        RateLimitDecision::Allowed
    }

    // == Reset ==
    /// Forgets every recorded request for `service_id`.
    pub fn reset(&mut self, service_id: &str) {
        self.windows.remove(service_id);
    }

    /// Number of requests currently retained for `service_id`.
    pub fn tracked(&self, service_id: &str) -> usize {
        self.windows.get(service_id).map_or(0, VecDeque::len)
    }
}
