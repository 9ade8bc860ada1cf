//! Property-Based Tests for the rate limiter

use proptest::prelude::*;

use crate::rate_limit::{RateLimitConfig, RateLimitDecision, RateLimiter, MINUTE_MS};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // With perMinute = N, N calls inside one minute pass and the next one is
    // rejected with a reset no more than a minute ahead.
    #[test]
    fn prop_n_plus_one_within_minute_is_rejected(
        n in 1usize..20,
        start in MINUTE_MS..1_000_000_000u64,
        gaps in prop::collection::vec(0u64..1_000, 20),
    ) {
        let limits = RateLimitConfig {
            requests_per_minute: n,
            requests_per_hour: 1_000,
            requests_per_day: 10_000,
        };
        let mut limiter = RateLimiter::new();
        let mut now = start;

        for gap in gaps.iter().take(n) {
            now += gap;
            prop_assert!(limiter.check_at("svc", &limits, now).is_allowed());
        }

        now += 1;
        prop_assume!(now - start < MINUTE_MS);
        match limiter.check_at("svc", &limits, now) {
            RateLimitDecision::Limited { reset_at_ms } => {
                prop_assert!(reset_at_ms > now);
                prop_assert!(reset_at_ms <= now + MINUTE_MS);
            }
            RateLimitDecision::Allowed => prop_assert!(false, "call {} must be rejected", n + 1),
        }
    }

    // Calls spaced more than a minute apart never trip a per-minute limit of 1.
    #[test]
    fn prop_spaced_calls_always_pass(
        count in 1usize..30,
        spacing in (MINUTE_MS + 1)..(2 * MINUTE_MS),
    ) {
        let limits = RateLimitConfig {
            requests_per_minute: 1,
            requests_per_hour: 1_000,
            requests_per_day: 10_000,
        };
        let mut limiter = RateLimiter::new();

        for i in 0..count as u64 {
            prop_assert!(limiter.check_at("svc", &limits, 1_000 + i * spacing).is_allowed());
        }
    }
}
