use std::time::Duration;

use crate::retry::{is_retryable_status, RetryPolicy};

#[test]
fn default_policy_matches_documented_values() {
    let policy = RetryPolicy::default();
    assert_eq!(policy.max_attempts, 3);
    assert_eq!(policy.initial_delay, Duration::from_secs(1));
    assert_eq!(policy.max_delay, Duration::from_secs(16));
    assert_eq!(policy.backoff_multiplier, 2.0);
}

#[test]
fn retryable_statuses_are_the_transient_five() {
    for status in [429, 500, 502, 503, 504] {
        assert!(is_retryable_status(status), "expected {} retryable", status);
    }
    for status in [200, 201, 301, 400, 401, 403, 404, 422, 501] {
        assert!(
            !is_retryable_status(status),
            "expected {} not retryable",
            status
        );
    }
}

#[test]
fn backoff_doubles_per_attempt_within_jitter() {
    let policy = RetryPolicy::default();

    // Base delays are 1s, 2s, 4s with up to 10% jitter on top.
    for (attempt, base) in [(1u32, 1.0f64), (2, 2.0), (4, 8.0)] {
        let delay = policy.delay_for_attempt(attempt).as_secs_f64();
        assert!(delay >= base, "attempt {}: {} < {}", attempt, delay, base);
        assert!(
            delay <= base * 1.1 + f64::EPSILON,
            "attempt {}: {} > {}",
            attempt,
            delay,
            base * 1.1
        );
    }
}

#[test]
fn backoff_is_capped_at_max_delay() {
    let policy = RetryPolicy::default();

    // Attempt 10 would be 512s uncapped.
    let delay = policy.delay_for_attempt(10).as_secs_f64();
    assert!(delay >= 16.0);
    assert!(delay <= 16.0 * 1.1 + f64::EPSILON);
}

#[test]
fn custom_multiplier_is_respected() {
    let policy = RetryPolicy {
        max_attempts: 5,
        initial_delay: Duration::from_millis(100),
        max_delay: Duration::from_secs(60),
        backoff_multiplier: 3.0,
    };

    let delay = policy.delay_for_attempt(3).as_secs_f64();
    assert!(delay >= 0.9);
    assert!(delay <= 0.9 * 1.1 + f64::EPSILON);
}
