//! Transport-level retry policy.
//!
//! The client retries a request on the transient status codes
//! {429, 500, 502, 503, 504} with exponential backoff and jitter. This is a
//! connection-level policy: a retry re-sends the identical request, never a
//! logically different one, and only for verbs that are safe to re-issue.

use std::time::Duration;

/// Status codes that trigger an automatic retry.
const RETRYABLE_STATUSES: [u16; 5] = [429, 500, 502, 503, 504];

/// Retry configuration applied by [`crate::client::ApiClient`].
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the first.
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Cap on the delay between retries.
    pub max_delay: Duration,
    /// Multiplier for exponential backoff.
    pub backoff_multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(16),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (1-based), capped at
    /// `max_delay`, with up to 10% jitter to avoid thundering herds.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1) as i32;
        let delay_seconds =
            self.initial_delay.as_secs_f64() * self.backoff_multiplier.powi(exponent);
        let capped = delay_seconds.min(self.max_delay.as_secs_f64());

        let jitter = fastrand::f64() * 0.1;
        Duration::from_secs_f64(capped * (1.0 + jitter))
    }
}

/// Whether a response status should trigger an automatic retry.
pub fn is_retryable_status(status: u16) -> bool {
    RETRYABLE_STATUSES.contains(&status)
}
