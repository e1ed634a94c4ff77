//! Run configuration.
//!
//! [`TestConfig`] holds every process-wide setting a suite needs: the base
//! URLs of the remote service's four surfaces, admin credentials, timeout
//! and retry counts, and the optional API key / dialog id whose absence is
//! a skip condition rather than a failure. Values come from environment
//! variables read exactly once, in [`TestConfig::from_env`] — the only
//! place in the crate that touches the environment.

use std::time::Duration;

use crate::logging::{log_debug, log_warn};
use crate::retry::RetryPolicy;

/// Read-only settings for one test run.
#[derive(Debug, Clone)]
pub struct TestConfig {
    /// Frontend base URL (`TEST_BASE_URL`).
    pub base_url: String,
    /// End-user API base URL (`TEST_API_BASE_URL`).
    pub api_base_url: String,
    /// Management console base URL (`TEST_MANAGEMENT_URL`).
    pub management_url: String,
    /// Management API base URL (`TEST_MANAGEMENT_API_URL`).
    pub management_api_url: String,
    /// Admin account for the management API (`MANAGEMENT_ADMIN_USERNAME`).
    pub admin_username: String,
    /// Admin password (`MANAGEMENT_ADMIN_PASSWORD`).
    pub admin_password: String,
    /// Default per-request timeout (`TEST_TIMEOUT`, seconds).
    pub timeout: Duration,
    /// Transport retry policy; attempts from `TEST_RETRY_COUNT`.
    pub retry: RetryPolicy,
    /// API key for SDK-style tests; `None` skips them (`TEST_API_KEY`).
    pub api_key: Option<String>,
    /// Dialog id for OpenAI-compatible tests; `None` skips them
    /// (`TEST_DIALOG_ID`).
    pub dialog_id: Option<String>,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost".to_string(),
            api_base_url: "http://localhost:9380".to_string(),
            management_url: "http://localhost:8888".to_string(),
            management_api_url: "http://localhost:5000".to_string(),
            admin_username: "admin".to_string(),
            admin_password: "12345678".to_string(),
            timeout: Duration::from_secs(30),
            retry: RetryPolicy::default(),
            api_key: None,
            dialog_id: None,
        }
    }
}

impl TestConfig {
    /// Load configuration from environment variables, falling back to the
    /// defaults above for anything unset. Unparsable numeric values are
    /// logged and replaced by their default rather than aborting the run.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let timeout_secs = parse_env_u64("TEST_TIMEOUT", defaults.timeout.as_secs());
        let retry_count =
            parse_env_u64("TEST_RETRY_COUNT", u64::from(defaults.retry.max_attempts)) as u32;

        let config = Self {
            base_url: env_or("TEST_BASE_URL", &defaults.base_url),
            api_base_url: env_or("TEST_API_BASE_URL", &defaults.api_base_url),
            management_url: env_or("TEST_MANAGEMENT_URL", &defaults.management_url),
            management_api_url: env_or("TEST_MANAGEMENT_API_URL", &defaults.management_api_url),
            admin_username: env_or("MANAGEMENT_ADMIN_USERNAME", &defaults.admin_username),
            admin_password: env_or("MANAGEMENT_ADMIN_PASSWORD", &defaults.admin_password),
            timeout: Duration::from_secs(timeout_secs),
            retry: RetryPolicy {
                max_attempts: retry_count.max(1),
                ..defaults.retry
            },
            api_key: std::env::var("TEST_API_KEY").ok().filter(|v| !v.is_empty()),
            dialog_id: std::env::var("TEST_DIALOG_ID").ok().filter(|v| !v.is_empty()),
        };

        log_debug!(
            api_base_url = %config.api_base_url,
            management_api_url = %config.management_api_url,
            timeout_seconds = config.timeout.as_secs(),
            retry_attempts = config.retry.max_attempts,
            has_api_key = config.api_key.is_some(),
            has_dialog_id = config.dialog_id.is_some(),
            "Test configuration loaded from environment"
        );

        config
    }

    /// Timeout for file uploads: 3x the default request timeout.
    pub fn upload_timeout(&self) -> Duration {
        self.timeout * 3
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_env_u64(key: &str, default: u64) -> u64 {
    match std::env::var(key) {
        Ok(raw) => match raw.parse::<u64>() {
            Ok(value) => value,
            Err(_) => {
                log_warn!(
                    key = key,
                    value = %raw,
                    default = default,
                    "Ignoring unparsable numeric environment variable"
                );
                default
            }
        },
        Err(_) => default,
    }
}
