//! Error types for harness operations.
//!
//! The single error type is [`ApiError`], covering the failure modes a test
//! run can hit outside of its own assertions:
//! - Configuration errors (bad base URL, unparsable settings)
//! - Transport failures (network issues, timeouts)
//! - Rate limiting reported by the remote service
//! - Authentication failures
//! - Setup failures (a fixture could not create its resource)
//!
//! Assertion failures are not errors: the helpers in [`crate::asserts`]
//! panic with composed diagnostics, which is how the test runner reports
//! them. Teardown failures are logged and suppressed inside the fixture
//! layer and never surface as `ApiError`.
//!
//! Constructor methods log at the appropriate level as a side effect, so an
//! error is visible in the run log even when a caller converts or drops it.

use crate::logging::{log_error, log_warn};
use thiserror::Error;

/// Convenient result type for harness operations.
pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Errors that can occur while driving the remote RAG service.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Harness configuration is invalid or incomplete.
    #[error("Configuration error: {message}")]
    ConfigurationError {
        /// Description of the configuration problem.
        message: String,
    },

    /// The HTTP request failed at the transport level.
    ///
    /// Connection refused, DNS failure, TLS problems. The response never
    /// arrived, so there is no status code to inspect.
    #[error("Request failed: {message}")]
    RequestFailed {
        /// Description of the failure.
        message: String,
        /// The underlying transport error, if available.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The response body could not be parsed as the expected shape.
    #[error("Response parsing failed: {message}")]
    ResponseParsingError {
        /// Details about the parsing failure.
        message: String,
    },

    /// The remote service is throttling requests.
    #[error("Rate limit exceeded, retry after {retry_after_seconds}s")]
    RateLimitExceeded {
        /// Recommended wait time before retrying.
        retry_after_seconds: u64,
    },

    /// A request or polling loop exceeded its time budget.
    #[error("Timed out after {timeout_seconds}s")]
    Timeout {
        /// The budget that was exceeded.
        timeout_seconds: u64,
    },

    /// Authentication with the remote service failed.
    #[error("Authentication failed: {message}")]
    AuthenticationFailed {
        /// Details about the authentication failure.
        message: String,
    },

    /// A fixture could not create or acquire its resource.
    ///
    /// Distinct from [`ApiError::RequestFailed`]: the request round-tripped
    /// fine but the service refused the creation, so the test body cannot
    /// run. Fixture constructors produce this with the offending response
    /// body attached for a clear failure message.
    #[error("Fixture setup failed: {message}")]
    SetupFailed {
        /// Context plus the response that refused the setup call.
        message: String,
    },
}

impl ApiError {
    /// Whether this error is transient and worth retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RateLimitExceeded { .. } | Self::Timeout { .. } | Self::RequestFailed { .. }
        )
    }

    // =========================================================================
    // Constructor methods with automatic logging
    // =========================================================================

    pub fn configuration_error(message: impl Into<String>) -> Self {
        let message = message.into();
        log_error!(
            error_type = "configuration_error",
            message = %message,
            "Harness configuration invalid"
        );
        Self::ConfigurationError { message }
    }

    pub fn request_failed(
        message: impl Into<String>,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        let message = message.into();
        log_error!(
            error_type = "request_failed",
            message = %message,
            has_source = source.is_some(),
            "HTTP request failed at transport level"
        );
        Self::RequestFailed { message, source }
    }

    pub fn response_parsing_error(message: impl Into<String>) -> Self {
        let message = message.into();
        log_warn!(
            error_type = "response_parsing_error",
            message = %message,
            "Response body did not match expected shape"
        );
        Self::ResponseParsingError { message }
    }

    pub fn rate_limit_exceeded(retry_after_seconds: u64) -> Self {
        log_warn!(
            error_type = "rate_limit_exceeded",
            retry_after_seconds = retry_after_seconds,
            "Remote service rate limit exceeded"
        );
        Self::RateLimitExceeded {
            retry_after_seconds,
        }
    }

    pub fn timeout(timeout_seconds: u64) -> Self {
        log_warn!(
            error_type = "timeout",
            timeout_seconds = timeout_seconds,
            "Operation exceeded its time budget"
        );
        Self::Timeout { timeout_seconds }
    }

    pub fn authentication_failed(message: impl Into<String>) -> Self {
        let message = message.into();
        log_error!(
            error_type = "authentication_failed",
            message = %message,
            "Authentication with remote service failed"
        );
        Self::AuthenticationFailed { message }
    }

    pub fn setup_failed(message: impl Into<String>) -> Self {
        let message = message.into();
        log_error!(
            error_type = "setup_failed",
            message = %message,
            "Fixture setup failed"
        );
        Self::SetupFailed { message }
    }
}
