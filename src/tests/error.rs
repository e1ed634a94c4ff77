use crate::error::ApiError;

#[test]
fn transient_errors_are_retryable() {
    assert!(ApiError::rate_limit_exceeded(5).is_retryable());
    assert!(ApiError::timeout(30).is_retryable());
    assert!(ApiError::request_failed("connection refused", None).is_retryable());
}

#[test]
fn caller_errors_are_not_retryable() {
    assert!(!ApiError::configuration_error("bad base URL").is_retryable());
    assert!(!ApiError::response_parsing_error("not JSON").is_retryable());
    assert!(!ApiError::setup_failed("create returned 422").is_retryable());
}

#[test]
fn authentication_failures_are_not_retryable() {
    // Re-sending rejected credentials can never succeed.
    assert!(!ApiError::authentication_failed("invalid credentials").is_retryable());
}

#[test]
fn display_carries_the_context() {
    let error = ApiError::setup_failed("create user returned 500: oops");
    assert!(error.to_string().contains("create user returned 500"));

    let error = ApiError::timeout(30);
    assert!(error.to_string().contains("30s"));

    let error = ApiError::authentication_failed("login for x rejected with 401");
    assert!(error.to_string().contains("401"));
}
