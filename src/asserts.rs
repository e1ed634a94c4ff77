//! Assertion helpers for response checking.
//!
//! These panic with the full response context (status, body, and the
//! caller's label) so a failing test names the operation and shows what the
//! service actually sent, instead of a bare number mismatch.

use serde_json::Value;

use crate::client::ApiResponse;
use crate::logging::log_error;

/// Panic unless the response carries `expected_status`. The failure is also
/// logged, and the panic message includes the body so the service's own
/// error text lands in the failure output.
#[track_caller]
pub fn assert_response_status(response: &ApiResponse, expected_status: u16, context: &str) {
    let actual = response.status_code();
    if actual != expected_status {
        log_error!(
            context = context,
            expected = expected_status,
            actual = actual,
            body = %response.text(),
            "Status assertion failed"
        );
        panic!(
            "{}: expected status {}, got {}; body: {}",
            context,
            expected_status,
            actual,
            response.text()
        );
    }
}

/// Panic unless the response status is in the 2xx range.
#[track_caller]
pub fn assert_response_success(response: &ApiResponse, context: &str) {
    if !response.is_success() {
        log_error!(
            context = context,
            status = response.status_code(),
            body = %response.text(),
            "Success assertion failed"
        );
        panic!(
            "{}: expected success, got {}; body: {}",
            context,
            response.status_code(),
            response.text()
        );
    }
}

/// Panic if any of `keys` is absent from the JSON object, listing every
/// missing key at once rather than stopping at the first.
#[track_caller]
pub fn assert_contains_keys(value: &Value, keys: &[&str], context: &str) {
    let missing = missing_keys(value, keys);
    if !missing.is_empty() {
        log_error!(
            context = context,
            missing = ?missing,
            "Key assertion failed"
        );
        panic!(
            "{}: response missing keys {:?}; body: {}",
            context, missing, value
        );
    }
}

/// Keys from `keys` that are not present in the JSON object. A non-object
/// value is missing all of them.
pub fn missing_keys<'k>(value: &Value, keys: &[&'k str]) -> Vec<&'k str> {
    match value.as_object() {
        Some(map) => keys
            .iter()
            .filter(|k| !map.contains_key(**k))
            .copied()
            .collect(),
        None => keys.to_vec(),
    }
}
