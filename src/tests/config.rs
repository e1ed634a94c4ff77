use std::time::Duration;

use serial_test::serial;

use crate::config::TestConfig;

fn clear_env() {
    for key in [
        "TEST_BASE_URL",
        "TEST_API_BASE_URL",
        "TEST_MANAGEMENT_URL",
        "TEST_MANAGEMENT_API_URL",
        "MANAGEMENT_ADMIN_USERNAME",
        "MANAGEMENT_ADMIN_PASSWORD",
        "TEST_TIMEOUT",
        "TEST_RETRY_COUNT",
        "TEST_API_KEY",
        "TEST_DIALOG_ID",
    ] {
        std::env::remove_var(key);
    }
}

#[test]
#[serial]
fn defaults_point_at_local_services() {
    clear_env();
    let config = TestConfig::from_env();

    assert_eq!(config.base_url, "http://localhost");
    assert_eq!(config.api_base_url, "http://localhost:9380");
    assert_eq!(config.management_url, "http://localhost:8888");
    assert_eq!(config.management_api_url, "http://localhost:5000");
    assert_eq!(config.admin_username, "admin");
    assert_eq!(config.admin_password, "12345678");
    assert_eq!(config.timeout, Duration::from_secs(30));
    assert_eq!(config.retry.max_attempts, 3);
    assert!(config.api_key.is_none());
    assert!(config.dialog_id.is_none());
}

#[test]
#[serial]
fn environment_overrides_every_field() {
    clear_env();
    std::env::set_var("TEST_API_BASE_URL", "http://staging:9380");
    std::env::set_var("MANAGEMENT_ADMIN_USERNAME", "ops");
    std::env::set_var("TEST_TIMEOUT", "120");
    std::env::set_var("TEST_RETRY_COUNT", "5");
    std::env::set_var("TEST_API_KEY", "sk-test-123");
    std::env::set_var("TEST_DIALOG_ID", "dlg-42");

    let config = TestConfig::from_env();
    assert_eq!(config.api_base_url, "http://staging:9380");
    assert_eq!(config.admin_username, "ops");
    assert_eq!(config.timeout, Duration::from_secs(120));
    assert_eq!(config.retry.max_attempts, 5);
    assert_eq!(config.api_key.as_deref(), Some("sk-test-123"));
    assert_eq!(config.dialog_id.as_deref(), Some("dlg-42"));

    clear_env();
}

#[test]
#[serial]
fn unparsable_numbers_fall_back_to_defaults() {
    clear_env();
    std::env::set_var("TEST_TIMEOUT", "not-a-number");
    std::env::set_var("TEST_RETRY_COUNT", "3.5");

    let config = TestConfig::from_env();
    assert_eq!(config.timeout, Duration::from_secs(30));
    assert_eq!(config.retry.max_attempts, 3);

    clear_env();
}

#[test]
#[serial]
fn empty_optional_values_read_as_unset() {
    clear_env();
    std::env::set_var("TEST_API_KEY", "");
    std::env::set_var("TEST_DIALOG_ID", "");

    let config = TestConfig::from_env();
    assert!(config.api_key.is_none());
    assert!(config.dialog_id.is_none());

    clear_env();
}

#[test]
#[serial]
fn zero_retry_count_is_raised_to_one() {
    clear_env();
    std::env::set_var("TEST_RETRY_COUNT", "0");

    let config = TestConfig::from_env();
    assert_eq!(config.retry.max_attempts, 1);

    clear_env();
}

#[test]
fn upload_timeout_is_triple_the_default() {
    let config = TestConfig {
        timeout: Duration::from_secs(30),
        ..TestConfig::default()
    };
    assert_eq!(config.upload_timeout(), Duration::from_secs(90));
}
