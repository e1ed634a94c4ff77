//! Shared scaffolding for the integration suites: a mock service with the
//! admin login endpoint mounted, and a harness pointed at it.

#![allow(dead_code)]

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use ragcheck::{TestConfig, TestHarness};

pub const ADMIN_TOKEN: &str = "admin-test-token";

/// Mount the management login endpoint so harness construction succeeds.
pub async fn mount_admin_login(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "token": ADMIN_TOKEN })))
        .mount(server)
        .await;
}

/// Configuration with every surface pointed at the mock server.
pub fn config_for(server: &MockServer) -> TestConfig {
    TestConfig {
        base_url: server.uri(),
        api_base_url: server.uri(),
        management_url: server.uri(),
        management_api_url: server.uri(),
        timeout: Duration::from_secs(5),
        ..TestConfig::default()
    }
}

/// Console-only logging for the suites; no file output under `cargo test`.
pub fn init_test_logging() {
    let _guard = ragcheck::init_logging(&ragcheck::LogOptions {
        file: false,
        ..ragcheck::LogOptions::default()
    });
}

/// Harness wired to the mock server, admin already logged in.
pub async fn harness_for(server: &MockServer) -> TestHarness {
    init_test_logging();
    mount_admin_login(server).await;
    TestHarness::new(config_for(server))
        .await
        .expect("harness construction")
}

/// Canned user body in the shape the management API returns.
pub fn user_body(id: &str, email: &str, nickname: &str) -> serde_json::Value {
    json!({
        "id": id,
        "email": email,
        "nickname": nickname,
        "status": 1,
        "role": "user",
    })
}

/// Canned knowledge-base body in the shape the management API returns.
pub fn kb_body(id: &str, name: &str, chunk_method: &str) -> serde_json::Value {
    json!({
        "id": id,
        "name": name,
        "description": "knowledge base created by automated test",
        "chunk_method": chunk_method,
        "chunk_token_count": 256,
        "document_count": 0,
    })
}
