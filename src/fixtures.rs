//! Fixture and lifecycle layer.
//!
//! Scoped acquisition around a test body: a fixture's constructor performs
//! the create call against the remote service and fails fast with a clear
//! message when the service refuses; its `cleanup()` performs the delete on
//! the way out, swallowing and logging any failure so teardown can never
//! mask the test's real outcome.
//!
//! Rust has no async `Drop`, so release is explicit. A fixture dropped
//! without `cleanup()` logs a warning naming the leaked resource; the run
//! log shows the leak without failing the test.
//!
//! [`TestHarness`] is the session-scoped bundle: configuration, the shared
//! data generator, and the two clients. Teardown ordering is
//! reverse-of-acquisition by construction: function-scoped fixtures are
//! consumed before the harness (and its clients) drops.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::json;

use crate::client::ApiClient;
use crate::config::TestConfig;
use crate::data::{NewKnowledgeBase, NewUser, TestDataGenerator};
use crate::error::{ApiError, ApiResult};
use crate::logging::{log_error, log_info, log_warn};

/// User as returned by the management API.
#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub nickname: String,
}

/// Knowledge base as returned by the management API.
#[derive(Debug, Clone, Deserialize)]
pub struct KnowledgeBase {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub chunk_method: String,
}

/// Session-scoped test context: configuration, generator, and one client
/// per API surface.
pub struct TestHarness {
    pub config: TestConfig,
    pub data: TestDataGenerator,
    /// End-user API client (unauthenticated until a user logs in).
    pub api: Arc<ApiClient>,
    /// Management API client; holds the admin token when login succeeded.
    pub management: Arc<ApiClient>,
}

impl TestHarness {
    /// Build both clients and log in to the management API.
    ///
    /// An admin login failure is logged at error level but does not fail
    /// construction: tests using the management client will then see
    /// unauthenticated responses, which is itself a signal worth having in
    /// the run rather than aborting everything up front.
    pub async fn new(config: TestConfig) -> ApiResult<Self> {
        let api = Arc::new(ApiClient::with_retry_policy(
            &config.api_base_url,
            config.timeout,
            config.retry.clone(),
        )?);
        let management = Arc::new(ApiClient::with_retry_policy(
            &config.management_api_url,
            config.timeout,
            config.retry.clone(),
        )?);

        let harness = Self {
            config,
            data: TestDataGenerator::new(),
            api,
            management,
        };
        harness.login_admin().await;
        Ok(harness)
    }

    async fn login_admin(&self) {
        let body = json!({
            "username": self.config.admin_username,
            "password": self.config.admin_password,
        });

        match self.management.post("/api/auth/login", body).await {
            Ok(response) if response.status_code() == 200 => {
                let token = response
                    .json()
                    .ok()
                    .and_then(|v| v.get("token").and_then(|t| t.as_str().map(String::from)));
                match token {
                    Some(token) => {
                        self.management.set_auth_token(token);
                        log_info!("Management API login succeeded");
                    }
                    None => {
                        log_error!(
                            body = %response.text(),
                            "Management API login response carried no token"
                        );
                    }
                }
            }
            Ok(response) => {
                log_error!(
                    status = response.status_code(),
                    body = %response.text(),
                    "Management API login failed"
                );
            }
            Err(e) => {
                log_error!(error = %e, "Management API login request failed");
            }
        }
    }

    /// Create a user fixture through the management API.
    pub async fn create_user(&self, data: NewUser) -> ApiResult<UserFixture> {
        UserFixture::create(Arc::clone(&self.management), data).await
    }

    /// Create a knowledge-base fixture through the management API.
    pub async fn create_knowledge_base(
        &self,
        data: NewKnowledgeBase,
    ) -> ApiResult<KnowledgeBaseFixture> {
        KnowledgeBaseFixture::create(Arc::clone(&self.management), data).await
    }

    /// Log a user in against the end-user API and return a fresh client
    /// carrying their access token. Unlike the admin login, a failure here
    /// fails the test immediately: rejected credentials surface as
    /// `AuthenticationFailed`, anything else as `SetupFailed`.
    pub async fn login_user(&self, user: &NewUser) -> ApiResult<ApiClient> {
        let client = ApiClient::with_retry_policy(
            &self.config.api_base_url,
            self.config.timeout,
            self.config.retry.clone(),
        )?;

        let body = json!({ "email": user.email, "password": user.password });
        let response = client.post("/v1/user/login", body).await?;

        if matches!(response.status_code(), 400 | 401 | 403) {
            return Err(ApiError::authentication_failed(format!(
                "login for {} rejected with {}: {}",
                user.email,
                response.status_code(),
                response.error_message()
            )));
        }
        if response.status_code() != 200 {
            return Err(ApiError::setup_failed(format!(
                "user login for {} returned {}: {}",
                user.email,
                response.status_code(),
                response.text()
            )));
        }

        let token = response
            .json()?
            .pointer("/data/access_token")
            .and_then(|t| t.as_str().map(String::from))
            .ok_or_else(|| {
                ApiError::setup_failed(format!(
                    "login response for {} carried no access_token",
                    user.email
                ))
            })?;

        client.set_auth_token(token);
        log_info!(email = %user.email, "User login succeeded");
        Ok(client)
    }
}

/// A user created for one test and deleted after it.
#[derive(Debug)]
pub struct UserFixture {
    client: Arc<ApiClient>,
    pub user: User,
    /// Plaintext password from the creation payload; the server never
    /// echoes it back, and login tests need it.
    pub password: String,
    cleaned: bool,
}

impl UserFixture {
    /// POST the user and fail the test (via `SetupFailed`) on anything
    /// but 201.
    pub async fn create(client: Arc<ApiClient>, data: NewUser) -> ApiResult<Self> {
        let password = data.password.clone();
        let body = serde_json::to_value(&data).map_err(|e| {
            ApiError::configuration_error(format!("user payload not serializable: {}", e))
        })?;

        let response = client.post("/api/users", body).await?;
        if response.status_code() != 201 {
            return Err(ApiError::setup_failed(format!(
                "create user returned {}: {}",
                response.status_code(),
                response.text()
            )));
        }

        let user: User = response.json_as()?;
        log_info!(id = %user.id, email = %user.email, "Test user created");

        Ok(Self {
            client,
            user,
            password,
            cleaned: false,
        })
    }

    pub fn id(&self) -> &str {
        &self.user.id
    }

    /// Delete the user. Failures are logged and suppressed so teardown
    /// never overwrites the test's own result; deleting an already-deleted
    /// user is therefore harmless.
    pub async fn cleanup(mut self) {
        self.cleaned = true;
        let endpoint = format!("/api/users/{}", self.user.id);
        match self.client.delete(&endpoint).await {
            Ok(response) if response.status_code() == 200 => {
                log_info!(email = %self.user.email, "Test user deleted");
            }
            Ok(response) => {
                log_warn!(
                    email = %self.user.email,
                    status = response.status_code(),
                    body = %response.text(),
                    "Test user deletion refused; continuing"
                );
            }
            Err(e) => {
                log_warn!(email = %self.user.email, error = %e, "Test user deletion failed; continuing");
            }
        }
    }
}

impl Drop for UserFixture {
    fn drop(&mut self) {
        if !self.cleaned {
            log_warn!(
                id = %self.user.id,
                email = %self.user.email,
                "UserFixture dropped without cleanup; resource leaked on the remote service"
            );
        }
    }
}

/// A knowledge base created for one test and deleted after it.
#[derive(Debug)]
pub struct KnowledgeBaseFixture {
    client: Arc<ApiClient>,
    pub kb: KnowledgeBase,
    cleaned: bool,
}

impl KnowledgeBaseFixture {
    pub async fn create(client: Arc<ApiClient>, data: NewKnowledgeBase) -> ApiResult<Self> {
        let body = serde_json::to_value(&data).map_err(|e| {
            ApiError::configuration_error(format!("knowledge base payload not serializable: {}", e))
        })?;

        let response = client.post("/api/knowledgebases", body).await?;
        if response.status_code() != 201 {
            return Err(ApiError::setup_failed(format!(
                "create knowledge base returned {}: {}",
                response.status_code(),
                response.text()
            )));
        }

        let kb: KnowledgeBase = response.json_as()?;
        log_info!(id = %kb.id, name = %kb.name, "Test knowledge base created");

        Ok(Self {
            client,
            kb,
            cleaned: false,
        })
    }

    pub fn id(&self) -> &str {
        &self.kb.id
    }

    /// Delete the knowledge base, logging and suppressing failures.
    pub async fn cleanup(mut self) {
        self.cleaned = true;
        let endpoint = format!("/api/knowledgebases/{}", self.kb.id);
        match self.client.delete(&endpoint).await {
            Ok(response) if response.status_code() == 200 => {
                log_info!(name = %self.kb.name, "Test knowledge base deleted");
            }
            Ok(response) => {
                log_warn!(
                    name = %self.kb.name,
                    status = response.status_code(),
                    body = %response.text(),
                    "Knowledge base deletion refused; continuing"
                );
            }
            Err(e) => {
                log_warn!(name = %self.kb.name, error = %e, "Knowledge base deletion failed; continuing");
            }
        }
    }
}

impl Drop for KnowledgeBaseFixture {
    fn drop(&mut self) {
        if !self.cleaned {
            log_warn!(
                id = %self.kb.id,
                name = %self.kb.name,
                "KnowledgeBaseFixture dropped without cleanup; resource leaked on the remote service"
            );
        }
    }
}
