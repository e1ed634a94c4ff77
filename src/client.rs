//! HTTP client wrapper for the remote RAG service.
//!
//! [`ApiClient`] is a thin session over `reqwest`: it joins endpoints onto
//! one base URL, attaches bearer-token auth, applies the default timeout,
//! retries transient status codes for idempotent-safe verbs, and logs every
//! request and response. It deliberately does not interpret response
//! bodies: every call returns an [`ApiResponse`] owning the status and body
//! text so tests can assert on failures instead of having them converted to
//! errors.

use std::path::Path;
use std::sync::RwLock;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::multipart::{Form, Part};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{ApiError, ApiResult};
use crate::logging::{log_debug, log_error, log_info, log_warn};
use crate::retry::{is_retryable_status, RetryPolicy};

const USER_AGENT_VALUE: &str = concat!("ragcheck/", env!("CARGO_PKG_VERSION"));

/// How many characters of a non-JSON body make it into the log.
const LOG_BODY_LIMIT: usize = 500;

/// Optional parameters for a single request.
#[derive(Debug, Default, Clone)]
pub struct RequestOptions {
    /// JSON request body.
    pub json: Option<Value>,
    /// Query string parameters.
    pub query: Vec<(String, String)>,
    /// Per-request timeout override.
    pub timeout: Option<Duration>,
}

impl RequestOptions {
    /// Options carrying only a JSON body (the dominant case).
    pub fn json(body: Value) -> Self {
        Self {
            json: Some(body),
            ..Self::default()
        }
    }

    /// Options carrying only query parameters.
    pub fn query(params: &[(&str, &str)]) -> Self {
        Self {
            query: params
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
            ..Self::default()
        }
    }
}

/// A completed HTTP exchange: status plus the body text, read eagerly so
/// the response can be logged, asserted on, and parsed more than once.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    status: StatusCode,
    content_type: Option<String>,
    body: String,
}

impl ApiResponse {
    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn status_code(&self) -> u16 {
        self.status.as_u16()
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// The raw body text.
    pub fn text(&self) -> &str {
        &self.body
    }

    pub fn is_json(&self) -> bool {
        self.content_type
            .as_deref()
            .is_some_and(|ct| ct.starts_with("application/json"))
    }

    /// Parse the body as JSON.
    pub fn json(&self) -> ApiResult<Value> {
        serde_json::from_str(&self.body).map_err(|e| {
            ApiError::response_parsing_error(format!(
                "body is not valid JSON ({}): {}",
                e,
                truncate(&self.body, LOG_BODY_LIMIT)
            ))
        })
    }

    /// Parse the body as a typed value.
    pub fn json_as<T: DeserializeOwned>(&self) -> ApiResult<T> {
        serde_json::from_str(&self.body).map_err(|e| {
            ApiError::response_parsing_error(format!(
                "body does not match expected shape ({}): {}",
                e,
                truncate(&self.body, LOG_BODY_LIMIT)
            ))
        })
    }

    /// Best-effort error message extraction from common body shapes.
    ///
    /// Looks for the usual suspects (`error`, `message`, `msg`, `detail`)
    /// in a JSON body, falling back to the raw text.
    pub fn error_message(&self) -> String {
        if let Ok(value) = self.json() {
            for key in ["error", "message", "msg", "detail", "error_message"] {
                if let Some(found) = value.get(key) {
                    return match found {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    };
                }
            }
            return value.to_string();
        }
        self.body.clone()
    }
}

/// Thin session over one base URL.
///
/// One `ApiClient` owns one `reqwest` connection pool and one bearer token.
/// The token is scoped to the client instance: swapping it (as the
/// permission tests do) affects every subsequent request until the caller
/// restores the original.
#[derive(Debug)]
pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
    timeout: Duration,
    retry: RetryPolicy,
    auth_token: RwLock<Option<String>>,
}

impl ApiClient {
    /// Create a client for `base_url` with the default retry policy.
    pub fn new(base_url: &str, timeout: Duration) -> ApiResult<Self> {
        Self::with_retry_policy(base_url, timeout, RetryPolicy::default())
    }

    /// Create a client with an explicit retry policy.
    pub fn with_retry_policy(
        base_url: &str,
        timeout: Duration,
        retry: RetryPolicy,
    ) -> ApiResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(
            reqwest::header::USER_AGENT,
            HeaderValue::from_static(USER_AGENT_VALUE),
        );

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| {
                ApiError::configuration_error(format!("failed to build HTTP client: {}", e))
            })?;

        let base_url = base_url.trim_end_matches('/').to_string();

        log_info!(
            base_url = %base_url,
            timeout_seconds = timeout.as_secs(),
            retry_attempts = retry.max_attempts,
            "API client initialized"
        );

        Ok(Self {
            base_url,
            http,
            timeout,
            retry,
            auth_token: RwLock::new(None),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The default per-request timeout this client was built with.
    pub fn default_timeout(&self) -> Duration {
        self.timeout
    }

    /// The underlying `reqwest` client, for calls that need to own the
    /// response stream (the SSE chat completion).
    pub(crate) fn raw_http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Install a bearer token for subsequent requests.
    pub fn set_auth_token(&self, token: impl Into<String>) {
        let token = token.into();
        log_debug!(token_prefix = %truncate(&token, 20), "Auth token set");
        if let Ok(mut slot) = self.auth_token.write() {
            *slot = Some(token);
        }
    }

    /// Drop the bearer token; subsequent requests go out unauthenticated.
    pub fn clear_auth_token(&self) {
        log_debug!("Auth token cleared");
        if let Ok(mut slot) = self.auth_token.write() {
            *slot = None;
        }
    }

    /// The currently installed token, if any. The permission tests read
    /// this to restore the original token after swapping it.
    pub fn auth_token(&self) -> Option<String> {
        self.auth_token.read().ok().and_then(|slot| slot.clone())
    }

    fn build_url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'))
    }

    /// Send a request. The general method behind the convenience verbs.
    ///
    /// Applies the default timeout when the options carry none, logs the
    /// outbound request and inbound response, and retries transient status
    /// codes ({429, 500, 502, 503, 504}) and retryable transport errors
    /// (connect failures, timeouts) for idempotent-safe verbs up to the
    /// policy's attempt count. Exhausted retries propagate the last error,
    /// never mask it.
    pub async fn request(
        &self,
        method: Method,
        endpoint: &str,
        options: RequestOptions,
    ) -> ApiResult<ApiResponse> {
        let url = self.build_url(endpoint);
        let timeout = options.timeout.unwrap_or(self.timeout);
        let retry_safe = verb_is_retry_safe(&method);

        self.log_request(&method, &url, &options);

        let mut attempt: u32 = 0;
        loop {
            attempt += 1;

            let mut builder = self
                .http
                .request(method.clone(), &url)
                .timeout(timeout);
            if !options.query.is_empty() {
                builder = builder.query(&options.query);
            }
            if let Some(body) = &options.json {
                builder = builder.json(body);
            }
            if let Some(token) = self.auth_token() {
                builder = builder.bearer_auth(token);
            }

            let response = match builder.send().await {
                Ok(response) => response,
                Err(e) => {
                    log_error!(method = %method, url = %url, error = %e, "Request failed");
                    let error = if e.is_timeout() {
                        ApiError::timeout(timeout.as_secs())
                    } else {
                        ApiError::request_failed(
                            format!("{} {}: {}", method, url, e),
                            Some(Box::new(e)),
                        )
                    };
                    if retry_safe && error.is_retryable() && attempt < self.retry.max_attempts {
                        let delay = self.retry.delay_for_attempt(attempt);
                        log_warn!(
                            method = %method,
                            url = %url,
                            attempt = attempt,
                            max_attempts = self.retry.max_attempts,
                            delay_ms = delay.as_millis(),
                            "Transport error, retrying after backoff"
                        );
                        tokio::time::sleep(delay).await;
                        continue;
                    }
                    return Err(error);
                }
            };

            let api_response = Self::read_response(response).await?;
            self.log_response(&api_response);

            let status = api_response.status_code();
            if retry_safe && is_retryable_status(status) && attempt < self.retry.max_attempts {
                let delay = self.retry.delay_for_attempt(attempt);
                log_warn!(
                    method = %method,
                    url = %url,
                    status = status,
                    attempt = attempt,
                    max_attempts = self.retry.max_attempts,
                    delay_ms = delay.as_millis(),
                    "Transient status, retrying after backoff"
                );
                tokio::time::sleep(delay).await;
                continue;
            }

            return Ok(api_response);
        }
    }

    pub async fn get(&self, endpoint: &str) -> ApiResult<ApiResponse> {
        self.request(Method::GET, endpoint, RequestOptions::default())
            .await
    }

    pub async fn post(&self, endpoint: &str, body: Value) -> ApiResult<ApiResponse> {
        self.request(Method::POST, endpoint, RequestOptions::json(body))
            .await
    }

    pub async fn put(&self, endpoint: &str, body: Value) -> ApiResult<ApiResponse> {
        self.request(Method::PUT, endpoint, RequestOptions::json(body))
            .await
    }

    pub async fn patch(&self, endpoint: &str, body: Value) -> ApiResult<ApiResponse> {
        self.request(Method::PATCH, endpoint, RequestOptions::json(body))
            .await
    }

    pub async fn delete(&self, endpoint: &str) -> ApiResult<ApiResponse> {
        self.request(Method::DELETE, endpoint, RequestOptions::default())
            .await
    }

    /// Upload a file as multipart form data.
    ///
    /// Uses 3x the default timeout; large uploads routinely exceed the
    /// normal request budget. Not retried: the body stream is consumed by
    /// the first attempt.
    pub async fn upload_file(
        &self,
        endpoint: &str,
        path: &Path,
        field_name: &str,
        extra_fields: &[(&str, &str)],
    ) -> ApiResult<ApiResponse> {
        let url = self.build_url(endpoint);

        let bytes = tokio::fs::read(path).await.map_err(|e| {
            ApiError::configuration_error(format!(
                "cannot read upload file {}: {}",
                path.display(),
                e
            ))
        })?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload.bin".to_string());

        log_info!(
            url = %url,
            file = %path.display(),
            size_bytes = bytes.len(),
            field = field_name,
            "Uploading file"
        );

        let mut form = Form::new().part(
            field_name.to_string(),
            Part::bytes(bytes).file_name(file_name),
        );
        for (key, value) in extra_fields {
            form = form.text((*key).to_string(), (*value).to_string());
        }

        let mut builder = self
            .http
            .post(&url)
            .multipart(form)
            .timeout(self.timeout * 3);
        if let Some(token) = self.auth_token() {
            builder = builder.bearer_auth(token);
        }

        let response = builder.send().await.map_err(|e| {
            log_error!(url = %url, error = %e, "File upload failed");
            if e.is_timeout() {
                ApiError::timeout((self.timeout * 3).as_secs())
            } else {
                ApiError::request_failed(format!("POST {}: {}", url, e), Some(Box::new(e)))
            }
        })?;

        let api_response = Self::read_response(response).await?;
        self.log_response(&api_response);
        Ok(api_response)
    }

    async fn read_response(response: reqwest::Response) -> ApiResult<ApiResponse> {
        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string());
        let body = response.text().await.map_err(|e| {
            ApiError::request_failed(format!("failed to read response body: {}", e), Some(Box::new(e)))
        })?;

        Ok(ApiResponse {
            status,
            content_type,
            body,
        })
    }

    fn log_request(&self, method: &Method, url: &str, options: &RequestOptions) {
        log_info!(
            method = %method,
            url = %url,
            body = %options
                .json
                .as_ref()
                .map(|v| v.to_string())
                .unwrap_or_default(),
            query = ?options.query,
            "Outbound request"
        );
    }

    fn log_response(&self, response: &ApiResponse) {
        let body = if response.is_json() {
            response.text().to_string()
        } else {
            truncate(response.text(), LOG_BODY_LIMIT)
        };

        if response.status_code() >= 400 {
            log_error!(status = response.status_code(), body = %body, "Response");
        } else {
            log_info!(status = response.status_code(), body = %body, "Response");
        }
    }
}

fn verb_is_retry_safe(method: &Method) -> bool {
    matches!(
        *method,
        Method::GET | Method::HEAD | Method::OPTIONS | Method::PUT | Method::DELETE
    )
}

fn truncate(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        text.to_string()
    } else {
        let cut: String = text.chars().take(limit).collect();
        format!("{}...", cut)
    }
}
