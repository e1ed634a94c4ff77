//! OpenAI-compatible chat surface.
//!
//! The remote service exposes a chat endpoint at
//! `/api/v1/chats_openai/{dialog_id}/chat/completions` that speaks the
//! OpenAI wire format, streamed and non-streamed. These are the request and
//! response structures plus the two client calls; the streaming variant
//! consumes SSE `data:` lines up to the `[DONE]` sentinel.

use futures_util::StreamExt;
use serde::{Deserialize, Serialize};

use crate::client::ApiClient;
use crate::error::{ApiError, ApiResult};
use crate::logging::{log_debug, log_error, log_info};

/// Chat message in OpenAI wire format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Chat completion request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,
}

impl ChatCompletionRequest {
    pub fn new(model: impl Into<String>, messages: Vec<ChatMessage>) -> Self {
        Self {
            model: model.into(),
            messages,
            temperature: None,
            max_tokens: None,
            stream: None,
        }
    }
}

/// Non-streamed chat completion response.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChatCompletionResponse {
    pub choices: Vec<ChatChoice>,
    #[serde(default)]
    pub usage: Option<ChatUsage>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChatChoice {
    pub message: ChatResponseMessage,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChatResponseMessage {
    pub role: String,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChatUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// One SSE chunk of a streamed completion.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChatStreamChunk {
    pub choices: Vec<ChatStreamChoice>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChatStreamChoice {
    #[serde(default)]
    pub delta: ChatStreamDelta,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ChatStreamDelta {
    #[serde(default)]
    pub content: Option<String>,
}

/// Result of consuming a streamed completion to the end.
#[derive(Debug, Clone)]
pub struct ChatStreamOutcome {
    /// Concatenation of every delta's content.
    pub content: String,
    /// Number of non-empty content chunks received.
    pub chunks: usize,
}

impl ApiClient {
    /// Non-streamed completion against the OpenAI-compatible endpoint.
    pub async fn chat_completion(
        &self,
        dialog_id: &str,
        request: &ChatCompletionRequest,
    ) -> ApiResult<ChatCompletionResponse> {
        let endpoint = chat_endpoint(dialog_id);
        let body = serde_json::to_value(request)
            .map_err(|e| ApiError::configuration_error(format!("request not serializable: {}", e)))?;

        let response = self.post(&endpoint, body).await?;
        if !response.is_success() {
            return Err(ApiError::request_failed(
                format!(
                    "chat completion returned {}: {}",
                    response.status_code(),
                    response.error_message()
                ),
                None,
            ));
        }

        response.json_as()
    }

    /// Streamed completion: consumes the SSE body to `[DONE]` and returns
    /// the concatenated content plus chunk count.
    ///
    /// The whole exchange, connection through the last byte of the stream,
    /// runs under 3x the client's default timeout; generation takes longer
    /// than a plain request, same as uploads do.
    pub async fn chat_completion_stream(
        &self,
        dialog_id: &str,
        request: &ChatCompletionRequest,
    ) -> ApiResult<ChatStreamOutcome> {
        let mut streamed = request.clone();
        streamed.stream = Some(true);

        let url = format!(
            "{}/{}",
            self.base_url().trim_end_matches('/'),
            chat_endpoint(dialog_id).trim_start_matches('/')
        );
        let stream_timeout = self.default_timeout() * 3;

        log_info!(url = %url, model = %streamed.model, "Starting streamed chat completion");

        let mut builder = self
            .raw_http()
            .post(&url)
            .json(&streamed)
            .timeout(stream_timeout);
        if let Some(token) = self.auth_token() {
            builder = builder.bearer_auth(token);
        }

        let response = builder.send().await.map_err(|e| {
            log_error!(url = %url, error = %e, "Streamed chat request failed");
            if e.is_timeout() {
                ApiError::timeout(stream_timeout.as_secs())
            } else {
                ApiError::request_failed(format!("POST {}: {}", url, e), Some(Box::new(e)))
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::request_failed(
                format!("streamed chat completion returned {}: {}", status, body),
                None,
            ));
        }

        let mut content = String::new();
        let mut chunks = 0usize;
        let mut buffer = String::new();
        let mut stream = response.bytes_stream();

        while let Some(next) = stream.next().await {
            let bytes = next.map_err(|e| {
                if e.is_timeout() {
                    ApiError::timeout(stream_timeout.as_secs())
                } else {
                    ApiError::request_failed(
                        format!("stream read failed: {}", e),
                        Some(Box::new(e)),
                    )
                }
            })?;
            buffer.push_str(&String::from_utf8_lossy(&bytes));

            // SSE events are newline-delimited; keep any partial line in
            // the buffer for the next chunk of bytes.
            while let Some(newline) = buffer.find('\n') {
                let line = buffer[..newline].trim().to_string();
                buffer.drain(..=newline);

                let Some(data) = line.strip_prefix("data:") else {
                    continue;
                };
                let data = data.trim();
                if data == "[DONE]" {
                    log_debug!(chunks = chunks, "Stream complete");
                    return Ok(ChatStreamOutcome { content, chunks });
                }

                match serde_json::from_str::<ChatStreamChunk>(data) {
                    Ok(chunk) => {
                        for choice in chunk.choices {
                            if let Some(delta) = choice.delta.content {
                                if !delta.is_empty() {
                                    content.push_str(&delta);
                                    chunks += 1;
                                }
                            }
                        }
                    }
                    Err(e) => {
                        return Err(ApiError::response_parsing_error(format!(
                            "bad stream chunk ({}): {}",
                            e, data
                        )));
                    }
                }
            }
        }

        // Stream ended without the [DONE] sentinel; report what arrived.
        log_debug!(chunks = chunks, "Stream ended without [DONE] sentinel");
        Ok(ChatStreamOutcome { content, chunks })
    }
}

fn chat_endpoint(dialog_id: &str) -> String {
    format!("/api/v1/chats_openai/{}/chat/completions", dialog_id)
}
