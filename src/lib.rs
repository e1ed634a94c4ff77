//! End-to-end test harness for a RAG platform's HTTP APIs.
//!
//! The crate provides the plumbing the integration suites share: a
//! retrying [`ApiClient`] over the service's REST surfaces, environment
//! driven [`TestConfig`], unique test-data generation, fixtures with
//! explicit async cleanup, response assertions, OpenAI-compatible chat
//! calls, and load/stability drivers. The suites themselves live under
//! `tests/`.

pub mod asserts;
pub mod chat;
pub mod client;
pub mod config;
pub mod data;
pub mod error;
pub mod fixtures;
pub mod logging;
pub mod perf;
pub mod retry;

#[cfg(test)]
pub mod tests;

pub use asserts::{
    assert_contains_keys, assert_response_status, assert_response_success, missing_keys,
};
pub use chat::{
    ChatCompletionRequest, ChatCompletionResponse, ChatMessage, ChatStreamOutcome,
};
pub use client::{ApiClient, ApiResponse, RequestOptions};
pub use config::TestConfig;
pub use data::{
    ChunkMethod, KnowledgeBaseOverrides, NewChatAssistant, NewDocument, NewKnowledgeBase,
    NewTeam, NewUser, TestDataGenerator, UserOverrides,
};
pub use error::{ApiError, ApiResult};
pub use fixtures::{KnowledgeBaseFixture, TestHarness, UserFixture};
pub use logging::{init_logging, LogOptions, LoggingGuard};
pub use perf::{
    poll_parse_status, LoadReport, LoadTestRunner, ParseOutcome, StabilityReport,
    StabilityRunner,
};
pub use retry::RetryPolicy;
