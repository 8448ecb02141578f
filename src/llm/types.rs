//! LLM types — provider-neutral message types and errors.
//!
//! Shared by the Gemini and `OpenAI`-compatible clients. The rest of the
//! crate only ever sees these types, never a provider wire format.

use std::pin::Pin;

use futures::Stream;
use serde::{Deserialize, Serialize};

use crate::error::ErrorCode;

// =============================================================================
// ERROR
// =============================================================================

/// Errors produced by LLM client operations.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    /// A configuration value could not be parsed.
    #[error("config parse failed: {0}")]
    ConfigParse(String),

    /// The required API key environment variable is not set.
    #[error("missing API key: env var {var} not set")]
    MissingApiKey { var: String },

    /// An API key is configured but is empty, too short, or a placeholder.
    #[error("API key is not usable: {0}")]
    InvalidApiKey(String),

    /// The HTTP request to the LLM provider failed.
    #[error("API request failed: {0}")]
    ApiRequest(String),

    /// The LLM provider returned a non-success HTTP status.
    #[error("API response error: status {status}")]
    ApiResponse { status: u16, body: String },

    /// The LLM provider response body could not be deserialized.
    #[error("API response parse failed: {0}")]
    ApiParse(String),

    /// The provider answered successfully but produced no text.
    #[error("provider returned an empty reply")]
    EmptyReply,

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

/// Coarse failure classes surfaced to the conversation.
///
/// Every [`LlmError`] maps to exactly one of these; the chat service picks
/// the user-facing message from the kind alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    ConfigurationMissing,
    RateLimited,
    EmptyReply,
    Network,
}

impl FailureKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ConfigurationMissing => "configuration_missing",
            Self::RateLimited => "rate_limited",
            Self::EmptyReply => "empty_reply",
            Self::Network => "network",
        }
    }
}

impl LlmError {
    /// Classify this error into the failure taxonomy.
    #[must_use]
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::ConfigParse(_) | Self::MissingApiKey { .. } | Self::InvalidApiKey(_) => {
                FailureKind::ConfigurationMissing
            }
            Self::ApiResponse { status: 429, .. } => FailureKind::RateLimited,
            Self::ApiResponse { body, .. } if body.contains("RESOURCE_EXHAUSTED") => FailureKind::RateLimited,
            Self::EmptyReply => FailureKind::EmptyReply,
            Self::ApiRequest(_) | Self::ApiResponse { .. } | Self::ApiParse(_) | Self::HttpClientBuild(_) => {
                FailureKind::Network
            }
        }
    }
}

impl ErrorCode for LlmError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::ConfigParse(_) => "E_CONFIG_PARSE",
            Self::MissingApiKey { .. } => "E_MISSING_API_KEY",
            Self::InvalidApiKey(_) => "E_INVALID_API_KEY",
            Self::ApiRequest(_) => "E_API_REQUEST",
            Self::ApiResponse { .. } => "E_API_RESPONSE",
            Self::ApiParse(_) => "E_API_PARSE",
            Self::EmptyReply => "E_EMPTY_REPLY",
            Self::HttpClientBuild(_) => "E_HTTP_CLIENT_BUILD",
        }
    }

    fn retryable(&self) -> bool {
        self.kind() == FailureKind::RateLimited
    }
}

// =============================================================================
// MESSAGE TYPES
// =============================================================================

/// Conversation role in the provider's two-role schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// A single message sent to the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub text: String,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self { role: Role::User, text: text.into() }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self { role: Role::Assistant, text: text.into() }
    }
}

/// Sampling parameters forwarded to the provider.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sampling {
    pub temperature: f32,
    pub top_p: Option<f32>,
    pub top_k: Option<u32>,
    pub max_output_tokens: Option<u32>,
}

impl Default for Sampling {
    fn default() -> Self {
        Self { temperature: 0.7, top_p: Some(0.95), top_k: Some(40), max_output_tokens: None }
    }
}

/// A complete outbound call: instruction string, alternating history ending
/// in a user message, and sampling parameters. The model is owned by the
/// client.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest {
    pub system: String,
    pub messages: Vec<Message>,
    pub sampling: Sampling,
}

/// Lazy, finite, non-restartable sequence of reply fragments.
pub type ChatStream = Pin<Box<dyn Stream<Item = Result<String, LlmError>> + Send>>;

// =============================================================================
// LLM CHAT TRAIT
// =============================================================================

/// Provider-neutral async trait for LLM chat. Enables mocking in tests.
#[async_trait::async_trait]
pub trait LlmChat: Send + Sync {
    /// Credential the client will present to the provider.
    fn api_key(&self) -> &str;

    /// Send a chat request and wait for the full reply text.
    ///
    /// # Errors
    ///
    /// Returns an [`LlmError`] if the request fails or the response is malformed.
    async fn chat(&self, request: &ChatRequest) -> Result<String, LlmError>;

    /// Send a chat request and receive the reply as ordered text fragments.
    ///
    /// # Errors
    ///
    /// Returns an [`LlmError`] if the stream cannot be opened. Errors that
    /// occur mid-stream are yielded as stream items.
    async fn chat_stream(&self, request: &ChatRequest) -> Result<ChatStream, LlmError>;
}

#[cfg(test)]
#[path = "types_test.rs"]
mod tests;
