//! LLM — provider adapter for the concierge assistant.
//!
//! DESIGN
//! ======
//! Configured from environment variables. The `LlmClient` dispatches to
//! Gemini (default) or an `OpenAI`-compatible API based on `LLM_PROVIDER`.
//! Both support a complete reply and an SSE-streamed reply.

pub mod config;
pub mod gemini;
#[cfg(test)]
pub mod mock;
pub mod openai;
pub mod retry;
pub mod sse;
pub mod types;

use config::{LlmConfig, LlmProviderKind};
pub use types::LlmChat;
use types::{ChatRequest, ChatStream, LlmError};

// =============================================================================
// CLIENT DISPATCH
// =============================================================================

/// Concrete LLM client that dispatches to either Gemini or `OpenAI`.
///
/// Built from an [`LlmConfig`] by [`LlmClient::from_config`].
pub struct LlmClient {
    inner: LlmProvider,
    model: String,
}

enum LlmProvider {
    Gemini(gemini::GeminiClient),
    OpenAi(openai::OpenAiClient),
}

impl LlmClient {
    /// Build an LLM client from a parsed typed config.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider HTTP client fails to build.
    pub fn from_config(config: LlmConfig) -> Result<Self, LlmError> {
        let model = config.model.clone();
        let inner = match config.provider {
            LlmProviderKind::Gemini => {
                LlmProvider::Gemini(gemini::GeminiClient::new(config.api_key, config.base_url, config.timeouts)?)
            }
            LlmProviderKind::OpenAi => {
                LlmProvider::OpenAi(openai::OpenAiClient::new(config.api_key, config.base_url, config.timeouts)?)
            }
        };
        Ok(Self { inner, model })
    }

    /// Return the configured model name (e.g. `"gemini-2.5-flash"`).
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait::async_trait]
impl LlmChat for LlmClient {
    fn api_key(&self) -> &str {
        match &self.inner {
            LlmProvider::Gemini(c) => c.api_key(),
            LlmProvider::OpenAi(c) => c.api_key(),
        }
    }

    async fn chat(&self, request: &ChatRequest) -> Result<String, LlmError> {
        match &self.inner {
            LlmProvider::Gemini(c) => c.chat(&self.model, request).await,
            LlmProvider::OpenAi(c) => c.chat(&self.model, request).await,
        }
    }

    async fn chat_stream(&self, request: &ChatRequest) -> Result<ChatStream, LlmError> {
        match &self.inner {
            LlmProvider::Gemini(c) => c.chat_stream(&self.model, request).await,
            LlmProvider::OpenAi(c) => c.chat_stream(&self.model, request).await,
        }
    }
}
