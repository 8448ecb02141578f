//! Assistant — the provider boundary used by the chat service.
//!
//! DESIGN
//! ======
//! Wraps the optional `LlmChat` with the credential precheck, throttling
//! backoff and reply cleanup. A missing or implausible credential fails
//! before any provider call is issued.
//!
//! Streamed replies are folded with [`accumulate`]: each item is the
//! concatenation of every chunk received so far, in arrival order.

use std::sync::Arc;

use futures::{StreamExt, TryStreamExt, future};
use tracing::{info, warn};

use crate::llm::LlmChat;
use crate::llm::config::check_api_key;
use crate::llm::retry::{RetryPolicy, with_backoff};
use crate::llm::types::{ChatRequest, ChatStream, LlmError};

const DISALLOWED_MARKER: char = '*';

#[derive(Clone)]
pub struct Assistant {
    llm: Option<Arc<dyn LlmChat>>,
    policy: RetryPolicy,
}

impl Assistant {
    #[must_use]
    pub fn new(llm: Option<Arc<dyn LlmChat>>, policy: RetryPolicy) -> Self {
        Self { llm, policy }
    }

    fn client(&self) -> Result<&Arc<dyn LlmChat>, LlmError> {
        let Some(llm) = &self.llm else {
            return Err(LlmError::MissingApiKey { var: "LLM_API_KEY_ENV".into() });
        };
        check_api_key(llm.api_key())?;
        Ok(llm)
    }

    /// Request a complete reply.
    ///
    /// # Errors
    ///
    /// Any [`LlmError`]; throttling is retried per the policy first, and a
    /// reply that is empty after cleanup is [`LlmError::EmptyReply`].
    pub async fn reply(&self, request: &ChatRequest) -> Result<String, LlmError> {
        let llm = self.client().inspect_err(log_precheck)?;
        let raw = with_backoff(self.policy, || llm.chat(request)).await?;
        let text = clean_reply(&raw)?;
        info!(reply_len = text.len(), "assistant: reply received");
        Ok(text)
    }

    /// Request a streamed reply as cumulative partial texts.
    ///
    /// Only opening the stream is retried; an error mid-stream is yielded
    /// as an item.
    ///
    /// # Errors
    ///
    /// Any [`LlmError`] raised before the first chunk.
    pub async fn reply_stream(&self, request: &ChatRequest) -> Result<ChatStream, LlmError> {
        let llm = self.client().inspect_err(log_precheck)?;
        let chunks = with_backoff(self.policy, || llm.chat_stream(request)).await?;
        Ok(accumulate(chunks.map_ok(|chunk| strip_markers(&chunk)).boxed()))
    }
}

fn log_precheck(e: &LlmError) {
    warn!(error = %e, "assistant: credential precheck failed, no provider call issued");
}

/// Fold a chunk stream into the running concatenation, one item per chunk.
pub fn accumulate(chunks: ChatStream) -> ChatStream {
    chunks
        .scan(String::new(), |acc, item| {
            let partial = item.map(|chunk| {
                acc.push_str(&chunk);
                acc.clone()
            });
            future::ready(Some(partial))
        })
        .boxed()
}

/// Strip literal asterisks and surrounding whitespace.
///
/// # Errors
///
/// Returns [`LlmError::EmptyReply`] when nothing is left.
pub fn clean_reply(raw: &str) -> Result<String, LlmError> {
    let text = strip_markers(raw);
    let text = text.trim();
    if text.is_empty() {
        return Err(LlmError::EmptyReply);
    }
    Ok(text.to_owned())
}

fn strip_markers(text: &str) -> String {
    text.replace(DISALLOWED_MARKER, "")
}

#[cfg(test)]
#[path = "assistant_test.rs"]
mod tests;
