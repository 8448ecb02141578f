//! Scripted `LlmChat` for tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use futures::stream;
use tokio::sync::Notify;

use super::types::{ChatRequest, ChatStream, LlmChat, LlmError};

pub const VALID_KEY: &str = "test-key-0123456789";

type StreamScript = Result<Vec<Result<String, LlmError>>, LlmError>;

pub struct MockLlm {
    key: String,
    replies: Mutex<VecDeque<Result<String, LlmError>>>,
    streams: Mutex<VecDeque<StreamScript>>,
    calls: AtomicUsize,
    requests: Mutex<Vec<ChatRequest>>,
    gate: Option<Arc<Notify>>,
}

impl MockLlm {
    pub fn new() -> Self {
        Self::with_key(VALID_KEY)
    }

    pub fn with_key(key: &str) -> Self {
        Self {
            key: key.to_owned(),
            replies: Mutex::new(VecDeque::new()),
            streams: Mutex::new(VecDeque::new()),
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
            gate: None,
        }
    }

    /// Queue the outcome of the next `chat` call. Unscripted calls reply "ok".
    pub fn reply(self, outcome: Result<String, LlmError>) -> Self {
        self.replies.lock().unwrap().push_back(outcome);
        self
    }

    /// Queue the chunks produced by the next `chat_stream` call.
    pub fn stream(self, chunks: &[&str]) -> Self {
        let script = chunks.iter().map(|c| Ok((*c).to_owned())).collect();
        self.streams.lock().unwrap().push_back(Ok(script));
        self
    }

    /// Queue a raw stream script, including open failures and mid-stream errors.
    pub fn stream_script(self, script: StreamScript) -> Self {
        self.streams.lock().unwrap().push_back(script);
        self
    }

    /// Hold every call until `gate` is notified.
    pub fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<ChatRequest> {
        self.requests.lock().unwrap().last().cloned()
    }

    async fn enter(&self, request: &ChatRequest) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
    }
}

#[async_trait::async_trait]
impl LlmChat for MockLlm {
    fn api_key(&self) -> &str {
        &self.key
    }

    async fn chat(&self, request: &ChatRequest) -> Result<String, LlmError> {
        self.enter(request).await;
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok("ok".into()))
    }

    async fn chat_stream(&self, request: &ChatRequest) -> Result<ChatStream, LlmError> {
        self.enter(request).await;
        let script = self
            .streams
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(vec![Ok("ok".into())]))?;
        Ok(Box::pin(stream::iter(script)))
    }
}

/// A provider throttling response.
pub fn rate_limited() -> LlmError {
    LlmError::ApiResponse { status: 429, body: "{\"error\":{\"status\":\"RESOURCE_EXHAUSTED\"}}".into() }
}
