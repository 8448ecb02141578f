//! OpenAI-compatible `/chat/completions` client.
//!
//! Covers `OpenAI` itself and the many hosted APIs that mirror it. The
//! instruction string travels as a leading `system` message; streaming uses
//! `stream: true` and reads `choices[0].delta.content` from each SSE event.

use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

use super::config::LlmTimeouts;
use super::sse;
use super::types::{ChatRequest, ChatStream, LlmError, Role};

pub struct OpenAiClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl OpenAiClient {
    pub fn new(api_key: String, base_url: String, timeouts: LlmTimeouts) -> Result<Self, LlmError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeouts.request_secs))
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            .build()
            .map_err(|e| LlmError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, api_key, base_url })
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub async fn chat(&self, model: &str, request: &ChatRequest) -> Result<String, LlmError> {
        let messages = build_messages(request);
        let body = CcRequest::new(model, request, &messages, false);
        let response = self.send_json(&body).await?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| LlmError::ApiRequest(e.to_string()))?;
        if status != 200 {
            return Err(LlmError::ApiResponse { status, body: text });
        }
        parse_chat_completions_response(&text)
    }

    pub async fn chat_stream(&self, model: &str, request: &ChatRequest) -> Result<ChatStream, LlmError> {
        let messages = build_messages(request);
        let body = CcRequest::new(model, request, &messages, true);
        let response = self.send_json(&body).await?;

        let status = response.status().as_u16();
        if status != 200 {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::ApiResponse { status, body });
        }
        Ok(sse::text_stream(Box::pin(response.bytes_stream()), parse_stream_delta))
    }

    async fn send_json(&self, body: &impl Serialize) -> Result<reqwest::Response, LlmError> {
        let url = format!("{}/chat/completions", self.base_url);
        self.http
            .post(url)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| LlmError::ApiRequest(e.to_string()))
    }
}

// =============================================================================
// WIRE TYPES
// =============================================================================

#[derive(Serialize)]
struct CcRequest<'a> {
    model: &'a str,
    messages: &'a [CcMessage<'a>],
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    stream: bool,
}

impl<'a> CcRequest<'a> {
    fn new(model: &'a str, request: &ChatRequest, messages: &'a [CcMessage<'a>], stream: bool) -> Self {
        Self {
            model,
            messages,
            temperature: request.sampling.temperature,
            top_p: request.sampling.top_p,
            max_tokens: request.sampling.max_output_tokens,
            stream,
        }
    }
}

#[derive(Serialize)]
struct CcMessage<'a> {
    role: &'static str,
    content: &'a str,
}

fn build_messages(request: &ChatRequest) -> Vec<CcMessage<'_>> {
    let mut out = Vec::with_capacity(request.messages.len() + 1);
    if !request.system.trim().is_empty() {
        out.push(CcMessage { role: "system", content: &request.system });
    }
    for message in &request.messages {
        let role = match message.role {
            Role::User => "user",
            Role::Assistant => "assistant",
        };
        out.push(CcMessage { role, content: &message.text });
    }
    out
}

// =============================================================================
// RESPONSE PARSING
// =============================================================================

pub(crate) fn parse_chat_completions_response(json_text: &str) -> Result<String, LlmError> {
    let root: Value = serde_json::from_str(json_text).map_err(|e| LlmError::ApiParse(e.to_string()))?;
    let Some(choice) = root
        .get("choices")
        .and_then(Value::as_array)
        .and_then(|arr| arr.first())
    else {
        return Err(LlmError::ApiParse("chat_completions: missing choices[0]".to_string()));
    };
    Ok(choice
        .get("message")
        .and_then(|m| m.get("content"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_owned())
}

fn parse_stream_delta(json_text: &str) -> Option<Result<String, LlmError>> {
    let root: Value = match serde_json::from_str(json_text) {
        Ok(v) => v,
        Err(e) => return Some(Err(LlmError::ApiParse(e.to_string()))),
    };
    let delta = root
        .get("choices")
        .and_then(Value::as_array)
        .and_then(|arr| arr.first())
        .and_then(|c| c.get("delta"))
        .and_then(|d| d.get("content"))
        .and_then(Value::as_str)?;
    (!delta.is_empty()).then(|| Ok(delta.to_owned()))
}

#[cfg(test)]
#[path = "openai_test.rs"]
mod tests;
