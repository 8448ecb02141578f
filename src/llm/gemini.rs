//! Google Gemini `generateContent` client.
//!
//! Thin HTTP wrapper for `models/{model}:generateContent` and
//! `models/{model}:streamGenerateContent?alt=sse`. Pure request building and
//! response parsing live in free functions for testability.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::config::LlmTimeouts;
use super::sse;
use super::types::{ChatRequest, ChatStream, LlmError, Message, Role};

// =============================================================================
// CLIENT
// =============================================================================

pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl GeminiClient {
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
        let url = format!("{}/models/{model}:generateContent", self.base_url);
        let response = self.post(&url, request, false).await?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| LlmError::ApiRequest(e.to_string()))?;
        if status != 200 {
            return Err(LlmError::ApiResponse { status, body: text });
        }

        parse_response(&text)
    }

    pub async fn chat_stream(&self, model: &str, request: &ChatRequest) -> Result<ChatStream, LlmError> {
        let url = format!("{}/models/{model}:streamGenerateContent", self.base_url);
        let response = self.post(&url, request, true).await?;

        let status = response.status().as_u16();
        if status != 200 {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::ApiResponse { status, body });
        }

        Ok(sse::text_stream(Box::pin(response.bytes_stream()), parse_stream_chunk))
    }

    async fn post(&self, url: &str, request: &ChatRequest, stream: bool) -> Result<reqwest::Response, LlmError> {
        let body = build_request(request);
        let mut builder = self
            .http
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body);
        if stream {
            builder = builder.query(&[("alt", "sse")]);
        }
        builder
            .send()
            .await
            .map_err(|e| LlmError::ApiRequest(e.to_string()))
    }
}

// =============================================================================
// WIRE TYPES
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ApiRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<ApiContent<'a>>,
    contents: Vec<ApiContent<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct ApiContent<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<ApiPart<'a>>,
}

#[derive(Debug, Serialize)]
struct ApiPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_k: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

// =============================================================================
// REQUEST BUILDING / PARSING
// =============================================================================

fn role_name(role: Role) -> &'static str {
    match role {
        Role::User => "user",
        Role::Assistant => "model",
    }
}

fn build_request(request: &ChatRequest) -> ApiRequest<'_> {
    let system_instruction = (!request.system.trim().is_empty())
        .then(|| ApiContent { role: None, parts: vec![ApiPart { text: &request.system }] });
    let contents = request
        .messages
        .iter()
        .map(|Message { role, text }| ApiContent { role: Some(role_name(*role)), parts: vec![ApiPart { text }] })
        .collect();
    let s = request.sampling;
    ApiRequest {
        system_instruction,
        contents,
        generation_config: GenerationConfig {
            temperature: s.temperature,
            top_p: s.top_p,
            top_k: s.top_k,
            max_output_tokens: s.max_output_tokens,
        },
    }
}

/// Concatenate the text parts of the first candidate.
fn candidate_text(api: ApiResponse) -> String {
    api.candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default()
}

fn parse_response(json: &str) -> Result<String, LlmError> {
    let api: ApiResponse = serde_json::from_str(json).map_err(|e| LlmError::ApiParse(e.to_string()))?;
    Ok(candidate_text(api))
}

fn parse_stream_chunk(json: &str) -> Option<Result<String, LlmError>> {
    match serde_json::from_str::<ApiResponse>(json) {
        Ok(api) => {
            let text = candidate_text(api);
            (!text.is_empty()).then_some(Ok(text))
        }
        Err(e) => Some(Err(LlmError::ApiParse(e.to_string()))),
    }
}

#[cfg(test)]
#[path = "gemini_test.rs"]
mod tests;
