//! LLM configuration parsed from environment variables.

use super::types::{LlmError, Sampling};

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_LLM_REQUEST_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_LLM_CONNECT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_RETRY_BASE_MS: u64 = 2000;
pub const DEFAULT_MAX_RETRIES: u32 = 2;

/// Shortest credential accepted as structurally plausible.
pub const MIN_API_KEY_LEN: usize = 10;

const PLACEHOLDER_KEYS: &[&str] = &["undefined", "null", "api_key", "your_api_key", "changeme"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmProviderKind {
    Gemini,
    OpenAi,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LlmTimeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryConfig {
    pub base_delay_ms: u64,
    pub max_retries: u32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self { base_delay_ms: DEFAULT_RETRY_BASE_MS, max_retries: DEFAULT_MAX_RETRIES }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LlmConfig {
    pub provider: LlmProviderKind,
    /// May be empty; validated at call time by [`check_api_key`].
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub timeouts: LlmTimeouts,
    pub sampling: Sampling,
    pub retry: RetryConfig,
}

impl LlmConfig {
    /// Build typed LLM config from environment variables.
    ///
    /// Required:
    /// - `LLM_API_KEY_ENV` (names the env var containing the key)
    ///
    /// Optional:
    /// - `LLM_PROVIDER`: `gemini` (default) or `openai`
    /// - `LLM_MODEL`: provider default when absent
    /// - `LLM_BASE_URL`: provider default API base URL
    /// - `LLM_REQUEST_TIMEOUT_SECS`: default 60
    /// - `LLM_CONNECT_TIMEOUT_SECS`: default 10
    /// - `LLM_TEMPERATURE`, `LLM_TOP_P`, `LLM_TOP_K`, `LLM_MAX_OUTPUT_TOKENS`
    /// - `LLM_RETRY_BASE_MS`: default 2000
    /// - `LLM_MAX_RETRIES`: default 2
    ///
    /// The key variable named by `LLM_API_KEY_ENV` may be unset; the key is
    /// then empty and every call fails as a configuration failure without
    /// touching the network.
    ///
    /// # Errors
    ///
    /// Returns an error if `LLM_API_KEY_ENV` is unset or a value is malformed.
    pub fn from_env() -> Result<Self, LlmError> {
        let provider = parse_provider(std::env::var("LLM_PROVIDER").ok().as_deref())?;

        let key_var =
            std::env::var("LLM_API_KEY_ENV").map_err(|_| LlmError::MissingApiKey { var: "LLM_API_KEY_ENV".into() })?;
        let api_key = std::env::var(&key_var).unwrap_or_default();

        let model = std::env::var("LLM_MODEL").unwrap_or_else(|_| default_model(provider).to_string());
        let base_url = std::env::var("LLM_BASE_URL")
            .unwrap_or_else(|_| default_base_url(provider).to_string())
            .trim_end_matches('/')
            .to_string();
        let timeouts = LlmTimeouts {
            request_secs: env_parse("LLM_REQUEST_TIMEOUT_SECS", DEFAULT_LLM_REQUEST_TIMEOUT_SECS),
            connect_secs: env_parse("LLM_CONNECT_TIMEOUT_SECS", DEFAULT_LLM_CONNECT_TIMEOUT_SECS),
        };
        let defaults = Sampling::default();
        let sampling = Sampling {
            temperature: env_parse("LLM_TEMPERATURE", defaults.temperature),
            top_p: env_parse_opt("LLM_TOP_P").or(defaults.top_p),
            top_k: env_parse_opt("LLM_TOP_K").or(defaults.top_k),
            max_output_tokens: env_parse_opt("LLM_MAX_OUTPUT_TOKENS"),
        };
        if !(0.0..=2.0).contains(&sampling.temperature) {
            return Err(LlmError::ConfigParse(format!(
                "LLM_TEMPERATURE out of range: {}",
                sampling.temperature
            )));
        }
        let retry = RetryConfig {
            base_delay_ms: env_parse("LLM_RETRY_BASE_MS", DEFAULT_RETRY_BASE_MS),
            max_retries: env_parse("LLM_MAX_RETRIES", DEFAULT_MAX_RETRIES),
        };

        Ok(Self { provider, api_key, model, base_url, timeouts, sampling, retry })
    }
}

/// Reject credentials that are absent or obviously not real.
///
/// # Errors
///
/// Returns [`LlmError::InvalidApiKey`] when the key is empty, shorter than
/// [`MIN_API_KEY_LEN`], or a known placeholder.
pub fn check_api_key(key: &str) -> Result<(), LlmError> {
    let key = key.trim();
    if key.is_empty() {
        return Err(LlmError::InvalidApiKey("empty".into()));
    }
    if PLACEHOLDER_KEYS.contains(&key.to_ascii_lowercase().as_str()) {
        return Err(LlmError::InvalidApiKey("placeholder value".into()));
    }
    if key.len() < MIN_API_KEY_LEN {
        return Err(LlmError::InvalidApiKey(format!("shorter than {MIN_API_KEY_LEN} characters")));
    }
    Ok(())
}

pub(crate) fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    env_parse_opt(key).unwrap_or(default)
}

fn env_parse_opt<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse::<T>().ok())
}

fn parse_provider(raw: Option<&str>) -> Result<LlmProviderKind, LlmError> {
    match raw.unwrap_or("gemini") {
        "gemini" => Ok(LlmProviderKind::Gemini),
        "openai" => Ok(LlmProviderKind::OpenAi),
        other => Err(LlmError::ConfigParse(format!("unknown LLM_PROVIDER: {other}"))),
    }
}

fn default_model(provider: LlmProviderKind) -> &'static str {
    match provider {
        LlmProviderKind::Gemini => "gemini-2.5-flash",
        LlmProviderKind::OpenAi => "gpt-4o-mini",
    }
}

fn default_base_url(provider: LlmProviderKind) -> &'static str {
    match provider {
        LlmProviderKind::Gemini => DEFAULT_GEMINI_BASE_URL,
        LlmProviderKind::OpenAi => DEFAULT_OPENAI_BASE_URL,
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
