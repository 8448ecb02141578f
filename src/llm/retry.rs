//! Bounded exponential backoff for provider throttling.
//!
//! Only [`FailureKind::RateLimited`] is retried. Each delay is computed from
//! the retry number; the caller gets the final `Result` back.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use super::config::RetryConfig;
use super::types::{FailureKind, LlmError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub base_delay: Duration,
    pub max_retries: u32,
}

impl RetryPolicy {
    /// Delay before retry number `retry` (zero-based): `base * 2^retry`.
    #[must_use]
    pub fn delay_for(&self, retry: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(retry))
    }
}

impl From<RetryConfig> for RetryPolicy {
    fn from(cfg: RetryConfig) -> Self {
        Self { base_delay: Duration::from_millis(cfg.base_delay_ms), max_retries: cfg.max_retries }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryConfig::default().into()
    }
}

/// Run `op` until it succeeds, fails with a non-throttling error, or the
/// retry budget is spent.
///
/// # Errors
///
/// Returns the last error produced by `op`.
pub async fn with_backoff<T, F, Fut>(policy: RetryPolicy, mut op: F) -> Result<T, LlmError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, LlmError>>,
{
    let mut retry = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if e.kind() == FailureKind::RateLimited && retry < policy.max_retries => {
                let delay = policy.delay_for(retry);
                warn!(retry = retry + 1, ?delay, error = %e, "llm: rate limited, backing off");
                tokio::time::sleep(delay).await;
                retry += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
#[path = "retry_test.rs"]
mod tests;
