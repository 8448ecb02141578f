use super::*;
use std::sync::atomic::{AtomicU32, Ordering};

fn throttled() -> LlmError {
    LlmError::ApiResponse { status: 429, body: "Too Many Requests".into() }
}

#[test]
fn delay_doubles_from_base() {
    let policy = RetryPolicy::default();
    assert_eq!(policy.delay_for(0), Duration::from_secs(2));
    assert_eq!(policy.delay_for(1), Duration::from_secs(4));
    assert_eq!(policy.delay_for(2), Duration::from_secs(8));
}

#[test]
fn policy_from_config() {
    let policy = RetryPolicy::from(RetryConfig { base_delay_ms: 250, max_retries: 5 });
    assert_eq!(policy.base_delay, Duration::from_millis(250));
    assert_eq!(policy.max_retries, 5);
}

#[tokio::test(start_paused = true)]
async fn succeeds_on_third_attempt_after_base_plus_double_base() {
    let calls = AtomicU32::new(0);
    let start = tokio::time::Instant::now();

    let result = with_backoff(RetryPolicy::default(), || {
        let n = calls.fetch_add(1, Ordering::SeqCst);
        async move { if n < 2 { Err(throttled()) } else { Ok("Bienvenido") } }
    })
    .await;

    assert_eq!(result.unwrap(), "Bienvenido");
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(start.elapsed(), Duration::from_secs(6));
}

#[tokio::test(start_paused = true)]
async fn gives_up_after_retry_budget() {
    let calls = AtomicU32::new(0);
    let start = tokio::time::Instant::now();

    let result: Result<(), LlmError> = with_backoff(RetryPolicy::default(), || {
        calls.fetch_add(1, Ordering::SeqCst);
        async { Err(throttled()) }
    })
    .await;

    assert_eq!(result.unwrap_err().kind(), FailureKind::RateLimited);
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(start.elapsed(), Duration::from_secs(6));
}

#[tokio::test(start_paused = true)]
async fn network_errors_are_not_retried() {
    let calls = AtomicU32::new(0);
    let start = tokio::time::Instant::now();

    let result: Result<(), LlmError> = with_backoff(RetryPolicy::default(), || {
        calls.fetch_add(1, Ordering::SeqCst);
        async { Err(LlmError::ApiRequest("connection refused".into())) }
    })
    .await;

    assert_eq!(result.unwrap_err().kind(), FailureKind::Network);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(start.elapsed(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn zero_budget_returns_first_throttle() {
    let calls = AtomicU32::new(0);
    let policy = RetryPolicy { base_delay: Duration::from_secs(2), max_retries: 0 };

    let result: Result<(), LlmError> = with_backoff(policy, || {
        calls.fetch_add(1, Ordering::SeqCst);
        async { Err(throttled()) }
    })
    .await;

    assert!(result.is_err());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}
