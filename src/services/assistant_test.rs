use super::*;
use std::time::Duration;

use crate::llm::mock::{MockLlm, rate_limited};
use crate::llm::types::{FailureKind, Message, Sampling};

fn request() -> ChatRequest {
    ChatRequest { system: "policy".into(), messages: vec![Message::user("Wifi?")], sampling: Sampling::default() }
}

fn assistant(mock: &Arc<MockLlm>) -> Assistant {
    let llm: Arc<dyn LlmChat> = mock.clone();
    Assistant::new(Some(llm), RetryPolicy::default())
}

#[tokio::test]
async fn missing_client_is_configuration_failure() {
    let assistant = Assistant::new(None, RetryPolicy::default());
    let err = assistant.reply(&request()).await.unwrap_err();
    assert_eq!(err.kind(), FailureKind::ConfigurationMissing);
}

#[tokio::test]
async fn implausible_key_fails_without_calling_provider() {
    for key in ["", "short", "undefined"] {
        let mock = Arc::new(MockLlm::with_key(key));
        let err = assistant(&mock).reply(&request()).await.unwrap_err();
        assert_eq!(err.kind(), FailureKind::ConfigurationMissing, "key {key:?}");
        assert!(assistant(&mock).reply_stream(&request()).await.is_err());
        assert_eq!(mock.calls(), 0);
    }
}

#[tokio::test]
async fn reply_strips_asterisks_and_trims() {
    let mock = Arc::new(MockLlm::new().reply(Ok("  **Check-in** from 15:00 \n".into())));
    let text = assistant(&mock).reply(&request()).await.unwrap();
    assert_eq!(text, "Check-in from 15:00");
    assert_eq!(mock.last_request(), Some(request()));
}

#[tokio::test]
async fn blank_reply_is_empty_reply_failure() {
    let mock = Arc::new(MockLlm::new().reply(Ok(" ** \n".into())));
    let err = assistant(&mock).reply(&request()).await.unwrap_err();
    assert_eq!(err.kind(), FailureKind::EmptyReply);
}

#[tokio::test(start_paused = true)]
async fn throttled_twice_then_succeeds_after_six_seconds() {
    let mock = Arc::new(
        MockLlm::new()
            .reply(Err(rate_limited()))
            .reply(Err(rate_limited()))
            .reply(Ok("Bienvenido".into())),
    );
    let start = tokio::time::Instant::now();
    let text = assistant(&mock).reply(&request()).await.unwrap();
    assert_eq!(text, "Bienvenido");
    assert_eq!(mock.calls(), 3);
    assert_eq!(start.elapsed(), Duration::from_secs(6));
}

#[tokio::test]
async fn network_failure_is_surfaced_immediately() {
    let mock = Arc::new(MockLlm::new().reply(Err(LlmError::ApiRequest("reset".into()))));
    let err = assistant(&mock).reply(&request()).await.unwrap_err();
    assert_eq!(err.kind(), FailureKind::Network);
    assert_eq!(mock.calls(), 1);
}

#[tokio::test]
async fn stream_yields_cumulative_text_in_arrival_order() {
    let mock = Arc::new(MockLlm::new().stream(&["Hel", "lo "]));
    let partials: Vec<String> = assistant(&mock)
        .reply_stream(&request())
        .await
        .unwrap()
        .try_collect()
        .await
        .unwrap();
    assert_eq!(partials, ["Hel", "Hello "]);
}

#[tokio::test]
async fn stream_strips_asterisks_per_chunk() {
    let mock = Arc::new(MockLlm::new().stream(&["**Wi", "fi** is free"]));
    let partials: Vec<String> = assistant(&mock)
        .reply_stream(&request())
        .await
        .unwrap()
        .try_collect()
        .await
        .unwrap();
    assert_eq!(partials.last().map(String::as_str), Some("Wifi is free"));
}

#[tokio::test(start_paused = true)]
async fn stream_open_is_retried_when_throttled() {
    let mock = Arc::new(
        MockLlm::new()
            .stream_script(Err(rate_limited()))
            .stream(&["ok"]),
    );
    let partials: Vec<String> = assistant(&mock)
        .reply_stream(&request())
        .await
        .unwrap()
        .try_collect()
        .await
        .unwrap();
    assert_eq!(partials, ["ok"]);
    assert_eq!(mock.calls(), 2);
}

#[tokio::test]
async fn mid_stream_error_is_yielded_after_partials() {
    let mock = Arc::new(
        MockLlm::new().stream_script(Ok(vec![Ok("Hel".into()), Err(LlmError::ApiRequest("eof".into()))])),
    );
    let items: Vec<Result<String, LlmError>> = assistant(&mock)
        .reply_stream(&request())
        .await
        .unwrap()
        .collect()
        .await;
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].as_ref().unwrap(), "Hel");
    assert_eq!(items[1].as_ref().unwrap_err().kind(), FailureKind::Network);
}

#[test]
fn clean_reply_rejects_marker_only_text() {
    assert!(matches!(clean_reply("***"), Err(LlmError::EmptyReply)));
    assert_eq!(clean_reply(" a*b ").unwrap(), "ab");
}
