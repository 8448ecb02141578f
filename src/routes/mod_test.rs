use super::*;
use std::net::SocketAddr;
use std::sync::Arc;

use crate::llm::LlmChat;
use crate::llm::mock::MockLlm;
use crate::state::test_helpers;

/// Serve `app(state)` on an ephemeral port; returns its base URL.
async fn serve(state: AppState) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app(state).into_make_service_with_connect_info::<SocketAddr>())
            .await
            .unwrap();
    });
    format!("http://{addr}")
}

#[test]
fn request_locale_prefers_query_then_referer() {
    let mut headers = HeaderMap::new();
    headers.insert(REFERER, "https://hostal.example/en/rooms".parse().unwrap());
    headers.insert(ACCEPT_LANGUAGE, "de".parse().unwrap());
    assert_eq!(request_locale(Some("ca"), &headers), Locale::Ca);
    assert_eq!(request_locale(None, &headers), Locale::En);
    headers.remove(REFERER);
    assert_eq!(request_locale(None, &headers), Locale::De);
    assert_eq!(request_locale(None, &HeaderMap::new()), Locale::BASE);
}

#[test]
fn api_error_carries_code_and_retryable() {
    let err = crate::rate_limit::RateLimitError::PerClientExceeded { limit: 10, window_secs: 60 };
    let (status, Json(body)) = api_error(StatusCode::TOO_MANY_REQUESTS, &err);
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["retryable"], true);
    assert!(body["code"].is_string());
}

#[tokio::test]
async fn healthz_is_ok() {
    let base = serve(test_helpers::test_app_state().await).await;
    let resp = reqwest::get(format!("{base}/healthz")).await.unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::OK);
}

#[tokio::test]
async fn session_round_trip_over_http() {
    let llm: Arc<dyn LlmChat> = Arc::new(MockLlm::new().reply(Ok("We have free wifi.".into())));
    let base = serve(test_helpers::test_app_state_with_llm(llm).await).await;
    let client = reqwest::Client::new();

    let created: serde_json::Value = client
        .post(format!("{base}/api/chat/sessions?lang=en"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let id = created["session_id"].as_str().unwrap().to_owned();

    let view: serde_json::Value = client
        .post(format!("{base}/api/chat/sessions/{id}/messages"))
        .json(&serde_json::json!({ "message": "Is there wifi?" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(view["turns"][2]["text"], "We have free wifi.");
}

#[tokio::test]
async fn stream_endpoint_emits_named_events() {
    let llm: Arc<dyn LlmChat> = Arc::new(MockLlm::new().stream(&["Hel", "lo"]));
    let state = test_helpers::test_app_state_with_llm(llm).await;
    let id = test_helpers::seed_session(&state, Locale::En).await;
    let base = serve(state).await;

    let body = reqwest::Client::new()
        .post(format!("{base}/api/chat/sessions/{id}/messages/stream"))
        .json(&serde_json::json!({ "message": "hi" }))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(body.contains("event: partial"));
    assert!(body.contains("event: done"));
    assert!(!body.contains("event: error"));
}

#[tokio::test]
async fn knowledge_admin_over_http() {
    let base = serve(test_helpers::test_app_state().await).await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{base}/api/admin/knowledge"))
        .json(&serde_json::json!({ "title": "Wifi", "content": "Password: levante" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::CREATED);

    let list: serde_json::Value = client
        .get(format!("{base}/api/admin/knowledge"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(list.as_array().map(Vec::len), Some(1));
    assert_eq!(list[0]["title"], "Wifi");
}
