use super::*;
use crate::llm::types::{Message, Sampling};

#[test]
fn cc_parse_text_response() {
    let json = serde_json::json!({
        "model": "gpt-4o-mini",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": "Hello!" },
            "finish_reason": "stop"
        }],
        "usage": { "prompt_tokens": 10, "completion_tokens": 5 }
    })
    .to_string();
    assert_eq!(parse_chat_completions_response(&json).unwrap(), "Hello!");
}

#[test]
fn cc_parse_null_content_is_empty() {
    let json = serde_json::json!({
        "choices": [{ "message": { "role": "assistant", "content": null } }]
    })
    .to_string();
    assert_eq!(parse_chat_completions_response(&json).unwrap(), "");
}

#[test]
fn cc_parse_missing_choices() {
    let json = serde_json::json!({ "model": "gpt-4o", "choices": [] }).to_string();
    assert!(parse_chat_completions_response(&json).is_err());
}

#[test]
fn build_messages_prepends_system() {
    let req = ChatRequest {
        system: "Be kind.".into(),
        messages: vec![Message::user("a"), Message::assistant("b"), Message::user("c")],
        sampling: Sampling::default(),
    };
    let msgs = build_messages(&req);
    let roles: Vec<&str> = msgs.iter().map(|m| m.role).collect();
    assert_eq!(roles, vec!["system", "user", "assistant", "user"]);
    assert_eq!(msgs[0].content, "Be kind.");
}

#[test]
fn request_body_omits_stream_flag_when_false() {
    let req = ChatRequest { system: String::new(), messages: vec![Message::user("hi")], sampling: Sampling::default() };
    let msgs = build_messages(&req);
    let body = serde_json::to_value(CcRequest::new("m", &req, &msgs, false)).unwrap();
    assert!(body.get("stream").is_none());
    assert_eq!(body["messages"].as_array().unwrap().len(), 1);
    let body = serde_json::to_value(CcRequest::new("m", &req, &msgs, true)).unwrap();
    assert_eq!(body["stream"], true);
}

#[test]
fn stream_delta_extracts_content() {
    let chunk = r#"{"choices":[{"index":0,"delta":{"content":"Hel"}}]}"#;
    assert_eq!(parse_stream_delta(chunk).unwrap().unwrap(), "Hel");
}

#[test]
fn stream_delta_skips_role_only_chunk() {
    let chunk = r#"{"choices":[{"index":0,"delta":{"role":"assistant"}}]}"#;
    assert!(parse_stream_delta(chunk).is_none());
}
