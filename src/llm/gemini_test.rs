use super::*;
use crate::llm::types::Sampling;

fn request() -> ChatRequest {
    ChatRequest {
        system: "Be brief.".into(),
        messages: vec![Message::user("Hi"), Message::assistant("Hello!"), Message::user("Wifi?")],
        sampling: Sampling::default(),
    }
}

#[test]
fn build_request_maps_roles_and_instruction() {
    let req = request();
    let json = serde_json::to_value(build_request(&req)).unwrap();
    assert_eq!(json["systemInstruction"]["parts"][0]["text"], "Be brief.");
    assert!(json["systemInstruction"].get("role").is_none());
    let contents = json["contents"].as_array().unwrap();
    assert_eq!(contents.len(), 3);
    assert_eq!(contents[0]["role"], "user");
    assert_eq!(contents[1]["role"], "model");
    assert_eq!(contents[2]["parts"][0]["text"], "Wifi?");
    assert_eq!(json["generationConfig"]["topK"], 40);
    assert!(json["generationConfig"].get("maxOutputTokens").is_none());
}

#[test]
fn build_request_omits_blank_instruction() {
    let mut req = request();
    req.system = "  ".into();
    let json = serde_json::to_value(build_request(&req)).unwrap();
    assert!(json.get("systemInstruction").is_none());
}

#[test]
fn parse_response_joins_candidate_parts() {
    let json = serde_json::json!({
        "candidates": [{ "content": { "role": "model", "parts": [{ "text": "Check-in " }, { "text": "is at 15:00." }] } }],
        "usageMetadata": { "promptTokenCount": 10 }
    })
    .to_string();
    assert_eq!(parse_response(&json).unwrap(), "Check-in is at 15:00.");
}

#[test]
fn parse_response_without_candidates_is_empty_text() {
    let json = serde_json::json!({ "promptFeedback": { "blockReason": "SAFETY" } }).to_string();
    assert_eq!(parse_response(&json).unwrap(), "");
}

#[test]
fn parse_response_invalid_json() {
    assert!(matches!(parse_response("not json"), Err(LlmError::ApiParse(_))));
}

#[test]
fn parse_stream_chunk_skips_textless_chunks() {
    let empty = serde_json::json!({ "candidates": [{ "finishReason": "STOP" }] }).to_string();
    assert!(parse_stream_chunk(&empty).is_none());

    let text = serde_json::json!({ "candidates": [{ "content": { "parts": [{ "text": "Hel" }] } }] }).to_string();
    assert_eq!(parse_stream_chunk(&text).unwrap().unwrap(), "Hel");
}
