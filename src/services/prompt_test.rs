use super::*;
use crate::llm::types::FailureKind;
use uuid::Uuid;

fn turn(role: Role, text: &str) -> Turn {
    Turn { role, text: text.into(), is_greeting: false, is_error: false, failure: None }
}

fn greeting() -> Turn {
    Turn { is_greeting: true, ..turn(Role::Assistant, "Hi!") }
}

fn error_turn() -> Turn {
    Turn {
        is_error: true,
        failure: Some(FailureKind::Network),
        ..turn(Role::Assistant, "Connection error. Please try again.")
    }
}

fn snippet(title: &str, content: &str) -> KnowledgeSnippet {
    KnowledgeSnippet { id: Uuid::new_v4(), title: title.into(), content: content.into() }
}

fn assert_alternating(messages: &[Message]) {
    assert_eq!(messages.first().map(|m| m.role), Some(Role::User), "must start with user");
    assert_eq!(messages.last().map(|m| m.role), Some(Role::User), "must end with user");
    for pair in messages.windows(2) {
        assert_ne!(pair[0].role, pair[1].role, "consecutive same-role turns: {messages:?}");
    }
}

#[test]
fn empty_input_is_rejected() {
    for input in ["", "  ", "\t\n"] {
        let err = build_request(&[greeting()], &[], Locale::En, input, Sampling::default()).unwrap_err();
        assert_eq!(err, PromptError::EmptyInput);
    }
}

#[test]
fn greeting_only_sends_just_the_user_message() {
    let req = build_request(&[greeting()], &[], Locale::En, " How to get here? ", Sampling::default()).unwrap();
    assert_eq!(req.messages, vec![Message::user("How to get here?")]);
}

#[test]
fn instruction_contains_locale_and_knowledge() {
    let knowledge = [snippet("Check-in", "From 15:00"), snippet("Wifi", "Free")];
    let req = build_request(&[greeting()], &knowledge, Locale::En, "How to get here?", Sampling::default()).unwrap();
    assert!(req.system.contains("Language: en."));
    assert!(req.system.contains("Check-in: From 15:00 | Wifi: Free"));
}

#[test]
fn empty_knowledge_leaves_no_section_or_separator() {
    let instruction = build_instruction(Locale::Es, &[]);
    assert!(!instruction.contains("CURRENT KNOWLEDGE"));
    assert!(!instruction.contains(" | "));
    assert!(!instruction.ends_with(": "));
}

#[test]
fn knowledge_keeps_insertion_order() {
    let knowledge = [snippet("B", "2"), snippet("A", "1")];
    let instruction = build_instruction(Locale::Es, &knowledge);
    let b = instruction.find("B: 2").unwrap();
    let a = instruction.find("A: 1").unwrap();
    assert!(b < a);
}

#[test]
fn history_drops_greeting_and_error_turns() {
    let history = [
        greeting(),
        turn(Role::User, "Wifi?"),
        turn(Role::Assistant, "Yes."),
        turn(Role::User, "Parking?"),
        error_turn(),
    ];
    let req = build_request(&history, &[], Locale::En, "Parking?", Sampling::default()).unwrap();
    assert_eq!(
        req.messages,
        vec![Message::user("Wifi?"), Message::assistant("Yes."), Message::user("Parking?")]
    );
}

#[test]
fn consecutive_user_turns_collapse_to_latest() {
    let history = [
        greeting(),
        turn(Role::User, "first"),
        error_turn(),
        turn(Role::User, "second"),
        turn(Role::Assistant, "answer"),
    ];
    let req = build_request(&history, &[], Locale::En, "third", Sampling::default()).unwrap();
    assert_eq!(
        req.messages,
        vec![Message::user("second"), Message::assistant("answer"), Message::user("third")]
    );
}

#[test]
fn leading_assistant_turn_is_dropped() {
    let history = [turn(Role::Assistant, "unsolicited"), turn(Role::User, "q"), turn(Role::Assistant, "a")];
    let req = build_request(&history, &[], Locale::En, "next", Sampling::default()).unwrap();
    assert_eq!(req.messages[0], Message::user("q"));
    assert_alternating(&req.messages);
}

#[test]
fn alternation_holds_for_mixed_histories() {
    use Role::{Assistant, User};
    let shapes: [&[Role]; 5] = [
        &[],
        &[Assistant, Assistant, User],
        &[User, User, User],
        &[User, Assistant, Assistant, User, User, Assistant],
        &[Assistant, User, Assistant, User],
    ];
    for shape in shapes {
        let mut history = vec![greeting()];
        history.extend(shape.iter().enumerate().map(|(i, r)| turn(*r, &format!("t{i}"))));
        history.push(error_turn());
        let req = build_request(&history, &[], Locale::Ca, "now", Sampling::default()).unwrap();
        assert_alternating(&req.messages);
        assert_eq!(req.messages.last().unwrap().text, "now");
    }
}

#[test]
fn sampling_is_forwarded() {
    let sampling = Sampling { temperature: 0.2, top_p: None, top_k: Some(5), max_output_tokens: Some(256) };
    let req = build_request(&[greeting()], &[], Locale::Es, "hola", sampling).unwrap();
    assert_eq!(req.sampling, sampling);
}
