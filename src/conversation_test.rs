use super::*;

const GREETING: &str = "Hi! I'm the Hostal Levante assistant. How can I help you today?";

fn conversation() -> Conversation {
    Conversation::new(Locale::En, GREETING)
}

#[test]
fn new_conversation_starts_with_greeting() {
    let c = conversation();
    assert_eq!(c.phase(), Phase::Idle);
    assert_eq!(c.turns().len(), 1);
    let first = &c.turns()[0];
    assert_eq!(first.role, Role::Assistant);
    assert!(first.is_greeting);
    assert!(!first.is_error);
    assert_eq!(first.text, GREETING);
}

#[test]
fn blank_input_is_rejected_without_appending() {
    let mut c = conversation();
    for input in ["", "   ", "\n\t"] {
        assert_eq!(c.begin_send(input).unwrap_err(), SendRejected::EmptyInput);
    }
    assert_eq!(c.turns().len(), 1);
    assert_eq!(c.phase(), Phase::Idle);
}

#[test]
fn begin_send_appends_trimmed_user_turn() {
    let mut c = conversation();
    let pending = c.begin_send("  How to get here?  ").unwrap();
    assert_eq!(pending.input, "How to get here?");
    assert_eq!(pending.history.len(), 1);
    assert_eq!(pending.locale, Locale::En);
    assert_eq!(c.phase(), Phase::AwaitingReply);
    assert_eq!(c.turns().last().unwrap().text, "How to get here?");
    assert_eq!(c.turns().last().unwrap().role, Role::User);
}

#[test]
fn second_send_while_awaiting_is_busy() {
    let mut c = conversation();
    c.begin_send("first").unwrap();
    assert_eq!(c.begin_send("second").unwrap_err(), SendRejected::Busy);
    assert_eq!(c.turns().len(), 2);
}

#[test]
fn complete_returns_to_idle() {
    let mut c = conversation();
    c.begin_send("Wifi?").unwrap();
    c.complete("Yes, free Wifi.".into());
    assert_eq!(c.phase(), Phase::Idle);
    let last = c.turns().last().unwrap();
    assert_eq!(last.role, Role::Assistant);
    assert_eq!(last.text, "Yes, free Wifi.");
    assert!(!last.is_error);
    assert!(c.begin_send("next").is_ok());
}

#[test]
fn fail_appends_error_turn_and_returns_to_idle() {
    let mut c = conversation();
    c.begin_send("Wifi?").unwrap();
    c.fail(FailureKind::Network, "Connection error. Please try again.".into());
    assert_eq!(c.phase(), Phase::Idle);
    let last = c.turns().last().unwrap();
    assert!(last.is_error);
    assert_eq!(last.failure, Some(FailureKind::Network));
    assert_eq!(last.role, Role::Assistant);
}

#[test]
fn streaming_partials_replace_text_in_order() {
    let mut c = conversation();
    c.begin_send("hello?").unwrap();
    c.begin_stream();
    c.apply_partial("Hel");
    assert_eq!(c.turns().last().unwrap().text, "Hel");
    c.apply_partial("Hello ");
    assert_eq!(c.turns().last().unwrap().text, "Hello ");
    assert_eq!(c.phase(), Phase::AwaitingReply);
    c.complete("Hello there".into());
    assert_eq!(c.turns().len(), 3);
    assert_eq!(c.turns().last().unwrap().text, "Hello there");
    assert_eq!(c.phase(), Phase::Idle);
}

#[test]
fn failed_stream_replaces_partial_turn() {
    let mut c = conversation();
    c.begin_send("hello?").unwrap();
    c.begin_stream();
    c.apply_partial("Hel");
    c.fail(FailureKind::Network, "error".into());
    assert_eq!(c.turns().len(), 3);
    assert!(c.turns().last().unwrap().is_error);
}

#[test]
fn partial_outside_stream_is_ignored() {
    let mut c = conversation();
    c.apply_partial("stray");
    assert_eq!(c.turns().len(), 1);
    assert_eq!(c.turns()[0].text, GREETING);
}

#[test]
fn retry_candidate_only_after_error() {
    let mut c = conversation();
    assert!(c.retry_candidate().is_none());
    c.begin_send("Check-in time").unwrap();
    assert!(c.retry_candidate().is_none());
    c.fail(FailureKind::RateLimited, "busy".into());
    assert_eq!(c.retry_candidate(), Some("Check-in time"));
    c.begin_send("Check-in time").unwrap();
    c.complete("15:00".into());
    assert!(c.retry_candidate().is_none());
}

#[test]
fn reset_reseeds_greeting_in_new_locale() {
    let mut c = conversation();
    c.begin_send("hi").unwrap();
    assert!(!c.reset(Locale::Es, "¡Hola!"));
    c.complete("hello".into());
    assert!(c.reset(Locale::Es, "¡Hola!"));
    assert_eq!(c.locale(), Locale::Es);
    assert_eq!(c.turns().len(), 1);
    assert!(c.turns()[0].is_greeting);
    assert_eq!(c.turns()[0].text, "¡Hola!");
}

#[test]
fn open_flag_tracks_embed_state() {
    let mut c = conversation();
    assert!(!c.is_open());
    c.set_open(true);
    assert!(c.is_open());
}
