//! Conversation state — ordered turns plus the send/reply state machine.
//!
//! DESIGN
//! ======
//! `Empty → Idle ⇄ AwaitingReply`. A conversation is seeded with the
//! localized greeting on construction, so it is never observed in `Empty`
//! from outside this module. `begin_send` is the only way into
//! `AwaitingReply` and refuses while a reply is pending, which caps each
//! conversation at one in-flight provider call. Every completion path
//! (`complete`, `fail`) returns to `Idle`.
//!
//! Turns are append-only. The single exception is the streaming assistant
//! turn, whose text is replaced by successively longer prefixes until the
//! stream finishes.

use std::time::Instant;

use serde::Serialize;

use crate::i18n::Locale;
use crate::llm::types::{FailureKind, Role};

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Turn {
    pub role: Role,
    pub text: String,
    pub is_greeting: bool,
    pub is_error: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureKind>,
}

impl Turn {
    fn greeting(text: &str) -> Self {
        Self { role: Role::Assistant, text: text.to_owned(), is_greeting: true, is_error: false, failure: None }
    }

    fn user(text: &str) -> Self {
        Self { role: Role::User, text: text.to_owned(), is_greeting: false, is_error: false, failure: None }
    }

    fn assistant(text: String) -> Self {
        Self { role: Role::Assistant, text, is_greeting: false, is_error: false, failure: None }
    }

    fn error(kind: FailureKind, text: String) -> Self {
        Self { role: Role::Assistant, text, is_greeting: false, is_error: true, failure: Some(kind) }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Empty,
    Idle,
    AwaitingReply,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SendRejected {
    #[error("message is empty")]
    EmptyInput,
    #[error("a reply is already pending")]
    Busy,
}

/// Snapshot handed to the request builder when a send is accepted.
#[derive(Debug, Clone)]
pub struct PendingSend {
    /// Turns before the new user message.
    pub history: Vec<Turn>,
    /// Trimmed user input.
    pub input: String,
    pub locale: Locale,
}

// =============================================================================
// CONVERSATION
// =============================================================================

#[derive(Debug, Clone)]
pub struct Conversation {
    locale: Locale,
    turns: Vec<Turn>,
    phase: Phase,
    /// Index of the assistant turn being streamed, if any.
    streaming: Option<usize>,
    /// Widget open/closed as last reported by the embedding page.
    open: bool,
    last_active: Instant,
}

impl Conversation {
    /// Create a conversation seeded with `greeting`.
    #[must_use]
    pub fn new(locale: Locale, greeting: &str) -> Self {
        let mut conversation = Self {
            locale,
            turns: Vec::new(),
            phase: Phase::Empty,
            streaming: None,
            open: false,
            last_active: Instant::now(),
        };
        conversation.seed(greeting);
        conversation
    }

    fn seed(&mut self, greeting: &str) {
        debug_assert_eq!(self.phase, Phase::Empty);
        self.turns.push(Turn::greeting(greeting));
        self.phase = Phase::Idle;
    }

    #[must_use]
    pub fn locale(&self) -> Locale {
        self.locale
    }

    #[must_use]
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn set_open(&mut self, open: bool) {
        self.open = open;
        self.touch();
    }

    #[must_use]
    pub fn last_active(&self) -> Instant {
        self.last_active
    }

    fn touch(&mut self) {
        self.last_active = Instant::now();
    }

    /// Accept a user message: append it and move to `AwaitingReply`.
    ///
    /// # Errors
    ///
    /// [`SendRejected::EmptyInput`] for blank input, [`SendRejected::Busy`]
    /// while a reply is pending. Neither appends a turn.
    pub fn begin_send(&mut self, input: &str) -> Result<PendingSend, SendRejected> {
        let input = input.trim();
        if input.is_empty() {
            return Err(SendRejected::EmptyInput);
        }
        if self.phase == Phase::AwaitingReply {
            return Err(SendRejected::Busy);
        }
        let history = self.turns.clone();
        self.turns.push(Turn::user(input));
        self.phase = Phase::AwaitingReply;
        self.touch();
        Ok(PendingSend { history, input: input.to_owned(), locale: self.locale })
    }

    /// Start a streamed assistant turn with empty text.
    pub fn begin_stream(&mut self) {
        if self.phase != Phase::AwaitingReply || self.streaming.is_some() {
            return;
        }
        self.turns.push(Turn::assistant(String::new()));
        self.streaming = Some(self.turns.len() - 1);
    }

    /// Replace the streamed turn's text with the latest cumulative prefix.
    pub fn apply_partial(&mut self, text: &str) {
        if let Some(idx) = self.streaming {
            self.turns[idx].text.clear();
            self.turns[idx].text.push_str(text);
            self.touch();
        }
    }

    /// Finish the pending reply with `text` and return to `Idle`.
    pub fn complete(&mut self, text: String) {
        match self.streaming.take() {
            Some(idx) => self.turns[idx].text = text,
            None => self.turns.push(Turn::assistant(text)),
        }
        self.finish();
    }

    /// Finish the pending reply with an error turn and return to `Idle`.
    /// A partially streamed turn is replaced by the error turn.
    pub fn fail(&mut self, kind: FailureKind, text: String) {
        if let Some(idx) = self.streaming.take() {
            self.turns.truncate(idx);
        }
        self.turns.push(Turn::error(kind, text));
        self.finish();
    }

    fn finish(&mut self) {
        self.phase = Phase::Idle;
        self.touch();
    }

    /// Last user message, if the conversation currently ends in an error
    /// turn. Used by the one-tap retry.
    #[must_use]
    pub fn retry_candidate(&self) -> Option<&str> {
        let (last, rest) = self.turns.split_last()?;
        if !last.is_error || self.phase != Phase::Idle {
            return None;
        }
        rest.iter()
            .rev()
            .find(|t| t.role == Role::User)
            .map(|t| t.text.as_str())
    }

    /// Start over in `locale` with a fresh greeting. Ignored while a reply
    /// is pending.
    pub fn reset(&mut self, locale: Locale, greeting: &str) -> bool {
        if self.phase == Phase::AwaitingReply {
            return false;
        }
        self.locale = locale;
        self.turns.clear();
        self.streaming = None;
        self.phase = Phase::Empty;
        self.seed(greeting);
        self.touch();
        true
    }
}

#[cfg(test)]
#[path = "conversation_test.rs"]
mod tests;
