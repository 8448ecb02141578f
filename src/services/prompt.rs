//! Request builder — conversation + knowledge → provider request.
//!
//! DESIGN
//! ======
//! Pure transformation. The instruction string is fixed concierge policy
//! prose with the locale tag and the flattened knowledge set interpolated.
//! History is reduced to a strictly alternating user/assistant sequence
//! that starts with a user turn, and the new user message is appended last.

use crate::conversation::Turn;
use crate::i18n::Locale;
use crate::llm::types::{ChatRequest, Message, Role, Sampling};
use crate::services::knowledge::KnowledgeSnippet;

const KNOWLEDGE_SEPARATOR: &str = " | ";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PromptError {
    #[error("user input is empty")]
    EmptyInput,
}

impl crate::error::ErrorCode for PromptError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::EmptyInput => "E_EMPTY_INPUT",
        }
    }
}

/// Build the outbound request for a new user message.
///
/// `history` holds the turns that precede `input`.
///
/// # Errors
///
/// Returns [`PromptError::EmptyInput`] if `input` is blank.
pub fn build_request(
    history: &[Turn],
    knowledge: &[KnowledgeSnippet],
    locale: Locale,
    input: &str,
    sampling: Sampling,
) -> Result<ChatRequest, PromptError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(PromptError::EmptyInput);
    }

    let mut messages = alternating_history(history);
    messages.push(Message::user(input));

    Ok(ChatRequest { system: build_instruction(locale, knowledge), messages, sampling })
}

pub(crate) fn build_instruction(locale: Locale, knowledge: &[KnowledgeSnippet]) -> String {
    let mut instruction = format!(
        "You are the virtual assistant of Hostal Levante (Barcelona).\n\
         Language: {locale}. Always answer in this language.\n\
         You are friendly, helpful and act like an expert receptionist: warm, brief and professional.\n\
         RULES:\n\
         - Concise answers (three paragraphs at most).\n\
         - Never write literal asterisks; plain text only.\n\
         - Use \"•\" at the start of each list item.\n\
         - If you do not know something, invite the guest to use the contact form."
    );
    if !knowledge.is_empty() {
        let flattened = knowledge
            .iter()
            .map(|k| format!("{}: {}", k.title, k.content))
            .collect::<Vec<_>>()
            .join(KNOWLEDGE_SEPARATOR);
        instruction.push_str("\nCURRENT KNOWLEDGE: ");
        instruction.push_str(&flattened);
    }
    instruction
}

/// Reduce prior turns to an alternating sequence starting with a user turn
/// and ending with an assistant turn.
pub(crate) fn alternating_history(history: &[Turn]) -> Vec<Message> {
    let mut out: Vec<Message> = Vec::new();
    for turn in history.iter().filter(|t| !t.is_greeting && !t.is_error) {
        match out.last_mut() {
            // Same role as the previous kept turn: the later one wins.
            Some(prev) if prev.role == turn.role => prev.text.clone_from(&turn.text),
            _ => out.push(Message { role: turn.role, text: turn.text.clone() }),
        }
    }
    if out.first().is_some_and(|m| m.role == Role::Assistant) {
        out.remove(0);
    }
    if out.last().is_some_and(|m| m.role == Role::User) {
        out.pop();
    }
    out
}

#[cfg(test)]
#[path = "prompt_test.rs"]
mod tests;
