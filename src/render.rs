//! Presentation — the widget's view of a conversation.
//!
//! DESIGN
//! ======
//! Handlers return a `ChatView` snapshot rather than raw turns. Reply text
//! is pre-split into paragraph and bullet blocks so the widget only has to
//! lay them out. `typing` mirrors the pending-reply state.

use serde::Serialize;
use uuid::Uuid;

use crate::conversation::{Conversation, Phase, Turn};
use crate::i18n::{Catalog, Locale, TextKey};
use crate::llm::types::{FailureKind, Role};

const BULLET_MARKERS: [&str; 2] = ["•", "- "];

// =============================================================================
// VIEW TYPES
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Paragraph { text: String },
    Bullets { items: Vec<String> },
}

#[derive(Debug, Clone, Serialize)]
pub struct TurnView {
    pub role: Role,
    pub text: String,
    pub blocks: Vec<Block>,
    pub is_greeting: bool,
    pub is_error: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureKind>,
    /// Quick-tip chips; only the greeting carries them.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<&'static str>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatView {
    pub session_id: Uuid,
    pub locale: Locale,
    pub turns: Vec<TurnView>,
    pub typing: bool,
    pub open: bool,
    pub can_retry: bool,
    pub placeholder: &'static str,
    pub book_label: &'static str,
}

/// Open/closed notice relayed by the embedding page. Fire-and-forget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EmbedNotice {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub open: bool,
}

impl EmbedNotice {
    pub const KIND: &'static str = "chatbot_state";

    #[must_use]
    pub fn new(open: bool) -> Self {
        Self { kind: Self::KIND, open }
    }
}

// =============================================================================
// RENDERING
// =============================================================================

#[must_use]
pub fn chat_view(session_id: Uuid, conversation: &Conversation, catalog: &Catalog) -> ChatView {
    let locale = conversation.locale();
    ChatView {
        session_id,
        locale,
        turns: conversation
            .turns()
            .iter()
            .map(|t| turn_view(t, locale, catalog))
            .collect(),
        typing: conversation.phase() == Phase::AwaitingReply,
        open: conversation.is_open(),
        can_retry: conversation.retry_candidate().is_some(),
        placeholder: catalog.text(locale, TextKey::InputPlaceholder),
        book_label: catalog.text(locale, TextKey::BookNow),
    }
}

fn turn_view(turn: &Turn, locale: Locale, catalog: &Catalog) -> TurnView {
    TurnView {
        role: turn.role,
        text: turn.text.clone(),
        blocks: blocks(&turn.text),
        is_greeting: turn.is_greeting,
        is_error: turn.is_error,
        failure: turn.failure,
        suggestions: if turn.is_greeting { catalog.quick_tips(locale) } else { Vec::new() },
    }
}

/// Split reply text into paragraphs and bullet lists.
///
/// Blank lines end a paragraph. Lines starting with `•` or `- ` are bullet
/// items; consecutive items share one list.
#[must_use]
pub fn blocks(text: &str) -> Vec<Block> {
    let mut out = Vec::new();
    let mut paragraph: Vec<&str> = Vec::new();
    let mut items: Vec<String> = Vec::new();

    for line in text.lines().map(str::trim) {
        if let Some(item) = bullet_item(line) {
            flush_paragraph(&mut paragraph, &mut out);
            items.push(item.to_owned());
        } else if line.is_empty() {
            flush_paragraph(&mut paragraph, &mut out);
            flush_items(&mut items, &mut out);
        } else {
            flush_items(&mut items, &mut out);
            paragraph.push(line);
        }
    }
    flush_paragraph(&mut paragraph, &mut out);
    flush_items(&mut items, &mut out);
    out
}

fn bullet_item(line: &str) -> Option<&str> {
    BULLET_MARKERS
        .iter()
        .find_map(|marker| line.strip_prefix(marker))
        .map(str::trim)
}

fn flush_paragraph(lines: &mut Vec<&str>, out: &mut Vec<Block>) {
    if !lines.is_empty() {
        out.push(Block::Paragraph { text: lines.join("\n") });
        lines.clear();
    }
}

fn flush_items(items: &mut Vec<String>, out: &mut Vec<Block>) {
    if !items.is_empty() {
        out.push(Block::Bullets { items: std::mem::take(items) });
    }
}

#[cfg(test)]
#[path = "render_test.rs"]
mod tests;
