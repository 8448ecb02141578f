//! Server-sent events framing for streamed provider replies.
//!
//! TCP chunks do not line up with SSE event boundaries: one chunk may carry
//! several `data:` lines, or half of one. [`SseLineBuffer`] holds the partial
//! tail between chunks so each provider only has to parse complete JSON
//! payloads.

use std::collections::VecDeque;
use std::mem;

use bytes::Bytes;
use futures::stream::{self, Stream, StreamExt};

use super::types::{ChatStream, LlmError};

/// A parsed SSE event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseEvent {
    /// A `data:` payload with the prefix stripped.
    Data(String),
    /// The `[DONE]` terminator used by `OpenAI`-compatible APIs.
    Done,
}

/// Bytes are buffered undecoded: a chunk may end inside a multi-byte
/// character, but never inside a `\n`.
#[derive(Debug, Default)]
pub struct SseLineBuffer {
    buffer: Vec<u8>,
}

impl SseLineBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk and return every event completed by it.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<SseEvent> {
        self.buffer.extend_from_slice(bytes);

        let mut events = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            if let Some(event) = parse_line(&String::from_utf8_lossy(&line)) {
                events.push(event);
            }
        }
        events
    }

    /// Parse whatever is left once the byte stream ends.
    pub fn flush(&mut self) -> Vec<SseEvent> {
        let rest = mem::take(&mut self.buffer);
        parse_line(&String::from_utf8_lossy(&rest)).into_iter().collect()
    }
}

fn parse_line(line: &str) -> Option<SseEvent> {
    let trimmed = line.trim();
    // Blank lines separate events; `event:`, `id:` and `:` comments are ignored.
    let data = trimmed.strip_prefix("data:")?.trim();
    if data.is_empty() {
        return None;
    }
    if data == "[DONE]" {
        return Some(SseEvent::Done);
    }
    Some(SseEvent::Data(data.to_owned()))
}

struct SseState<S, F> {
    bytes: S,
    parser: SseLineBuffer,
    pending: VecDeque<Result<String, LlmError>>,
    parse_data: F,
    ended: bool,
}

/// Turn a raw provider byte stream into a stream of text fragments.
///
/// `parse_data` maps one JSON payload to a fragment; `None` skips payloads
/// that carry no text (role-only deltas, usage metadata). Fragments are
/// yielded strictly in arrival order.
pub fn text_stream<S, F>(bytes: S, parse_data: F) -> ChatStream
where
    S: Stream<Item = Result<Bytes, reqwest::Error>> + Send + Unpin + 'static,
    F: Fn(&str) -> Option<Result<String, LlmError>> + Send + 'static,
{
    let state = SseState { bytes, parser: SseLineBuffer::new(), pending: VecDeque::new(), parse_data, ended: false };

    let stream = stream::unfold(state, |mut state| async move {
        loop {
            if let Some(item) = state.pending.pop_front() {
                return Some((item, state));
            }
            if state.ended {
                return None;
            }
            let events = match state.bytes.next().await {
                Some(Ok(chunk)) => state.parser.feed(&chunk),
                Some(Err(e)) => {
                    state.ended = true;
                    return Some((Err(LlmError::ApiRequest(e.to_string())), state));
                }
                None => {
                    state.ended = true;
                    state.parser.flush()
                }
            };
            for event in events {
                match event {
                    SseEvent::Data(json) => {
                        if let Some(item) = (state.parse_data)(&json) {
                            state.pending.push_back(item);
                        }
                    }
                    SseEvent::Done => {
                        state.ended = true;
                        break;
                    }
                }
            }
        }
    });

    Box::pin(stream)
}

#[cfg(test)]
#[path = "sse_test.rs"]
mod tests;
