//! Chat service — session lifecycle and the send → reply pipeline.
//!
//! DESIGN
//! ======
//! A send is accepted under the sessions write lock (`begin_send`), the
//! request is built from a knowledge snapshot, and the provider call runs
//! in a spawned task that always settles the conversation back to `Idle`.
//! Dropping the HTTP request (client gone) therefore never leaves a
//! session stuck in `AwaitingReply`.
//!
//! ERROR HANDLING
//! ==============
//! Provider failures never escape as errors: they become an error turn
//! carrying the localized message for their `FailureKind`. `ChatError` is
//! reserved for requests that were refused before reaching the provider.

use std::net::IpAddr;
use std::time::{Duration, Instant};

use futures::{Stream, StreamExt};
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::conversation::{Conversation, Phase, SendRejected};
use crate::error::ErrorCode;
use crate::i18n::{Locale, TextKey};
use crate::llm::types::{ChatRequest, FailureKind, LlmError};
use crate::render::{ChatView, EmbedNotice, chat_view};
use crate::services::assistant::clean_reply;
use crate::services::prompt::build_request;
use crate::state::AppState;

const STREAM_EVENT_BUFFER: usize = 64;

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("session not found: {0}")]
    SessionNotFound(Uuid),
    #[error("message is empty")]
    EmptyInput,
    #[error("a reply is already pending")]
    Busy,
    #[error("nothing to retry")]
    NothingToRetry,
    #[error("rate limited: {0}")]
    RateLimited(#[from] crate::rate_limit::RateLimitError),
    #[error("reply task failed: {0}")]
    Task(String),
}

impl ErrorCode for ChatError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::SessionNotFound(_) => "E_SESSION_NOT_FOUND",
            Self::EmptyInput => "E_EMPTY_INPUT",
            Self::Busy => "E_BUSY",
            Self::NothingToRetry => "E_NOTHING_TO_RETRY",
            Self::RateLimited(_) => "E_RATE_LIMITED",
            Self::Task(_) => "E_TASK",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Busy | Self::RateLimited(_))
    }
}

impl From<SendRejected> for ChatError {
    fn from(e: SendRejected) -> Self {
        match e {
            SendRejected::EmptyInput => Self::EmptyInput,
            SendRejected::Busy => Self::Busy,
        }
    }
}

/// Progress of a streamed reply.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ChatEvent {
    /// Cumulative reply text so far.
    Partial { text: String },
    /// Reply finished; final view of the conversation.
    Done { view: ChatView },
    /// Reply failed; the view ends in the error turn.
    Error { kind: FailureKind, view: ChatView },
}

impl ChatEvent {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Partial { .. } => "partial",
            Self::Done { .. } => "done",
            Self::Error { .. } => "error",
        }
    }
}

// =============================================================================
// SESSIONS
// =============================================================================

/// Create a conversation greeted in `locale`.
pub async fn open_session(state: &AppState, locale: Locale) -> ChatView {
    let session_id = Uuid::new_v4();
    let conversation = Conversation::new(locale, state.catalog.text(locale, TextKey::Greeting));
    let view = chat_view(session_id, &conversation, &state.catalog);
    state.sessions.write().await.insert(session_id, conversation);
    info!(%session_id, %locale, "chat: session opened");
    view
}

/// # Errors
///
/// [`ChatError::SessionNotFound`] for unknown or expired sessions.
pub async fn view(state: &AppState, session_id: Uuid) -> Result<ChatView, ChatError> {
    let sessions = state.sessions.read().await;
    let conversation = sessions.get(&session_id).ok_or(ChatError::SessionNotFound(session_id))?;
    Ok(chat_view(session_id, conversation, &state.catalog))
}

/// Record the widget's open/closed state and return the notice the
/// embedding page relays.
///
/// # Errors
///
/// [`ChatError::SessionNotFound`] for unknown or expired sessions.
pub async fn set_open(state: &AppState, session_id: Uuid, open: bool) -> Result<EmbedNotice, ChatError> {
    let mut sessions = state.sessions.write().await;
    let conversation = sessions.get_mut(&session_id).ok_or(ChatError::SessionNotFound(session_id))?;
    conversation.set_open(open);
    debug!(%session_id, open, "chat: widget state changed");
    Ok(EmbedNotice::new(open))
}

/// Restart the conversation in `locale`.
///
/// # Errors
///
/// [`ChatError::SessionNotFound`], or [`ChatError::Busy`] while a reply is
/// pending.
pub async fn reset(state: &AppState, session_id: Uuid, locale: Locale) -> Result<ChatView, ChatError> {
    let mut sessions = state.sessions.write().await;
    let conversation = sessions.get_mut(&session_id).ok_or(ChatError::SessionNotFound(session_id))?;
    if !conversation.reset(locale, state.catalog.text(locale, TextKey::Greeting)) {
        return Err(ChatError::Busy);
    }
    info!(%session_id, %locale, "chat: session reset");
    Ok(chat_view(session_id, conversation, &state.catalog))
}

// =============================================================================
// SEND
// =============================================================================

/// Send a user message from `client` and wait for the reply.
///
/// Provider failures are returned as a view ending in an error turn. The
/// per-client rate limit is charged to `client`, not to the session, so
/// opening new sessions does not reset it.
///
/// # Errors
///
/// Requests refused before reaching the provider: unknown session, empty
/// input, a reply already pending, or the local rate limit.
pub async fn send(state: &AppState, client: IpAddr, session_id: Uuid, input: &str) -> Result<ChatView, ChatError> {
    let request = accept(state, client, session_id, input).await?;
    let task = tokio::spawn(settle_reply(state.clone(), session_id, request));
    task.await.map_err(|e| ChatError::Task(e.to_string()))
}

/// Send a user message and receive the reply as a stream of events ending
/// in exactly one `Done` or `Error`.
///
/// # Errors
///
/// Same refusals as [`send`].
pub async fn send_stream(
    state: &AppState,
    client: IpAddr,
    session_id: Uuid,
    input: &str,
) -> Result<impl Stream<Item = ChatEvent> + Send + 'static + use<>, ChatError> {
    let request = accept(state, client, session_id, input).await?;
    let (tx, mut rx) = mpsc::channel(STREAM_EVENT_BUFFER);
    tokio::spawn(settle_stream(state.clone(), session_id, request, tx));
    Ok(async_stream::stream! {
        while let Some(event) = rx.recv().await {
            yield event;
        }
    })
}

/// Re-send the last user message after an error turn.
///
/// # Errors
///
/// [`ChatError::NothingToRetry`] unless the conversation ends in an error
/// turn, plus the refusals of [`send`].
pub async fn retry(state: &AppState, client: IpAddr, session_id: Uuid) -> Result<ChatView, ChatError> {
    let input = {
        let sessions = state.sessions.read().await;
        let conversation = sessions.get(&session_id).ok_or(ChatError::SessionNotFound(session_id))?;
        conversation
            .retry_candidate()
            .map(str::to_owned)
            .ok_or(ChatError::NothingToRetry)?
    };
    info!(%session_id, "chat: retrying last message");
    send(state, client, session_id, &input).await
}

/// Admit a send: validate, rate limit, build the request, append the user turn.
async fn accept(state: &AppState, client: IpAddr, session_id: Uuid, input: &str) -> Result<ChatRequest, ChatError> {
    if input.trim().is_empty() {
        return Err(ChatError::EmptyInput);
    }
    let knowledge = state.knowledge.list().await;

    let mut sessions = state.sessions.write().await;
    let conversation = sessions.get_mut(&session_id).ok_or(ChatError::SessionNotFound(session_id))?;
    if conversation.phase() == Phase::AwaitingReply {
        return Err(ChatError::Busy);
    }
    let request = build_request(conversation.turns(), &knowledge, conversation.locale(), input, state.sampling)
        .map_err(|_| ChatError::EmptyInput)?;
    state.rate_limiter.check_and_record(client)?;
    let pending = conversation.begin_send(input)?;
    info!(
        %session_id,
        %client,
        locale = %pending.locale,
        input_len = pending.input.len(),
        knowledge = knowledge.len(),
        "chat: message accepted"
    );
    Ok(request)
}

async fn settle_reply(state: AppState, session_id: Uuid, request: ChatRequest) -> ChatView {
    let outcome = state.assistant.reply(&request).await;
    settle(&state, session_id, outcome).await.1
}

async fn settle_stream(state: AppState, session_id: Uuid, request: ChatRequest, tx: mpsc::Sender<ChatEvent>) {
    let outcome = match state.assistant.reply_stream(&request).await {
        Ok(mut partials) => {
            with_conversation(&state, session_id, Conversation::begin_stream).await;
            let mut latest = String::new();
            let mut failure = None;
            while let Some(item) = partials.next().await {
                match item {
                    Ok(text) => {
                        with_conversation(&state, session_id, |c| c.apply_partial(&text)).await;
                        latest.clone_from(&text);
                        // A closed receiver only means the client left; keep
                        // draining so the conversation settles.
                        let _ = tx.send(ChatEvent::Partial { text }).await;
                    }
                    Err(e) => {
                        failure = Some(e);
                        break;
                    }
                }
            }
            match failure {
                Some(e) => Err(e),
                None => clean_reply(&latest),
            }
        }
        Err(e) => Err(e),
    };
    let (kind, view) = settle(&state, session_id, outcome).await;
    let event = match kind {
        None => ChatEvent::Done { view },
        Some(kind) => ChatEvent::Error { kind, view },
    };
    let _ = tx.send(event).await;
}

/// Apply the provider outcome to the conversation and return its view.
async fn settle(
    state: &AppState,
    session_id: Uuid,
    outcome: Result<String, LlmError>,
) -> (Option<FailureKind>, ChatView) {
    let mut sessions = state.sessions.write().await;
    let failure = outcome.as_ref().err().map(LlmError::kind);
    let Some(conversation) = sessions.get_mut(&session_id) else {
        // Swept while the call was in flight: answer with a detached view.
        warn!(%session_id, "chat: session vanished before reply settled");
        let conversation = Conversation::new(Locale::BASE, state.catalog.text(Locale::BASE, TextKey::Greeting));
        return (failure, chat_view(session_id, &conversation, &state.catalog));
    };
    match outcome {
        Ok(text) => {
            info!(%session_id, reply_len = text.len(), "chat: reply settled");
            conversation.complete(text);
        }
        Err(e) => {
            let kind = e.kind();
            warn!(%session_id, kind = kind.as_str(), code = e.error_code(), error = %e, "chat: reply failed");
            let message = state.catalog.text(conversation.locale(), failure_text(kind));
            conversation.fail(kind, message.to_owned());
        }
    }
    (failure, chat_view(session_id, conversation, &state.catalog))
}

async fn with_conversation<F>(state: &AppState, session_id: Uuid, f: F)
where
    F: FnOnce(&mut Conversation),
{
    if let Some(conversation) = state.sessions.write().await.get_mut(&session_id) {
        f(conversation);
    }
}

/// Catalog entry shown for a failure kind.
#[must_use]
pub fn failure_text(kind: FailureKind) -> TextKey {
    match kind {
        FailureKind::ConfigurationMissing => TextKey::ErrorConfiguration,
        FailureKind::RateLimited => TextKey::ErrorRateLimited,
        FailureKind::EmptyReply => TextKey::ErrorEmptyReply,
        FailureKind::Network => TextKey::ErrorConnection,
    }
}

// =============================================================================
// SWEEPER
// =============================================================================

/// Drop idle sessions every `session_sweep_interval`. Returns a handle for shutdown.
pub fn spawn_session_sweeper(state: AppState) -> JoinHandle<()> {
    let interval = state.config.session_sweep_interval;
    let ttl = state.config.session_ttl;
    info!(interval_secs = interval.as_secs(), ttl_secs = ttl.as_secs(), "chat: session sweeper configured");
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(interval).await;
            let removed = sweep_idle_sessions(&state, Instant::now(), ttl).await;
            let clients = state.rate_limiter.prune_idle();
            if removed > 0 || clients > 0 {
                info!(removed, clients, "chat: idle sessions swept");
            }
        }
    })
}

/// Remove sessions idle for longer than `ttl` as of `now`. Sessions with a
/// reply pending are kept.
pub async fn sweep_idle_sessions(state: &AppState, now: Instant, ttl: Duration) -> usize {
    let mut sessions = state.sessions.write().await;
    let expired: Vec<Uuid> = sessions
        .iter()
        .filter(|(_, c)| c.phase() != Phase::AwaitingReply && now.saturating_duration_since(c.last_active()) > ttl)
        .map(|(id, _)| *id)
        .collect();
    for id in &expired {
        sessions.remove(id);
    }
    expired.len()
}

#[cfg(test)]
#[path = "chat_test.rs"]
mod tests;
