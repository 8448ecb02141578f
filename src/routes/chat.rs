//! Chat widget routes.

use std::convert::Infallible;
use std::net::SocketAddr;

use axum::extract::{ConnectInfo, Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::Json;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::{Stream, StreamExt};
use serde::Deserialize;
use uuid::Uuid;

use crate::i18n::Locale;
use crate::render::{ChatView, EmbedNotice};
use crate::routes::{ApiError, LangQuery, api_error, request_locale};
use crate::services::chat::{self, ChatError, ChatEvent};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SendMessageBody {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct SetOpenBody {
    pub open: bool,
}

#[derive(Debug, Deserialize)]
pub struct ChangeLocaleBody {
    pub lang: String,
}

/// `POST /api/chat/sessions` — open a conversation in the request's locale.
pub async fn create_session(
    State(state): State<AppState>,
    Query(query): Query<LangQuery>,
    headers: HeaderMap,
) -> (StatusCode, Json<ChatView>) {
    let locale = request_locale(query.lang.as_deref(), &headers);
    (StatusCode::CREATED, Json(chat::open_session(&state, locale).await))
}

/// `GET /api/chat/sessions/:id` — current view.
pub async fn get_session(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<ChatView>, ApiError> {
    chat::view(&state, id).await.map(Json).map_err(chat_api_error)
}

/// `POST /api/chat/sessions/:id/messages` — send and wait for the reply.
pub async fn send_message(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    Path(id): Path<Uuid>,
    Json(body): Json<SendMessageBody>,
) -> Result<Json<ChatView>, ApiError> {
    chat::send(&state, peer.ip(), id, &body.message)
        .await
        .map(Json)
        .map_err(chat_api_error)
}

/// `POST /api/chat/sessions/:id/messages/stream` — send and stream the reply
/// as `partial` events followed by one `done` or `error` event.
pub async fn stream_message(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    Path(id): Path<Uuid>,
    Json(body): Json<SendMessageBody>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let events = chat::send_stream(&state, peer.ip(), id, &body.message)
        .await
        .map_err(chat_api_error)?;
    let stream = events.map(|event| Ok(sse_event(&event)));
    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

pub(crate) fn sse_event(event: &ChatEvent) -> Event {
    let data = serde_json::to_string(event)
        .unwrap_or_else(|e| serde_json::json!({ "event": "error", "message": e.to_string() }).to_string());
    Event::default().event(event.name()).data(data)
}

/// `POST /api/chat/sessions/:id/retry` — re-send the last message after an error.
pub async fn retry_message(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    Path(id): Path<Uuid>,
) -> Result<Json<ChatView>, ApiError> {
    chat::retry(&state, peer.ip(), id).await.map(Json).map_err(chat_api_error)
}

/// `PUT /api/chat/sessions/:id/open` — record widget open/closed.
pub async fn set_open(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<SetOpenBody>,
) -> Result<Json<EmbedNotice>, ApiError> {
    chat::set_open(&state, id, body.open)
        .await
        .map(Json)
        .map_err(chat_api_error)
}

/// `POST /api/chat/sessions/:id/locale` — restart in another language.
pub async fn change_locale(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<ChangeLocaleBody>,
) -> Result<Json<ChatView>, ApiError> {
    let Some(locale) = Locale::parse(&body.lang) else {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({
                "code": "E_UNSUPPORTED_LOCALE",
                "message": format!("unsupported locale: {}", body.lang),
                "retryable": false,
            })),
        ));
    };
    chat::reset(&state, id, locale)
        .await
        .map(Json)
        .map_err(chat_api_error)
}

pub(crate) fn chat_error_to_status(err: &ChatError) -> StatusCode {
    match err {
        ChatError::SessionNotFound(_) => StatusCode::NOT_FOUND,
        ChatError::EmptyInput => StatusCode::UNPROCESSABLE_ENTITY,
        ChatError::Busy | ChatError::NothingToRetry => StatusCode::CONFLICT,
        ChatError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
        ChatError::Task(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn chat_api_error(err: ChatError) -> ApiError {
    api_error(chat_error_to_status(&err), &err)
}

#[cfg(test)]
#[path = "chat_test.rs"]
mod tests;
