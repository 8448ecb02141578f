//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! This module binds the chat widget, knowledge admin, contact and booking
//! endpoints under a single Axum router. CORS is open because the widget is
//! embedded cross-origin.

pub mod booking;
pub mod chat;
pub mod contact;
pub mod knowledge;

use axum::Router;
use axum::http::header::{ACCEPT_LANGUAGE, REFERER};
use axum::http::{HeaderMap, HeaderName, StatusCode};
use axum::response::Json;
use axum::routing::{get, patch, post, put};
use serde::Deserialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::error::{ErrorCode, error_body};
use crate::i18n::{Locale, resolve_locale};
use crate::state::AppState;

/// Error response: status plus `{ code, message, retryable }`.
pub type ApiError = (StatusCode, Json<serde_json::Value>);

pub(crate) fn api_error(status: StatusCode, err: &impl ErrorCode) -> ApiError {
    (status, Json(error_body(err)))
}

/// `?lang=` query parameter accepted by localized endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct LangQuery {
    pub lang: Option<String>,
}

/// Resolve the request locale from `?lang=`, `Referer` and `Accept-Language`.
pub(crate) fn request_locale(lang: Option<&str>, headers: &HeaderMap) -> Locale {
    resolve_locale(lang, header_str(headers, &REFERER), header_str(headers, &ACCEPT_LANGUAGE))
}

fn header_str<'a>(headers: &'a HeaderMap, name: &HeaderName) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/chat/sessions", post(chat::create_session))
        .route("/api/chat/sessions/{id}", get(chat::get_session))
        .route("/api/chat/sessions/{id}/messages", post(chat::send_message))
        .route("/api/chat/sessions/{id}/messages/stream", post(chat::stream_message))
        .route("/api/chat/sessions/{id}/retry", post(chat::retry_message))
        .route("/api/chat/sessions/{id}/open", put(chat::set_open))
        .route("/api/chat/sessions/{id}/locale", post(chat::change_locale))
        .route(
            "/api/admin/knowledge",
            get(knowledge::list_snippets).post(knowledge::create_snippet),
        )
        .route(
            "/api/admin/knowledge/{id}",
            patch(knowledge::update_snippet).delete(knowledge::delete_snippet),
        )
        .route("/api/contact", post(contact::submit_contact))
        .route("/api/booking", get(booking::booking_info))
        .route("/healthz", get(healthz))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
