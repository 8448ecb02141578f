//! Contact form route.

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::Json;

use crate::routes::{LangQuery, request_locale};
use crate::services::contact::{self, ContactForm, ContactOutcome, ContactStatus};
use crate::state::AppState;

/// `POST /api/contact` — validate and relay a contact submission.
///
/// The body is always a [`ContactOutcome`]; the status tells success (200),
/// invalid fields (422) and relay failure (502) apart.
pub async fn submit_contact(
    State(state): State<AppState>,
    Query(query): Query<LangQuery>,
    headers: HeaderMap,
    Json(form): Json<ContactForm>,
) -> (StatusCode, Json<ContactOutcome>) {
    let locale = request_locale(query.lang.as_deref(), &headers);
    let outcome = contact::submit(&state.contact, &state.catalog, locale, form).await;
    (outcome_status(&outcome), Json(outcome))
}

pub(crate) fn outcome_status(outcome: &ContactOutcome) -> StatusCode {
    match outcome.status {
        ContactStatus::Success => StatusCode::OK,
        ContactStatus::Error if !outcome.field_errors.is_empty() => StatusCode::UNPROCESSABLE_ENTITY,
        ContactStatus::Error => StatusCode::BAD_GATEWAY,
    }
}
