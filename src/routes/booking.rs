//! Booking placeholder route.

use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::Json;

use crate::routes::{LangQuery, request_locale};
use crate::services::booking::{self, BookingPlaceholder};
use crate::state::AppState;

/// `GET /api/booking` — localized placeholder with the external booking link.
pub async fn booking_info(
    State(state): State<AppState>,
    Query(query): Query<LangQuery>,
    headers: HeaderMap,
) -> Json<BookingPlaceholder> {
    let locale = request_locale(query.lang.as_deref(), &headers);
    Json(booking::placeholder(&state.catalog, locale, &state.config.booking_url))
}
