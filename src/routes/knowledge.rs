//! Knowledge admin routes.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::routes::{ApiError, api_error};
use crate::services::knowledge::{KnowledgeError, KnowledgeSnippet, SnippetPatch};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateSnippetBody {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
}

/// `GET /api/admin/knowledge` — snippets in insertion order.
pub async fn list_snippets(State(state): State<AppState>) -> Json<Vec<KnowledgeSnippet>> {
    Json(state.knowledge.list().await)
}

/// `POST /api/admin/knowledge` — add a snippet.
pub async fn create_snippet(
    State(state): State<AppState>,
    Json(body): Json<CreateSnippetBody>,
) -> Result<(StatusCode, Json<KnowledgeSnippet>), ApiError> {
    let snippet = state
        .knowledge
        .add(&body.title, &body.content)
        .await
        .map_err(knowledge_api_error)?;
    Ok((StatusCode::CREATED, Json(snippet)))
}

/// `PATCH /api/admin/knowledge/:id` — edit title and/or content.
pub async fn update_snippet(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(patch): Json<SnippetPatch>,
) -> Result<Json<KnowledgeSnippet>, ApiError> {
    state
        .knowledge
        .update(id, patch)
        .await
        .map(Json)
        .map_err(knowledge_api_error)
}

/// `DELETE /api/admin/knowledge/:id`
pub async fn delete_snippet(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<StatusCode, ApiError> {
    state.knowledge.remove(id).await.map_err(knowledge_api_error)?;
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) fn knowledge_error_to_status(err: &KnowledgeError) -> StatusCode {
    match err {
        KnowledgeError::EmptyTitle | KnowledgeError::EmptyContent => StatusCode::UNPROCESSABLE_ENTITY,
        KnowledgeError::NotFound(_) => StatusCode::NOT_FOUND,
        KnowledgeError::Database(_) | KnowledgeError::Malformed(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn knowledge_api_error(err: KnowledgeError) -> ApiError {
    api_error(knowledge_error_to_status(&err), &err)
}
