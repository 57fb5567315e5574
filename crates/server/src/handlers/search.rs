//! # Prescription Search Handler
//!
//! Queries the in-memory vector index built from a user's latest upload.

use super::{AppError, AppState};
use crate::types::{SearchRequest, SearchResponse};
use axum::{extract::State, Json};
use medibot::ingest::IndexError;
use tracing::info;

pub async fn search_handler(
    State(app_state): State<AppState>,
    Json(payload): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, AppError> {
    let embedder = app_state
        .embedder
        .as_deref()
        .ok_or_else(|| AppError::Unavailable("Prescription indexing is disabled".to_string()))?;

    if payload.query.trim().is_empty() {
        return Err(AppError::BadRequest("Query must not be empty".to_string()));
    }
    info!(user = %payload.user_email, limit = payload.limit, "Received prescription search request.");

    let results = app_state
        .indexes
        .search(embedder, &payload.user_email, &payload.query, payload.limit)
        .await
        .map_err(|e| match e {
            IndexError::NotFound(_) => AppError::NotFound(e.to_string()),
            other => AppError::Internal(other.into()),
        })?;

    Ok(Json(SearchResponse { results }))
}
