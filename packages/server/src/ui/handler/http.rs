//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;

use crate::{
    domain::RoomId,
    infrastructure::dto::http::{HealthDto, HealthState, MessageDto},
    usecase::ListHistoryError,
};

use super::super::state::AppState;

/// Query parameters for the history endpoint
#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    /// Return messages with sequence greater than this (default 0)
    pub after: Option<i64>,
    /// Maximum number of messages to return
    pub limit: Option<i64>,
}

/// Health check endpoint
///
/// Never fails: database unreachability is reported as `degraded`, not
/// as an HTTP error, so the orchestration healthcheck can distinguish
/// "service down" from "service up, database down".
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthDto> {
    let status = state.check_health_usecase.execute().await;

    Json(HealthDto {
        status: if status.is_ok() {
            HealthState::Ok
        } else {
            HealthState::Degraded
        },
        service: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database_reachable: status.database_reachable,
    })
}

/// Get message history for a room, ascending by sequence number
pub async fn list_messages(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<MessageDto>>, StatusCode> {
    let room_id = match RoomId::try_from(room_id) {
        Ok(id) => id,
        Err(e) => {
            tracing::warn!("Invalid room_id in history request: {}", e);
            return Err(StatusCode::BAD_REQUEST);
        }
    };

    match state
        .list_history_usecase
        .execute(&room_id, query.after.unwrap_or(0), query.limit)
        .await
    {
        Ok(messages) => Ok(Json(messages.into_iter().map(Into::into).collect())),
        Err(ListHistoryError::Storage(e)) => {
            tracing::error!(
                "Failed to query history for room '{}': {}",
                room_id.as_str(),
                e
            );
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}
