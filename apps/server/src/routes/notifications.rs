//! Notification (audit log) handlers behind the bell icon.

use axum::extract::{Path, State};
use axum::Json;
use serde_json::{json, Value};

use apotek_core::types::Notification;

use crate::error::ApiError;
use crate::state::AppState;

/// `GET /api/notifications`
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Notification>>, ApiError> {
    Ok(Json(
        state
            .db
            .notifications()
            .list_recent(state.config.list_limit)
            .await?,
    ))
}

/// `GET /api/notifications/unread-count`
pub async fn unread_count(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let count = state.db.notifications().unread_count().await?;
    Ok(Json(json!({ "unread": count })))
}

/// `POST /api/notifications/:id/read`
pub async fn mark_read(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    state.db.notifications().mark_read(id).await?;
    Ok(Json(json!({ "success": true })))
}

/// `POST /api/notifications/read-all`
pub async fn mark_all_read(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let marked = state.db.notifications().mark_all_read().await?;
    Ok(Json(json!({ "success": true, "marked": marked })))
}
