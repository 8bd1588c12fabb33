use crate::{
    error::{AppError, Result},
    state::AppState,
    utils::middleware::OptionalAuth,
};
use axum::{
    extract::{Path, State},
    response::Json,
    routing::{get, put},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(get_notifications).put(mark_all_as_read))
        .route("/unread", get(unread_count))
        .route("/:id", put(mark_as_read).delete(delete_notification))
}

/// 当前用户的通知，最新优先
/// GET /api/notifications
async fn get_notifications(
    State(state): State<Arc<AppState>>,
    OptionalAuth(user): OptionalAuth,
) -> Result<Json<Value>> {
    let user = user.ok_or_else(|| AppError::unauthorized("Authentication required"))?;

    let notifications = state
        .notification_service
        .get_user_notifications(&user.id)
        .await?;

    Ok(Json(json!({
        "success": true,
        "data": notifications
    })))
}

/// 全部标记为已读
/// PUT /api/notifications
async fn mark_all_as_read(
    State(state): State<Arc<AppState>>,
    OptionalAuth(user): OptionalAuth,
) -> Result<Json<Value>> {
    let user = user.ok_or_else(|| AppError::unauthorized("Authentication required"))?;

    state.notification_service.mark_all_as_read(&user.id).await?;

    Ok(Json(json!({
        "success": true,
        "message": "All notifications marked as read"
    })))
}

/// 未读数量
/// GET /api/notifications/unread
async fn unread_count(
    State(state): State<Arc<AppState>>,
    OptionalAuth(user): OptionalAuth,
) -> Result<Json<Value>> {
    let user = user.ok_or_else(|| AppError::unauthorized("Authentication required"))?;

    let count = state.notification_service.unread_count(&user.id).await?;

    Ok(Json(json!({
        "success": true,
        "data": { "count": count }
    })))
}

/// 标记单条为已读（仅接收者）
/// PUT /api/notifications/:id
async fn mark_as_read(
    State(state): State<Arc<AppState>>,
    OptionalAuth(user): OptionalAuth,
    Path(notification_id): Path<String>,
) -> Result<Json<Value>> {
    let user = user.ok_or_else(|| AppError::unauthorized("Authentication required"))?;

    let notification = state
        .notification_service
        .mark_as_read(&notification_id, &user.id)
        .await?;

    Ok(Json(json!({
        "success": true,
        "data": notification
    })))
}

/// 删除单条通知（仅接收者）
/// DELETE /api/notifications/:id
async fn delete_notification(
    State(state): State<Arc<AppState>>,
    OptionalAuth(user): OptionalAuth,
    Path(notification_id): Path<String>,
) -> Result<Json<Value>> {
    let user = user.ok_or_else(|| AppError::unauthorized("Authentication required"))?;

    state
        .notification_service
        .delete_notification(&notification_id, &user.id)
        .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Notification removed"
    })))
}
