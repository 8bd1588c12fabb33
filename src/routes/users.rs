use crate::{
    error::{AppError, Result},
    models::user::*,
    state::AppState,
    utils::middleware::OptionalAuth,
};
use axum::{
    extract::{Path, State},
    response::Json,
    routing::{delete, get, post, put},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", post(register))
        .route("/login", post(login))
        .route("/profile", get(get_profile))
        .route("/profile", put(update_profile))
        .route("/profile", delete(delete_profile))
        .route("/:id", get(get_user_by_id))
}

/// 注册新用户
/// POST /api/users
async fn register(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RegisterRequest>,
) -> Result<Json<Value>> {
    let (user, token) = state.user_service.register(request).await?;

    Ok(Json(json!({
        "success": true,
        "data": AuthResponse::from_user(&user, token)
    })))
}

/// 登录
/// POST /api/users/login
async fn login(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<Value>> {
    let (user, token) = state.user_service.login(request).await?;

    Ok(Json(json!({
        "success": true,
        "data": AuthResponse::from_user(&user, token)
    })))
}

/// 当前用户资料
/// GET /api/users/profile
async fn get_profile(OptionalAuth(user): OptionalAuth) -> Result<Json<Value>> {
    let user = user.ok_or_else(|| AppError::unauthorized("Authentication required"))?;

    Ok(Json(json!({
        "success": true,
        "data": ProfileResponse::from(&user)
    })))
}

/// 更新当前用户资料
/// PUT /api/users/profile
async fn update_profile(
    State(state): State<Arc<AppState>>,
    OptionalAuth(user): OptionalAuth,
    Json(request): Json<UpdateProfileRequest>,
) -> Result<Json<Value>> {
    let user = user.ok_or_else(|| AppError::unauthorized("Authentication required"))?;

    let (updated, token) = state.user_service.update_profile(&user.id, request).await?;

    Ok(Json(json!({
        "success": true,
        "data": AuthResponse::from_user(&updated, token)
    })))
}

/// 删除账户及其全部关联数据
/// DELETE /api/users/profile
async fn delete_profile(
    State(state): State<Arc<AppState>>,
    OptionalAuth(user): OptionalAuth,
) -> Result<Json<Value>> {
    let user = user.ok_or_else(|| AppError::unauthorized("Authentication required"))?;

    state.user_service.delete_account(&user.id).await?;

    Ok(Json(json!({
        "success": true,
        "message": "User account and all associated data deleted successfully"
    })))
}

/// 公开的用户资料子集
/// GET /api/users/:id
async fn get_user_by_id(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<Value>> {
    let user = state
        .user_service
        .get_user(&user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;

    Ok(Json(json!({
        "success": true,
        "data": PublicProfileResponse::from(&user)
    })))
}
