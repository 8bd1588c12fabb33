use crate::{
    error::{AppError, Result},
    models::blog::*,
    state::AppState,
    utils::middleware::OptionalAuth,
};
use axum::{
    extract::{Path, Query, State},
    response::Json,
    routing::{delete, get, post},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_blogs).post(create_blog))
        .route("/user", get(get_my_blogs))
        .route("/user/:id", get(get_blogs_by_user))
        .route("/:id", get(get_blog).put(update_blog).delete(delete_blog))
        .route("/:id/like", post(toggle_like))
        .route("/:id/like/check", get(check_like_status))
        .route("/:id/comments", post(add_comment))
        .route("/:id/comments/:comment_id", delete(delete_comment))
        .route("/:id/comments/:comment_id/replies", post(add_reply))
        .route(
            "/:id/comments/:comment_id/replies/:reply_id",
            delete(delete_reply),
        )
}

fn paginated_body(result: crate::services::database::PaginatedResult<BlogWithAuthor>) -> Value {
    let has_more = result.has_more();

    json!({
        "success": true,
        "data": {
            "blogs": result.data,
            "page": result.page,
            "total": result.total,
            "total_pages": result.total_pages,
            "has_more": has_more,
        }
    })
}

/// 博客列表
/// GET /api/blogs?page&limit
async fn list_blogs(
    State(state): State<Arc<AppState>>,
    Query(query): Query<BlogQuery>,
) -> Result<Json<Value>> {
    let result = state.blog_service.get_blogs(query).await?;
    Ok(Json(paginated_body(result)))
}

/// 发布博客
/// POST /api/blogs
async fn create_blog(
    State(state): State<Arc<AppState>>,
    OptionalAuth(user): OptionalAuth,
    Json(request): Json<CreateBlogRequest>,
) -> Result<Json<Value>> {
    let user = user.ok_or_else(|| AppError::unauthorized("Authentication required"))?;

    let blog = state.blog_service.create_blog(&user, request).await?;

    Ok(Json(json!({
        "success": true,
        "data": blog
    })))
}

/// 当前用户自己的博客
/// GET /api/blogs/user
async fn get_my_blogs(
    State(state): State<Arc<AppState>>,
    OptionalAuth(user): OptionalAuth,
    Query(query): Query<BlogQuery>,
) -> Result<Json<Value>> {
    let user = user.ok_or_else(|| AppError::unauthorized("Authentication required"))?;

    let result = state.blog_service.get_blogs_by_author(&user.id, query).await?;
    Ok(Json(paginated_body(result)))
}

/// 指定用户的博客（公开）
/// GET /api/blogs/user/:id
async fn get_blogs_by_user(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    Query(query): Query<BlogQuery>,
) -> Result<Json<Value>> {
    let result = state.blog_service.get_blogs_by_author(&user_id, query).await?;
    Ok(Json(paginated_body(result)))
}

/// 博客详情，读取同时累加浏览数
/// GET /api/blogs/:id
async fn get_blog(
    State(state): State<Arc<AppState>>,
    Path(blog_id): Path<String>,
) -> Result<Json<Value>> {
    let blog = state.blog_service.get_blog_by_id(&blog_id).await?;

    Ok(Json(json!({
        "success": true,
        "data": blog
    })))
}

/// 更新博客（仅作者）
/// PUT /api/blogs/:id
async fn update_blog(
    State(state): State<Arc<AppState>>,
    OptionalAuth(user): OptionalAuth,
    Path(blog_id): Path<String>,
    Json(request): Json<UpdateBlogRequest>,
) -> Result<Json<Value>> {
    let user = user.ok_or_else(|| AppError::unauthorized("Authentication required"))?;

    let blog = state
        .blog_service
        .update_blog(&blog_id, &user.id, request)
        .await?;

    Ok(Json(json!({
        "success": true,
        "data": blog
    })))
}

/// 删除博客（仅作者）
/// DELETE /api/blogs/:id
async fn delete_blog(
    State(state): State<Arc<AppState>>,
    OptionalAuth(user): OptionalAuth,
    Path(blog_id): Path<String>,
) -> Result<Json<Value>> {
    let user = user.ok_or_else(|| AppError::unauthorized("Authentication required"))?;

    state.blog_service.delete_blog(&blog_id, &user.id).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Blog removed"
    })))
}

/// 切换点赞状态
/// POST /api/blogs/:id/like
async fn toggle_like(
    State(state): State<Arc<AppState>>,
    OptionalAuth(user): OptionalAuth,
    Path(blog_id): Path<String>,
) -> Result<Json<Value>> {
    let user = user.ok_or_else(|| AppError::unauthorized("Authentication required"))?;

    let status = state.blog_service.toggle_like(&blog_id, &user).await?;

    Ok(Json(json!({
        "success": true,
        "data": status
    })))
}

/// 查询当前用户是否已点赞
/// GET /api/blogs/:id/like/check
async fn check_like_status(
    State(state): State<Arc<AppState>>,
    OptionalAuth(user): OptionalAuth,
    Path(blog_id): Path<String>,
) -> Result<Json<Value>> {
    let user = user.ok_or_else(|| AppError::unauthorized("Authentication required"))?;

    let status = state.blog_service.check_like_status(&blog_id, &user.id).await?;

    Ok(Json(json!({
        "success": true,
        "data": status
    })))
}

/// 发表评论
/// POST /api/blogs/:id/comments
async fn add_comment(
    State(state): State<Arc<AppState>>,
    OptionalAuth(user): OptionalAuth,
    Path(blog_id): Path<String>,
    Json(request): Json<CommentRequest>,
) -> Result<Json<Value>> {
    let user = user.ok_or_else(|| AppError::unauthorized("Authentication required"))?;

    let comments = state.blog_service.add_comment(&blog_id, &user, request).await?;

    Ok(Json(json!({
        "success": true,
        "data": comments
    })))
}

/// 删除评论（评论作者或博客作者）
/// DELETE /api/blogs/:id/comments/:comment_id
async fn delete_comment(
    State(state): State<Arc<AppState>>,
    OptionalAuth(user): OptionalAuth,
    Path((blog_id, comment_id)): Path<(String, String)>,
) -> Result<Json<Value>> {
    let user = user.ok_or_else(|| AppError::unauthorized("Authentication required"))?;

    let comments = state
        .blog_service
        .delete_comment(&blog_id, &user.id, &comment_id)
        .await?;

    Ok(Json(json!({
        "success": true,
        "data": comments
    })))
}

/// 回复评论
/// POST /api/blogs/:id/comments/:comment_id/replies
async fn add_reply(
    State(state): State<Arc<AppState>>,
    OptionalAuth(user): OptionalAuth,
    Path((blog_id, comment_id)): Path<(String, String)>,
    Json(request): Json<ReplyRequest>,
) -> Result<Json<Value>> {
    let user = user.ok_or_else(|| AppError::unauthorized("Authentication required"))?;

    let comment = state
        .blog_service
        .add_reply(&blog_id, &user, &comment_id, request)
        .await?;

    Ok(Json(json!({
        "success": true,
        "data": comment
    })))
}

/// 删除回复（回复作者、评论作者或博客作者）
/// DELETE /api/blogs/:id/comments/:comment_id/replies/:reply_id
async fn delete_reply(
    State(state): State<Arc<AppState>>,
    OptionalAuth(user): OptionalAuth,
    Path((blog_id, comment_id, reply_id)): Path<(String, String, String)>,
) -> Result<Json<Value>> {
    let user = user.ok_or_else(|| AppError::unauthorized("Authentication required"))?;

    let comment = state
        .blog_service
        .delete_reply(&blog_id, &user.id, &comment_id, &reply_id)
        .await?;

    Ok(Json(json!({
        "success": true,
        "data": comment
    })))
}
