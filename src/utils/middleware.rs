use crate::{error::AppError, models::user::User, state::AppState};
use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::{debug, warn};

/// 认证中间件。令牌有效时把用户写入请求扩展，
/// 无效或缺失时请求继续以未认证身份处理
pub async fn auth_middleware(
    State(app_state): State<Arc<AppState>>,
    headers: HeaderMap,
    mut request: Request<Body>,
    next: Next<Body>,
) -> Result<Response, AppError> {
    if let Some(auth_header) = headers.get("authorization") {
        if let Ok(auth_str) = auth_header.to_str() {
            if let Some(token) = auth_str.strip_prefix("Bearer ") {
                match app_state.auth_service.verify_token(token) {
                    Ok(claims) => match app_state.user_service.get_user(&claims.sub).await {
                        Ok(Some(user)) => {
                            debug!("Authenticated user: {}", user.id);
                            request.extensions_mut().insert(user);
                        }
                        Ok(None) => {
                            warn!("Token subject no longer exists: {}", claims.sub);
                        }
                        Err(e) => {
                            warn!("Failed to load user for token subject {}: {}", claims.sub, e);
                        }
                    },
                    Err(e) => {
                        debug!("Token verification failed: {}", e);
                    }
                }
            }
        }
    }

    Ok(next.run(request).await)
}

/// 可选认证提取器
pub struct OptionalAuth(pub Option<User>);

#[async_trait::async_trait]
impl<S> axum::extract::FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        let user = parts.extensions.get::<User>().cloned();
        Ok(OptionalAuth(user))
    }
}
