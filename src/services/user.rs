use crate::{
    error::{AppError, Result},
    models::user::*,
    services::{AuthService, BlogService, Database, NotificationService},
};
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info};
use validator::Validate;

#[derive(Clone)]
pub struct UserService {
    db: Arc<Database>,
    auth_service: AuthService,
    blog_service: BlogService,
    notification_service: NotificationService,
}

impl UserService {
    pub async fn new(
        db: Arc<Database>,
        auth_service: AuthService,
        blog_service: BlogService,
        notification_service: NotificationService,
    ) -> Result<Self> {
        Ok(Self {
            db,
            auth_service,
            blog_service,
            notification_service,
        })
    }

    pub async fn register(&self, request: RegisterRequest) -> Result<(User, String)> {
        request.validate().map_err(AppError::ValidatorError)?;

        if self.find_by_email(&request.email).await?.is_some() {
            return Err(AppError::conflict("User already exists"));
        }

        let password_hash = self.auth_service.hash_password(&request.password)?;
        let user = User::new(request.name, request.email, password_hash);

        let created = self.db.create("user", user).await?;
        let token = self.auth_service.generate_token(&created.id)?;

        info!("Registered user: {}", created.id);
        Ok((created, token))
    }

    pub async fn login(&self, request: LoginRequest) -> Result<(User, String)> {
        let user = self
            .find_by_email(&request.email)
            .await?
            .ok_or_else(|| AppError::unauthorized("Invalid email or password"))?;

        if !self
            .auth_service
            .verify_password(&request.password, &user.password_hash)?
        {
            return Err(AppError::unauthorized("Invalid email or password"));
        }

        let token = self.auth_service.generate_token(&user.id)?;

        debug!("User logged in: {}", user.id);
        Ok((user, token))
    }

    pub async fn get_user(&self, user_id: &str) -> Result<Option<User>> {
        self.db.get_by_id("user", user_id).await
    }

    pub async fn update_profile(
        &self,
        user_id: &str,
        request: UpdateProfileRequest,
    ) -> Result<(User, String)> {
        request.validate().map_err(AppError::ValidatorError)?;

        let mut user: User = self
            .db
            .get_by_id("user", user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User"))?;

        // 修改密码必须先验证当前密码
        if let Some(password) = &request.password {
            let current = request.current_password.as_deref().ok_or_else(|| {
                AppError::bad_request("Current password is required to set a new password")
            })?;

            if !self.auth_service.verify_password(current, &user.password_hash)? {
                return Err(AppError::unauthorized("Current password is incorrect"));
            }

            user.password_hash = self.auth_service.hash_password(password)?;
        }

        if let Some(name) = request.name {
            user.name = name;
        }
        if let Some(email) = request.email {
            user.email = email;
        }
        if let Some(avatar) = request.avatar {
            user.avatar = Some(avatar);
        }
        if let Some(bio) = request.bio {
            user.bio = Some(bio);
        }
        if let Some(location) = request.location {
            user.location = Some(location);
        }
        user.updated_at = Utc::now();

        let id = user.id.clone();
        let updated: User = self
            .db
            .update_by_id("user", &id, user)
            .await?
            .ok_or_else(|| AppError::not_found("User"))?;

        // 资料保存后重新签发令牌
        let token = self.auth_service.generate_token(&updated.id)?;

        Ok((updated, token))
    }

    /// 删除账户及其全部关联数据。多文档级联按顺序执行，
    /// 中途失败不回滚
    pub async fn delete_account(&self, user_id: &str) -> Result<()> {
        let user: User = self
            .db
            .get_by_id("user", user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User"))?;

        self.blog_service.purge_user(&user.id).await?;
        self.notification_service.delete_for_user(&user.id).await?;
        self.db.delete_by_id("user", &user.id).await?;

        info!("Deleted user account and associated data: {}", user.id);
        Ok(())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let mut response = self
            .db
            .query_with_params(
                "SELECT * FROM user WHERE email = $email",
                json!({ "email": email }),
            )
            .await?;

        let users: Vec<User> = response.take(0)?;
        Ok(users.into_iter().next())
    }
}
