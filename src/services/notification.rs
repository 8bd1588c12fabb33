use crate::{
    error::{AppError, Result},
    models::blog::Blog,
    models::notification::*,
    models::user::User,
    services::Database,
};
use chrono::Utc;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Clone)]
pub struct NotificationService {
    db: Arc<Database>,
}

impl NotificationService {
    pub async fn new(db: Arc<Database>) -> Result<Self> {
        Ok(Self { db })
    }

    /// 用户与自己互动时不产生通知
    fn is_self_notification(recipient_id: &str, sender_id: &str) -> bool {
        recipient_id == sender_id
    }

    /// 点赞/评论/回复触发的通知写入。写入失败只记录日志，
    /// 不影响触发它的请求
    pub async fn create_notification(
        &self,
        recipient_id: &str,
        sender_id: &str,
        blog_id: &str,
        kind: NotificationKind,
        text: String,
    ) -> Result<Option<Notification>> {
        if Self::is_self_notification(recipient_id, sender_id) {
            return Ok(None);
        }

        let notification = Notification::new(recipient_id, sender_id, blog_id, kind, text);

        match self.db.create("notification", notification).await {
            Ok(created) => Ok(Some(created)),
            Err(e) => {
                warn!("Failed to create notification for {}: {}", recipient_id, e);
                Ok(None)
            }
        }
    }

    pub async fn get_user_notifications(&self, user_id: &str) -> Result<Vec<NotificationView>> {
        debug!("Getting notifications for user: {}", user_id);

        let query = r#"
            SELECT * FROM notification
            WHERE recipient_id = $recipient
            ORDER BY created_at DESC
        "#;

        let mut response = self
            .db
            .query_with_params(query, json!({ "recipient": user_id }))
            .await?;
        let notifications: Vec<Notification> = response.take(0)?;

        // 联查发送者姓名与博客标题
        let mut sender_names: HashMap<String, Option<String>> = HashMap::new();
        let mut blog_titles: HashMap<String, Option<String>> = HashMap::new();
        let mut views = Vec::with_capacity(notifications.len());

        for notification in notifications {
            if !sender_names.contains_key(&notification.sender_id) {
                let sender: Option<User> = self.db.get_by_id("user", &notification.sender_id).await?;
                sender_names.insert(
                    notification.sender_id.clone(),
                    sender.map(|u| u.name),
                );
            }
            if !blog_titles.contains_key(&notification.blog_id) {
                let blog: Option<Blog> = self.db.get_by_id("blog", &notification.blog_id).await?;
                blog_titles.insert(
                    notification.blog_id.clone(),
                    blog.map(|b| b.title),
                );
            }

            let sender_name = sender_names
                .get(&notification.sender_id)
                .cloned()
                .flatten();
            let blog_title = blog_titles.get(&notification.blog_id).cloned().flatten();

            views.push(NotificationView {
                notification,
                sender_name,
                blog_title,
            });
        }

        Ok(views)
    }

    pub async fn mark_as_read(&self, notification_id: &str, user_id: &str) -> Result<Notification> {
        let notification: Notification = self
            .db
            .get_by_id("notification", notification_id)
            .await?
            .ok_or_else(|| AppError::not_found("Notification"))?;

        if notification.recipient_id != user_id {
            return Err(AppError::forbidden(
                "You can only manage your own notifications",
            ));
        }

        let updates = json!({
            "is_read": true,
            "updated_at": Utc::now(),
        });

        let updated: Notification = self
            .db
            .merge_by_id("notification", notification_id, updates)
            .await?
            .ok_or_else(|| AppError::internal("Failed to update notification"))?;

        Ok(updated)
    }

    pub async fn mark_all_as_read(&self, user_id: &str) -> Result<()> {
        let query = r#"
            UPDATE notification
            SET is_read = true, updated_at = $now
            WHERE recipient_id = $recipient AND is_read = false
        "#;

        self.db
            .query_with_params(query, json!({
                "recipient": user_id,
                "now": Utc::now(),
            }))
            .await?;

        Ok(())
    }

    pub async fn unread_count(&self, user_id: &str) -> Result<usize> {
        let query = r#"
            SELECT count() AS total FROM notification
            WHERE recipient_id = $recipient AND is_read = false
            GROUP ALL
        "#;

        let mut response = self
            .db
            .query_with_params(query, json!({ "recipient": user_id }))
            .await?;
        let results: Vec<Value> = response.take(0)?;

        let count = results
            .first()
            .and_then(|v| v["total"].as_u64())
            .unwrap_or(0);

        Ok(count as usize)
    }

    pub async fn delete_notification(&self, notification_id: &str, user_id: &str) -> Result<()> {
        let notification: Notification = self
            .db
            .get_by_id("notification", notification_id)
            .await?
            .ok_or_else(|| AppError::not_found("Notification"))?;

        if notification.recipient_id != user_id {
            return Err(AppError::forbidden(
                "You can only manage your own notifications",
            ));
        }

        self.db.delete_by_id("notification", notification_id).await
    }

    /// 级联清理：删除该用户作为发送者或接收者的全部通知
    pub async fn delete_for_user(&self, user_id: &str) -> Result<()> {
        let query = r#"
            DELETE notification
            WHERE recipient_id = $user_id OR sender_id = $user_id
        "#;

        self.db
            .query_with_params(query, json!({ "user_id": user_id }))
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn self_interaction_is_suppressed() {
        assert!(NotificationService::is_self_notification("user:a", "user:a"));
        assert!(!NotificationService::is_self_notification("user:a", "user:b"));
    }
}
