use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    #[serde(with = "crate::utils::serde_helpers::thing_id")]
    pub id: String,
    pub recipient_id: String,
    pub sender_id: String,
    pub blog_id: String,
    pub kind: NotificationKind,
    pub text: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Like,
    Comment,
    Reply,
}

impl Notification {
    pub fn new(
        recipient_id: &str,
        sender_id: &str,
        blog_id: &str,
        kind: NotificationKind,
        text: String,
    ) -> Self {
        let now = Utc::now();

        Self {
            id: Uuid::new_v4().to_string(),
            recipient_id: recipient_id.to_string(),
            sender_id: sender_id.to_string(),
            blog_id: blog_id.to_string(),
            kind,
            text,
            is_read: false,
            created_at: now,
            updated_at: now,
        }
    }
}

/// 通知列表响应，带发送者姓名与博客标题
#[derive(Debug, Serialize)]
pub struct NotificationView {
    #[serde(flatten)]
    pub notification: Notification,
    pub sender_name: Option<String>,
    pub blog_title: Option<String>,
}
