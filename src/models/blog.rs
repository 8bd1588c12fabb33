use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// 博客聚合根，评论/回复/点赞都嵌入在同一文档中
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Blog {
    #[serde(with = "crate::utils::serde_helpers::thing_id")]
    pub id: String,
    pub title: String,
    pub content: String,
    pub author_id: String,
    pub likes: Vec<String>,
    pub comments: Vec<Comment>,
    pub view_count: i64,
    pub read_time: i32, // 分钟
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub author_id: String,
    /// 创建时的作者名快照，之后的改名不回写
    pub author_name: String,
    pub text: String,
    pub replies: Vec<Reply>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reply {
    pub id: String,
    pub author_id: String,
    pub author_name: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Blog {
    pub fn new(title: String, content: String, author_id: String) -> Self {
        let now = Utc::now();
        let read_time = Self::calculate_read_time(&content);

        Self {
            id: Uuid::new_v4().to_string(),
            title,
            content,
            author_id,
            likes: Vec::new(),
            comments: Vec::new(),
            view_count: 0,
            read_time,
            created_at: now,
            updated_at: now,
        }
    }

    fn calculate_word_count(content: &str) -> i32 {
        content.trim().split_whitespace().count() as i32
    }

    /// 按每分钟200词估算阅读时长，最少1分钟
    pub fn calculate_read_time(content: &str) -> i32 {
        let word_count = Self::calculate_word_count(content);
        std::cmp::max(1, (word_count as f32 / 200.0).ceil() as i32)
    }

    pub fn update_content(&mut self, content: String) {
        self.read_time = Self::calculate_read_time(&content);
        self.content = content;
        self.updated_at = Utc::now();
    }

    pub fn update_title(&mut self, title: String) {
        self.title = title;
        self.updated_at = Utc::now();
    }

    pub fn is_liked_by(&self, user_id: &str) -> bool {
        self.likes.iter().any(|id| id == user_id)
    }

    /// 切换点赞状态，返回切换后是否为点赞
    pub fn toggle_like(&mut self, user_id: &str) -> bool {
        if self.is_liked_by(user_id) {
            self.likes.retain(|id| id != user_id);
            false
        } else {
            self.likes.push(user_id.to_string());
            true
        }
    }

    /// 新评论插入到列表头部
    pub fn add_comment(&mut self, author_id: &str, author_name: &str, text: String) {
        let now = Utc::now();
        let comment = Comment {
            id: Uuid::new_v4().to_string(),
            author_id: author_id.to_string(),
            author_name: author_name.to_string(),
            text,
            replies: Vec::new(),
            created_at: now,
            updated_at: now,
        };

        self.comments.insert(0, comment);
        self.updated_at = now;
    }

    pub fn find_comment(&self, comment_id: &str) -> Option<&Comment> {
        self.comments.iter().find(|c| c.id == comment_id)
    }

    pub fn find_comment_mut(&mut self, comment_id: &str) -> Option<&mut Comment> {
        self.comments.iter_mut().find(|c| c.id == comment_id)
    }

    /// 删除评论及其全部回复，返回是否删除了内容
    pub fn remove_comment(&mut self, comment_id: &str) -> bool {
        let before = self.comments.len();
        self.comments.retain(|c| c.id != comment_id);
        let removed = self.comments.len() < before;
        if removed {
            self.updated_at = Utc::now();
        }
        removed
    }

    /// 删除账户时的清理：剥离该用户的评论、回复和点赞
    pub fn scrub_user(&mut self, user_id: &str) -> bool {
        let mut changed = false;

        let before = self.comments.len();
        self.comments.retain(|c| c.author_id != user_id);
        changed |= self.comments.len() < before;

        for comment in self.comments.iter_mut() {
            let before = comment.replies.len();
            comment.replies.retain(|r| r.author_id != user_id);
            changed |= comment.replies.len() < before;
        }

        let before = self.likes.len();
        self.likes.retain(|id| id != user_id);
        changed |= self.likes.len() < before;

        if changed {
            self.updated_at = Utc::now();
        }
        changed
    }
}

impl Comment {
    /// 回复追加在列表尾部
    pub fn add_reply(&mut self, author_id: &str, author_name: &str, text: String) {
        let now = Utc::now();
        let reply = Reply {
            id: Uuid::new_v4().to_string(),
            author_id: author_id.to_string(),
            author_name: author_name.to_string(),
            text,
            created_at: now,
            updated_at: now,
        };

        self.replies.push(reply);
        self.updated_at = now;
    }

    pub fn find_reply(&self, reply_id: &str) -> Option<&Reply> {
        self.replies.iter().find(|r| r.id == reply_id)
    }

    pub fn remove_reply(&mut self, reply_id: &str) -> bool {
        let before = self.replies.len();
        self.replies.retain(|r| r.id != reply_id);
        let removed = self.replies.len() < before;
        if removed {
            self.updated_at = Utc::now();
        }
        removed
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateBlogRequest {
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,

    #[validate(length(min = 1, message = "Content is required"))]
    pub content: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateBlogRequest {
    #[validate(length(min = 1))]
    pub title: Option<String>,

    #[validate(length(min = 1))]
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ReplyRequest {
    pub text: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct BlogQuery {
    pub page: Option<usize>,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AuthorInfo {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub avatar: Option<String>,
}

/// 列表/详情响应中附带作者信息的博客
#[derive(Debug, Serialize)]
pub struct BlogWithAuthor {
    #[serde(flatten)]
    pub blog: Blog,
    pub author: Option<AuthorInfo>,
}

#[derive(Debug, Serialize)]
pub struct LikeStatus {
    pub is_liked: bool,
    pub likes_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_blog() -> Blog {
        Blog::new(
            "Testing in the small".to_string(),
            "Short content".to_string(),
            "user:author".to_string(),
        )
    }

    #[test]
    fn read_time_is_two_minutes_for_400_words() {
        let content = vec!["word"; 400].join(" ");
        assert_eq!(Blog::calculate_read_time(&content), 2);
    }

    #[test]
    fn read_time_has_floor_of_one_minute() {
        assert_eq!(Blog::calculate_read_time("word"), 1);
        assert_eq!(Blog::calculate_read_time(""), 1);
        assert_eq!(Blog::calculate_read_time("   "), 1);
    }

    #[test]
    fn read_time_rounds_up() {
        let content = vec!["word"; 201].join(" ");
        assert_eq!(Blog::calculate_read_time(&content), 2);
    }

    #[test]
    fn update_content_recomputes_read_time() {
        let mut blog = sample_blog();
        assert_eq!(blog.read_time, 1);

        blog.update_content(vec!["word"; 600].join(" "));
        assert_eq!(blog.read_time, 3);
    }

    #[test]
    fn toggle_like_twice_returns_to_original_state() {
        let mut blog = sample_blog();

        assert!(blog.toggle_like("user:a"));
        assert_eq!(blog.likes.len(), 1);
        assert!(blog.is_liked_by("user:a"));

        assert!(!blog.toggle_like("user:a"));
        assert_eq!(blog.likes.len(), 0);
        assert!(!blog.is_liked_by("user:a"));
    }

    #[test]
    fn toggle_like_keeps_each_user_at_most_once() {
        let mut blog = sample_blog();
        blog.toggle_like("user:a");
        blog.toggle_like("user:b");
        blog.toggle_like("user:a");
        blog.toggle_like("user:a");

        assert_eq!(blog.likes, vec!["user:b".to_string(), "user:a".to_string()]);
    }

    #[test]
    fn comments_are_prepended_newest_first() {
        let mut blog = sample_blog();
        blog.add_comment("user:a", "Alice", "first".to_string());
        blog.add_comment("user:b", "Bob", "second".to_string());

        assert_eq!(blog.comments.len(), 2);
        assert_eq!(blog.comments[0].text, "second");
        assert_eq!(blog.comments[1].text, "first");
    }

    #[test]
    fn replies_are_appended_oldest_first() {
        let mut blog = sample_blog();
        blog.add_comment("user:a", "Alice", "comment".to_string());
        let comment_id = blog.comments[0].id.clone();

        let comment = blog.find_comment_mut(&comment_id).unwrap();
        comment.add_reply("user:b", "Bob", "first reply".to_string());
        comment.add_reply("user:c", "Carol", "second reply".to_string());

        let comment = blog.find_comment(&comment_id).unwrap();
        assert_eq!(comment.replies[0].text, "first reply");
        assert_eq!(comment.replies[1].text, "second reply");
    }

    #[test]
    fn removing_comment_takes_its_replies_with_it() {
        let mut blog = sample_blog();
        blog.add_comment("user:a", "Alice", "keep".to_string());
        blog.add_comment("user:b", "Bob", "drop".to_string());
        let drop_id = blog.comments[0].id.clone();
        blog.find_comment_mut(&drop_id)
            .unwrap()
            .add_reply("user:c", "Carol", "orphaned".to_string());

        assert!(blog.remove_comment(&drop_id));
        assert_eq!(blog.comments.len(), 1);
        assert_eq!(blog.comments[0].text, "keep");
        assert!(!blog.remove_comment(&drop_id));
    }

    #[test]
    fn removing_reply_leaves_siblings_intact() {
        let mut blog = sample_blog();
        blog.add_comment("user:a", "Alice", "comment".to_string());
        let comment_id = blog.comments[0].id.clone();

        let comment = blog.find_comment_mut(&comment_id).unwrap();
        comment.add_reply("user:b", "Bob", "one".to_string());
        comment.add_reply("user:c", "Carol", "two".to_string());
        let reply_id = comment.replies[0].id.clone();

        assert!(comment.remove_reply(&reply_id));
        assert_eq!(comment.replies.len(), 1);
        assert_eq!(comment.replies[0].text, "two");
    }

    #[test]
    fn scrub_user_strips_comments_replies_and_likes() {
        let mut blog = sample_blog();
        blog.toggle_like("user:gone");
        blog.toggle_like("user:stays");

        blog.add_comment("user:stays", "Stays", "surviving comment".to_string());
        let surviving_id = blog.comments[0].id.clone();
        blog.find_comment_mut(&surviving_id)
            .unwrap()
            .add_reply("user:gone", "Gone", "reply to strip".to_string());
        blog.find_comment_mut(&surviving_id)
            .unwrap()
            .add_reply("user:other", "Other", "reply to keep".to_string());

        blog.add_comment("user:gone", "Gone", "whole comment to strip".to_string());

        assert!(blog.scrub_user("user:gone"));

        assert_eq!(blog.likes, vec!["user:stays".to_string()]);
        assert_eq!(blog.comments.len(), 1);
        assert_eq!(blog.comments[0].id, surviving_id);
        assert_eq!(blog.comments[0].replies.len(), 1);
        assert_eq!(blog.comments[0].replies[0].text, "reply to keep");

        // 再次清理时已无痕迹
        assert!(!blog.scrub_user("user:gone"));
    }
}
