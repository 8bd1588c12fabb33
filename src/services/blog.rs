use crate::{
    error::{AppError, Result},
    models::blog::*,
    models::notification::NotificationKind,
    models::user::User,
    services::database::PaginatedResult,
    services::{Database, NotificationService},
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};
use validator::Validate;

#[derive(Clone)]
pub struct BlogService {
    db: Arc<Database>,
    notification_service: NotificationService,
}

impl BlogService {
    pub async fn new(db: Arc<Database>, notification_service: NotificationService) -> Result<Self> {
        Ok(Self {
            db,
            notification_service,
        })
    }

    pub async fn create_blog(&self, author: &User, request: CreateBlogRequest) -> Result<Blog> {
        debug!("Creating blog for user: {}", author.id);

        request.validate().map_err(AppError::ValidatorError)?;

        let blog = Blog::new(request.title, request.content, author.id.clone());
        let created = self.db.create("blog", blog).await?;

        info!("Created blog: {} by user: {}", created.id, author.id);
        Ok(created)
    }

    /// 博客列表，最新优先，带作者信息
    pub async fn get_blogs(&self, query: BlogQuery) -> Result<PaginatedResult<BlogWithAuthor>> {
        debug!("Getting blogs list with query: {:?}", query);

        let page = query.page.unwrap_or(1).max(1);
        let limit = query
            .limit
            .unwrap_or(self.db.config.default_blogs_per_page)
            .max(1);
        let offset = (page - 1) * limit;

        let total = self.count_blogs(None).await?;

        let data_query = r#"
            SELECT * FROM blog
            ORDER BY created_at DESC
            LIMIT $limit START $offset
        "#;

        let mut response = self
            .db
            .query_with_params(data_query, json!({
                "limit": limit,
                "offset": offset,
            }))
            .await?;
        let blogs: Vec<Blog> = response.take(0)?;

        let items = self.attach_authors(blogs).await?;
        Ok(PaginatedResult::new(items, total, page, limit))
    }

    /// 单个作者的博客列表，分页规则与总列表一致
    pub async fn get_blogs_by_author(
        &self,
        author_id: &str,
        query: BlogQuery,
    ) -> Result<PaginatedResult<BlogWithAuthor>> {
        debug!("Getting blogs for author: {}", author_id);

        let page = query.page.unwrap_or(1).max(1);
        let limit = query
            .limit
            .unwrap_or(self.db.config.default_blogs_per_page)
            .max(1);
        let offset = (page - 1) * limit;

        let total = self.count_blogs(Some(author_id)).await?;

        let data_query = r#"
            SELECT * FROM blog
            WHERE author_id = $author
            ORDER BY created_at DESC
            LIMIT $limit START $offset
        "#;

        let mut response = self
            .db
            .query_with_params(data_query, json!({
                "author": author_id,
                "limit": limit,
                "offset": offset,
            }))
            .await?;
        let blogs: Vec<Blog> = response.take(0)?;

        let items = self.attach_authors(blogs).await?;
        Ok(PaginatedResult::new(items, total, page, limit))
    }

    /// 读取博客详情。每次读取都会累加浏览数，不按访客去重
    pub async fn get_blog_by_id(&self, blog_id: &str) -> Result<BlogWithAuthor> {
        let mut blog = self.require_blog(blog_id).await?;

        blog.view_count += 1;
        let blog = self.save_blog(blog).await?;

        let author = self.get_author_info(&blog.author_id).await?;
        Ok(BlogWithAuthor { blog, author })
    }

    pub async fn update_blog(
        &self,
        blog_id: &str,
        actor_id: &str,
        request: UpdateBlogRequest,
    ) -> Result<Blog> {
        request.validate().map_err(AppError::ValidatorError)?;

        let mut blog = self.require_blog(blog_id).await?;

        if blog.author_id != actor_id {
            return Err(AppError::forbidden(
                "Only the blog author can update this blog",
            ));
        }

        if let Some(title) = request.title {
            blog.update_title(title);
        }
        if let Some(content) = request.content {
            blog.update_content(content);
        }

        self.save_blog(blog).await
    }

    pub async fn delete_blog(&self, blog_id: &str, actor_id: &str) -> Result<()> {
        let blog = self.require_blog(blog_id).await?;

        if blog.author_id != actor_id {
            return Err(AppError::forbidden(
                "Only the blog author can delete this blog",
            ));
        }

        self.db.delete_by_id("blog", &blog.id).await?;
        info!("Deleted blog: {} by user: {}", blog.id, actor_id);
        Ok(())
    }

    /// 切换点赞。只有从未点赞到点赞的转换才通知作者
    pub async fn toggle_like(&self, blog_id: &str, actor: &User) -> Result<LikeStatus> {
        let mut blog = self.require_blog(blog_id).await?;

        let is_liked = blog.toggle_like(&actor.id);
        let blog = self.save_blog(blog).await?;

        if is_liked {
            self.notification_service
                .create_notification(
                    &blog.author_id,
                    &actor.id,
                    &blog.id,
                    NotificationKind::Like,
                    format!("{} liked your blog \"{}\"", actor.name, blog.title),
                )
                .await?;
        }

        Ok(LikeStatus {
            is_liked,
            likes_count: blog.likes.len(),
        })
    }

    pub async fn check_like_status(&self, blog_id: &str, actor_id: &str) -> Result<LikeStatus> {
        let blog = self.require_blog(blog_id).await?;

        Ok(LikeStatus {
            is_liked: blog.is_liked_by(actor_id),
            likes_count: blog.likes.len(),
        })
    }

    pub async fn add_comment(
        &self,
        blog_id: &str,
        actor: &User,
        request: CommentRequest,
    ) -> Result<Vec<Comment>> {
        let text = request
            .text
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AppError::bad_request("Comment text is required"))?;

        let mut blog = self.require_blog(blog_id).await?;
        blog.add_comment(&actor.id, &actor.name, text);
        let blog = self.save_blog(blog).await?;

        self.notification_service
            .create_notification(
                &blog.author_id,
                &actor.id,
                &blog.id,
                NotificationKind::Comment,
                format!("{} commented on your blog \"{}\"", actor.name, blog.title),
            )
            .await?;

        Ok(blog.comments)
    }

    pub async fn delete_comment(
        &self,
        blog_id: &str,
        actor_id: &str,
        comment_id: &str,
    ) -> Result<Vec<Comment>> {
        let mut blog = self.require_blog(blog_id).await?;

        let comment = blog
            .find_comment(comment_id)
            .ok_or_else(|| AppError::not_found("Comment"))?;

        let is_comment_author = comment.author_id == actor_id;
        let is_blog_author = blog.author_id == actor_id;

        if !is_comment_author && !is_blog_author {
            return Err(AppError::forbidden("Not authorized to delete this comment"));
        }

        blog.remove_comment(comment_id);
        let blog = self.save_blog(blog).await?;

        Ok(blog.comments)
    }

    pub async fn add_reply(
        &self,
        blog_id: &str,
        actor: &User,
        comment_id: &str,
        request: ReplyRequest,
    ) -> Result<Comment> {
        let text = request
            .text
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AppError::bad_request("Reply text is required"))?;

        let mut blog = self.require_blog(blog_id).await?;

        let comment = blog
            .find_comment_mut(comment_id)
            .ok_or_else(|| AppError::not_found("Comment"))?;
        let comment_author_id = comment.author_id.clone();

        comment.add_reply(&actor.id, &actor.name, text);
        let blog = self.save_blog(blog).await?;

        let (notify_blog_author, notify_comment_author) =
            reply_notification_targets(&blog.author_id, &comment_author_id, &actor.id);

        if notify_blog_author {
            self.notification_service
                .create_notification(
                    &blog.author_id,
                    &actor.id,
                    &blog.id,
                    NotificationKind::Reply,
                    format!(
                        "{} replied to a comment on your blog \"{}\"",
                        actor.name, blog.title
                    ),
                )
                .await?;
        }

        if notify_comment_author {
            self.notification_service
                .create_notification(
                    &comment_author_id,
                    &actor.id,
                    &blog.id,
                    NotificationKind::Reply,
                    format!("{} replied to your comment on \"{}\"", actor.name, blog.title),
                )
                .await?;
        }

        let comment = blog
            .find_comment(comment_id)
            .ok_or_else(|| AppError::internal("Comment missing after reply"))?;
        Ok(comment.clone())
    }

    pub async fn delete_reply(
        &self,
        blog_id: &str,
        actor_id: &str,
        comment_id: &str,
        reply_id: &str,
    ) -> Result<Comment> {
        let mut blog = self.require_blog(blog_id).await?;
        let blog_author_id = blog.author_id.clone();

        let comment = blog
            .find_comment_mut(comment_id)
            .ok_or_else(|| AppError::not_found("Comment"))?;

        let reply = comment
            .find_reply(reply_id)
            .ok_or_else(|| AppError::not_found("Reply"))?;

        let is_reply_author = reply.author_id == actor_id;
        let is_comment_author = comment.author_id == actor_id;
        let is_blog_author = blog_author_id == actor_id;

        if !is_reply_author && !is_comment_author && !is_blog_author {
            return Err(AppError::forbidden("Not authorized to delete this reply"));
        }

        comment.remove_reply(reply_id);
        let blog = self.save_blog(blog).await?;

        let comment = blog
            .find_comment(comment_id)
            .ok_or_else(|| AppError::internal("Comment missing after reply deletion"))?;
        Ok(comment.clone())
    }

    /// 级联清理：删除该作者的全部博客，并从其余博客中剥离其痕迹
    pub async fn purge_user(&self, user_id: &str) -> Result<()> {
        self.db
            .query_with_params(
                "DELETE blog WHERE author_id = $author",
                json!({ "author": user_id }),
            )
            .await?;

        // 其余博客里该用户的评论/回复/点赞
        let touched_query = r#"
            SELECT * FROM blog
            WHERE $user_id IN likes
            OR $user_id IN comments.author_id
            OR $user_id IN array::flatten(comments.replies.author_id)
        "#;

        let mut response = self
            .db
            .query_with_params(touched_query, json!({ "user_id": user_id }))
            .await?;
        let touched: Vec<Blog> = response.take(0)?;

        for mut blog in touched {
            if blog.scrub_user(user_id) {
                self.save_blog(blog).await?;
            }
        }

        Ok(())
    }

    // Helper methods

    async fn require_blog(&self, blog_id: &str) -> Result<Blog> {
        self.db
            .get_by_id("blog", blog_id)
            .await?
            .ok_or_else(|| AppError::not_found("Blog"))
    }

    async fn save_blog(&self, blog: Blog) -> Result<Blog> {
        let id = blog.id.clone();
        self.db
            .update_by_id("blog", &id, blog)
            .await?
            .ok_or_else(|| AppError::not_found("Blog"))
    }

    async fn count_blogs(&self, author_id: Option<&str>) -> Result<usize> {
        let (query, params) = match author_id {
            Some(author) => (
                "SELECT count() AS total FROM blog WHERE author_id = $author GROUP ALL",
                json!({ "author": author }),
            ),
            None => ("SELECT count() AS total FROM blog GROUP ALL", json!({})),
        };

        let mut response = self.db.query_with_params(query, params).await?;
        let results: Vec<Value> = response.take(0)?;

        let total = results
            .first()
            .and_then(|v| v["total"].as_u64())
            .unwrap_or(0);

        Ok(total as usize)
    }

    async fn get_author_info(&self, author_id: &str) -> Result<Option<AuthorInfo>> {
        let author: Option<User> = self.db.get_by_id("user", author_id).await?;

        Ok(author.map(|user| AuthorInfo {
            id: user.id,
            name: user.name,
            email: Some(user.email),
            avatar: user.avatar,
        }))
    }

    async fn attach_authors(&self, blogs: Vec<Blog>) -> Result<Vec<BlogWithAuthor>> {
        let mut authors: HashMap<String, Option<AuthorInfo>> = HashMap::new();
        let mut items = Vec::with_capacity(blogs.len());

        for blog in blogs {
            if !authors.contains_key(&blog.author_id) {
                let info = self.get_author_info(&blog.author_id).await?;
                authors.insert(blog.author_id.clone(), info);
            }

            let author = authors.get(&blog.author_id).cloned().flatten();
            items.push(BlogWithAuthor { blog, author });
        }

        Ok(items)
    }
}

/// 回复的通知对象：博客作者（非回复者本人），以及评论作者
/// （既非回复者本人也非博客作者，避免重复通知）
fn reply_notification_targets(
    blog_author_id: &str,
    comment_author_id: &str,
    replier_id: &str,
) -> (bool, bool) {
    let notify_blog_author = blog_author_id != replier_id;
    let notify_comment_author = comment_author_id != replier_id && comment_author_id != blog_author_id;
    (notify_blog_author, notify_comment_author)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reply_fan_out_notifies_both_when_all_distinct() {
        assert_eq!(reply_notification_targets("author", "commenter", "replier"), (true, true));
    }

    #[test]
    fn reply_fan_out_skips_replier_own_roles() {
        // 博客作者回复：只通知评论作者
        assert_eq!(reply_notification_targets("author", "commenter", "author"), (false, true));
        // 评论作者回复自己评论：只通知博客作者
        assert_eq!(reply_notification_targets("author", "commenter", "commenter"), (true, false));
    }

    #[test]
    fn reply_fan_out_never_duplicates_blog_author() {
        // 评论作者就是博客作者：一条通知而不是两条
        assert_eq!(reply_notification_targets("author", "author", "replier"), (true, false));
        // 全部同一人：零通知
        assert_eq!(reply_notification_targets("author", "author", "author"), (false, false));
    }
}
