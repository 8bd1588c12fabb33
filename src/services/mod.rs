pub mod auth;
pub mod blog;
pub mod database;
pub mod notification;
pub mod user;

// 重新导出常用类型
pub use auth::AuthService;
pub use blog::BlogService;
pub use database::Database;
pub use notification::NotificationService;
pub use user::UserService;
