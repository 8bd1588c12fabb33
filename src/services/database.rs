use crate::config::Config;
use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::Debug;
use surrealdb::engine::remote::http::{Client, Http};
use surrealdb::opt::auth::Root;
use surrealdb::{Response, Surreal};
use tracing::{debug, error, info};

/// 数据库服务
#[derive(Clone)]
pub struct Database {
    client: Surreal<Client>,
    pub config: Config,
}

impl Database {
    /// 创建新的数据库实例
    pub async fn new(config: &Config) -> Result<Self> {
        info!("Initializing database connection to {}", config.database_url);

        let address = config
            .database_url
            .trim_start_matches("http://")
            .trim_start_matches("https://")
            .to_string();

        let client = Surreal::new::<Http>(address).await?;

        client
            .signin(Root {
                username: &config.database_username,
                password: &config.database_password,
            })
            .await?;

        client
            .use_ns(config.database_namespace.as_str())
            .use_db(config.database_name.as_str())
            .await?;

        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    /// 验证数据库连接
    pub async fn verify_connection(&self) -> Result<()> {
        match self.client.query("INFO FOR DB").await {
            Ok(_) => {
                info!("Database connection verified successfully");
                Ok(())
            }
            Err(e) => {
                error!("Failed to verify database connection: {}", e);
                Err(AppError::from(e))
            }
        }
    }

    /// 执行原始SQL查询
    pub async fn query(&self, sql: &str) -> Result<Response> {
        self.client.query(sql).await.map_err(AppError::from)
    }

    /// 执行带参数的查询，参数为JSON对象，每个键成为一个查询变量
    pub async fn query_with_params(&self, sql: &str, params: Value) -> Result<Response> {
        let mut query = self.client.query(sql);

        if let Value::Object(map) = params {
            for (key, value) in map {
                query = query.bind((key, value));
            }
        }

        query.await.map_err(AppError::from)
    }

    /// 创建记录
    pub async fn create<T>(&self, table: &str, data: T) -> Result<T>
    where
        T: Serialize + for<'de> Deserialize<'de> + Send + Sync + Clone + Debug,
    {
        let results: Vec<T> = self
            .client
            .create(table)
            .content(data)
            .await
            .map_err(AppError::from)?;

        results
            .into_iter()
            .next()
            .ok_or_else(|| AppError::Internal("Failed to create record".to_string()))
    }

    /// 选择表中的全部记录
    pub async fn select<T>(&self, table: &str) -> Result<Vec<T>>
    where
        T: for<'de> Deserialize<'de> + Send + Sync + Debug,
    {
        self.client.select(table).await.map_err(AppError::from)
    }

    /// 通过ID获取单个记录
    pub async fn get_by_id<T>(&self, table: &str, id: &str) -> Result<Option<T>>
    where
        T: for<'de> Deserialize<'de> + Send + Sync + Debug,
    {
        let pure_id = Self::strip_table_prefix(table, id);
        debug!("Selecting record {}:{}", table, pure_id);

        self.client
            .select((table, pure_id))
            .await
            .map_err(AppError::from)
    }

    /// 通过ID整体替换记录内容
    pub async fn update_by_id<T>(&self, table: &str, id: &str, data: T) -> Result<Option<T>>
    where
        T: Serialize + for<'de> Deserialize<'de> + Send + Sync + Debug,
    {
        let pure_id = Self::strip_table_prefix(table, id);

        self.client
            .update((table, pure_id))
            .content(data)
            .await
            .map_err(AppError::from)
    }

    /// 通过ID合并部分字段
    pub async fn merge_by_id<T>(&self, table: &str, id: &str, updates: Value) -> Result<Option<T>>
    where
        T: for<'de> Deserialize<'de> + Send + Sync + Debug,
    {
        let pure_id = Self::strip_table_prefix(table, id);

        self.client
            .update((table, pure_id))
            .merge(updates)
            .await
            .map_err(AppError::from)
    }

    /// 通过ID删除记录
    pub async fn delete_by_id(&self, table: &str, id: &str) -> Result<()> {
        let pure_id = Self::strip_table_prefix(table, id);

        let _: Option<Value> = self
            .client
            .delete((table, pure_id))
            .await
            .map_err(AppError::from)?;
        Ok(())
    }

    /// 记录ID可能带有 "table:" 前缀，查询时需要纯ID
    fn strip_table_prefix<'a>(table: &str, id: &'a str) -> &'a str {
        let prefix = format!("{}:", table);
        if let Some(stripped) = id.strip_prefix(&prefix) {
            stripped
        } else {
            id
        }
    }
}

/// 分页结果结构
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PaginatedResult<T> {
    pub data: Vec<T>,
    pub total: usize,
    pub page: usize,
    pub per_page: usize,
    pub total_pages: usize,
}

impl<T> PaginatedResult<T> {
    pub fn new(data: Vec<T>, total: usize, page: usize, per_page: usize) -> Self {
        let total_pages = if per_page == 0 {
            0
        } else {
            (total + per_page - 1) / per_page
        };

        Self {
            data,
            total,
            page,
            per_page,
            total_pages,
        }
    }

    pub fn has_more(&self) -> bool {
        self.per_page * self.page < self.total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paginated_result_has_more_on_partial_last_page() {
        // 10 blogs, page 2 of size 6 holds the trailing 4
        let result: PaginatedResult<u32> = PaginatedResult::new(vec![7, 8, 9, 10], 10, 2, 6);
        assert_eq!(result.total_pages, 2);
        assert!(!result.has_more());

        let first_page: PaginatedResult<u32> = PaginatedResult::new(vec![1, 2, 3, 4, 5, 6], 10, 1, 6);
        assert!(first_page.has_more());
    }

    #[test]
    fn paginated_result_exact_fit() {
        let result: PaginatedResult<u32> = PaginatedResult::new(vec![1, 2], 4, 2, 2);
        assert_eq!(result.total_pages, 2);
        assert!(!result.has_more());
    }

    #[test]
    fn strip_table_prefix_handles_both_forms() {
        assert_eq!(Database::strip_table_prefix("blog", "blog:abc-123"), "abc-123");
        assert_eq!(Database::strip_table_prefix("blog", "abc-123"), "abc-123");
        // 不剥离其他表的前缀
        assert_eq!(Database::strip_table_prefix("blog", "user:abc"), "user:abc");
    }
}
