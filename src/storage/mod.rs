use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::analytics::AnalyticsStore;
use crate::config::DatabaseConfig;
use crate::errors::Result;
use crate::services::HealthProbe;

pub mod backend;
pub mod memory;
pub mod models;

pub use backend::SeaOrmStorage;
pub use memory::InMemoryStore;
pub use models::{NewShortUrl, ShortUrl};

/// 存储层错误
///
/// 唯一约束冲突单独成类并保留约束名，调用方据此决定是否重试。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    UniqueViolation { constraint: String },
    NotFound,
    Database(String),
}

impl StoreError {
    pub fn unique_violation<T: Into<String>>(constraint: T) -> Self {
        StoreError::UniqueViolation {
            constraint: constraint.into(),
        }
    }

    pub fn database<T: Into<String>>(msg: T) -> Self {
        StoreError::Database(msg.into())
    }

    /// 冲突是否发生在 short_code 唯一约束上
    pub fn is_short_code_violation(&self) -> bool {
        matches!(self, StoreError::UniqueViolation { constraint } if constraint.contains("short_code"))
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::UniqueViolation { constraint } => {
                write!(f, "unique constraint violated: {}", constraint)
            }
            StoreError::NotFound => write!(f, "record not found"),
            StoreError::Database(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for StoreError {}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// 持久化短链接映射，唯一性由存储层约束保证
#[async_trait]
pub trait UrlStore: Send + Sync {
    /// 插入新映射并分配 id / created_at / updated_at
    async fn create(&self, new_url: NewShortUrl) -> StoreResult<ShortUrl>;

    /// 仅返回启用且未过期的映射，否则 `StoreError::NotFound`
    async fn get_by_short_code(&self, short_code: &str) -> StoreResult<ShortUrl>;
}

/// 同一个存储实例对外暴露的三个视图
#[derive(Clone)]
pub struct StorageHandles {
    pub urls: Arc<dyn UrlStore>,
    pub analytics: Arc<dyn AnalyticsStore>,
    pub probe: Arc<dyn HealthProbe>,
}

impl StorageHandles {
    pub fn from_shared<S>(storage: Arc<S>) -> Self
    where
        S: UrlStore + AnalyticsStore + HealthProbe + 'static,
    {
        Self {
            urls: storage.clone(),
            analytics: storage.clone(),
            probe: storage,
        }
    }
}

pub struct StorageFactory;

impl StorageFactory {
    /// 根据 database_url 选择存储后端；`memory://` 使用进程内存储
    pub async fn create(config: &DatabaseConfig) -> Result<StorageHandles> {
        let database_url = &config.database_url;

        if database_url.starts_with("memory://") {
            tracing::warn!("Using in-memory storage, data will not survive a restart");
            return Ok(StorageHandles::from_shared(Arc::new(InMemoryStore::new())));
        }

        // 从 URL 自动推断数据库类型
        let backend_type = backend::infer_backend_from_url(database_url)?;
        let storage = SeaOrmStorage::new(config, &backend_type).await?;
        Ok(StorageHandles::from_shared(Arc::new(storage)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_code_violation_detection() {
        assert!(StoreError::unique_violation("urls_short_code_key").is_short_code_violation());
        assert!(
            StoreError::unique_violation("UNIQUE constraint failed: urls.short_code")
                .is_short_code_violation()
        );
        assert!(!StoreError::unique_violation("urls_original_url_key").is_short_code_violation());
        assert!(!StoreError::NotFound.is_short_code_violation());
        assert!(!StoreError::database("short_code broke").is_short_code_violation());
    }

    #[tokio::test]
    async fn test_factory_memory_backend() {
        let config = DatabaseConfig {
            database_url: "memory://".to_string(),
            ..DatabaseConfig::default()
        };
        let handles = StorageFactory::create(&config).await.unwrap();
        let created = handles
            .urls
            .create(NewShortUrl::new("memtest", "https://example.com"))
            .await
            .unwrap();
        assert_eq!(handles.urls.get_by_short_code("memtest").await.unwrap(), created);
        assert_eq!(handles.probe.name(), "storage");
    }

    #[tokio::test]
    async fn test_factory_rejects_unknown_scheme() {
        let config = DatabaseConfig {
            database_url: "ftp://nowhere".to_string(),
            ..DatabaseConfig::default()
        };
        assert!(StorageFactory::create(&config).await.is_err());
    }
}
