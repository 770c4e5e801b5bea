//! 缓存层
//!
//! - `memory`: 进程内 moka 缓存
//! - `redis`: 共享的 Redis 缓存
//! - `none`: 关闭缓存

pub mod moka;
pub mod null;
pub mod redis;
pub mod traits;

use std::sync::Arc;

pub use self::moka::MokaUrlCache;
pub use self::null::NullUrlCache;
pub use self::redis::RedisUrlCache;
pub use traits::{CacheResult, UrlCache};

use crate::config::CacheConfig;
use crate::errors::{Result, ShortenerError};
use crate::services::HealthProbe;

/// 缓存实例及其健康检查视图
#[derive(Clone)]
pub struct CacheHandles {
    pub cache: Arc<dyn UrlCache>,
    pub probe: Arc<dyn HealthProbe>,
}

impl CacheHandles {
    fn from_shared<C>(cache: Arc<C>) -> Self
    where
        C: UrlCache + HealthProbe + 'static,
    {
        Self {
            cache: cache.clone(),
            probe: cache,
        }
    }
}

pub struct CacheFactory;

impl CacheFactory {
    pub async fn create(config: &CacheConfig) -> Result<CacheHandles> {
        let handles = match config.cache_type.as_str() {
            "memory" => CacheHandles::from_shared(Arc::new(MokaUrlCache::new(
                config.memory.max_capacity,
            ))),
            "redis" => CacheHandles::from_shared(Arc::new(RedisUrlCache::new(&config.redis).await?)),
            "none" => CacheHandles::from_shared(Arc::new(NullUrlCache)),
            other => {
                return Err(ShortenerError::config(format!(
                    "Unknown cache type '{}'. Supported: memory, redis, none",
                    other
                )));
            }
        };

        tracing::info!("Cache backend initialized: {}", config.cache_type);
        Ok(handles)
    }
}
