use std::time::Duration;

use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use tracing::{debug, trace};

use crate::cache::{CacheResult, UrlCache};
use crate::config::RedisConfig;
use crate::errors::{Result, ShortenerError};
use crate::services::HealthProbe;
use crate::storage::ShortUrl;

/// Redis 缓存，值为 ShortUrl 的 JSON，键为 `{key_prefix}{short_code}`
///
/// `ConnectionManager` 在连接断开后自动重连，这里不需要自己维护连接状态。
pub struct RedisUrlCache {
    conn: ConnectionManager,
    key_prefix: String,
}

impl RedisUrlCache {
    pub async fn new(config: &RedisConfig) -> Result<Self> {
        let client = redis::Client::open(config.url.as_str()).map_err(|e| {
            ShortenerError::cache_connection(format!("Invalid Redis URL '{}': {}", config.url, e))
        })?;

        let mut conn = ConnectionManager::new(client).await.map_err(|e| {
            ShortenerError::cache_connection(format!(
                "Failed to connect to Redis at {}: {}",
                config.url, e
            ))
        })?;

        // 启动时确认服务端可用
        let pong: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| ShortenerError::cache_connection(format!("Redis ping failed: {}", e)))?;
        debug!(
            "RedisUrlCache connected ({}), prefix: '{}'",
            pong, config.key_prefix
        );

        Ok(Self {
            conn,
            key_prefix: config.key_prefix.clone(),
        })
    }

    fn make_key(&self, short_code: &str) -> String {
        format!("{}{}", self.key_prefix, short_code)
    }
}

#[async_trait]
impl UrlCache for RedisUrlCache {
    async fn get(&self, short_code: &str) -> Result<CacheResult> {
        let mut conn = self.conn.clone();
        let data: Option<String> = conn
            .get(self.make_key(short_code))
            .await
            .map_err(|e| ShortenerError::cache_connection(format!("Redis GET failed: {}", e)))?;

        match data {
            Some(data) => {
                let url: ShortUrl = serde_json::from_str(&data)?;
                trace!("Redis cache hit: {}", short_code);
                Ok(CacheResult::Found(url))
            }
            None => {
                trace!("Redis cache miss: {}", short_code);
                Ok(CacheResult::Miss)
            }
        }
    }

    async fn set(&self, url: &ShortUrl, ttl: Duration) -> Result<()> {
        let payload = serde_json::to_string(url)?;
        let ttl_ms = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1);

        let mut conn = self.conn.clone();
        conn.pset_ex::<String, String, ()>(self.make_key(&url.short_code), payload, ttl_ms)
            .await
            .map_err(|e| ShortenerError::cache_connection(format!("Redis SET failed: {}", e)))?;

        trace!("Redis cache set: {} (ttl {} ms)", url.short_code, ttl_ms);
        Ok(())
    }
}

#[async_trait]
impl HealthProbe for RedisUrlCache {
    fn name(&self) -> &'static str {
        "cache"
    }

    async fn ping(&self) -> Result<()> {
        let mut conn = self.conn.clone();
        redis::cmd("PING")
            .query_async::<String>(&mut conn)
            .await
            .map(|_| ())
            .map_err(|e| ShortenerError::cache_connection(format!("Redis ping failed: {}", e)))
    }
}
