use std::time::{Duration, Instant};

use async_trait::async_trait;
use moka::future::Cache;
use moka::policy::Expiry;
use tracing::debug;

use crate::cache::{CacheResult, UrlCache};
use crate::errors::Result;
use crate::services::HealthProbe;
use crate::storage::ShortUrl;

/// 缓存条目，携带写入时指定的 TTL
#[derive(Debug, Clone)]
struct CachedUrl {
    url: ShortUrl,
    ttl: Duration,
}

/// 按条目自身的 TTL 过期
struct PerEntryExpiry;

impl Expiry<String, CachedUrl> for PerEntryExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &CachedUrl,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &CachedUrl,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

pub struct MokaUrlCache {
    inner: Cache<String, CachedUrl>,
}

impl MokaUrlCache {
    pub fn new(max_capacity: u64) -> Self {
        let inner = Cache::builder()
            .max_capacity(max_capacity)
            .expire_after(PerEntryExpiry)
            .build();

        debug!("MokaUrlCache initialized with max capacity: {}", max_capacity);
        Self { inner }
    }
}

#[async_trait]
impl UrlCache for MokaUrlCache {
    async fn get(&self, short_code: &str) -> Result<CacheResult> {
        Ok(match self.inner.get(short_code).await {
            Some(entry) => CacheResult::Found(entry.url),
            None => CacheResult::Miss,
        })
    }

    async fn set(&self, url: &ShortUrl, ttl: Duration) -> Result<()> {
        self.inner
            .insert(
                url.short_code.clone(),
                CachedUrl {
                    url: url.clone(),
                    ttl,
                },
            )
            .await;
        Ok(())
    }
}

#[async_trait]
impl HealthProbe for MokaUrlCache {
    fn name(&self) -> &'static str {
        "cache"
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}
