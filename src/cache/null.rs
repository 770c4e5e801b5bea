use std::time::Duration;

use async_trait::async_trait;

use crate::cache::{CacheResult, UrlCache};
use crate::errors::Result;
use crate::services::HealthProbe;
use crate::storage::ShortUrl;

/// 关闭缓存时使用：永远未命中，写入直接丢弃
pub struct NullUrlCache;

#[async_trait]
impl UrlCache for NullUrlCache {
    async fn get(&self, _short_code: &str) -> Result<CacheResult> {
        Ok(CacheResult::Miss)
    }

    async fn set(&self, _url: &ShortUrl, _ttl: Duration) -> Result<()> {
        Ok(())
    }
}

#[async_trait]
impl HealthProbe for NullUrlCache {
    fn name(&self) -> &'static str {
        "cache"
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}
