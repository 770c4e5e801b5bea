use std::time::Duration;

use async_trait::async_trait;

use crate::errors::Result;
use crate::storage::ShortUrl;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheResult {
    Found(ShortUrl),
    Miss,
}

/// 短码 -> 映射的热点缓存
///
/// 仅做尽力而为的加速，调用方把错误当作未命中处理。
#[async_trait]
pub trait UrlCache: Send + Sync {
    async fn get(&self, short_code: &str) -> Result<CacheResult>;

    /// 以 `ttl` 为有效期写入，键为 `url.short_code`
    async fn set(&self, url: &ShortUrl, ttl: Duration) -> Result<()>;
}
