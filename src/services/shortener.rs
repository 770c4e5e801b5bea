use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use tracing::{debug, info, trace, warn};

use crate::analytics::{AnalyticsStore, ClickEvent, ClickHistory, UrlAnalytics};
use crate::cache::{CacheResult, UrlCache};
use crate::config::AppConfig;
use crate::errors::{Result, ShortenerError};
use crate::services::BackgroundTasks;
use crate::storage::{NewShortUrl, ShortUrl, StoreError, UrlStore};
use crate::utils::CodeGenerator;

/// 创建与解析策略参数
#[derive(Debug, Clone, Copy)]
pub struct ShortenerSettings {
    /// 随机短码的最大尝试次数
    pub max_generation_attempts: u32,
    /// 无过期时间的链接回写缓存时使用的 TTL
    pub default_cache_ttl: Duration,
}

impl Default for ShortenerSettings {
    fn default() -> Self {
        Self {
            max_generation_attempts: 3,
            default_cache_ttl: Duration::from_secs(24 * 60 * 60),
        }
    }
}

impl ShortenerSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            max_generation_attempts: config.shortener.max_generation_attempts.max(1),
            default_cache_ttl: config.cache.default_ttl(),
        }
    }
}

/// 解析结果，`hit` 表示是否由缓存直接命中
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedUrl {
    pub url: ShortUrl,
    pub hit: bool,
}

pub struct ShortenerService {
    urls: Arc<dyn UrlStore>,
    cache: Arc<dyn UrlCache>,
    analytics: Arc<dyn AnalyticsStore>,
    generator: Arc<dyn CodeGenerator>,
    background: Arc<BackgroundTasks>,
    settings: ShortenerSettings,
}

impl ShortenerService {
    pub fn new(
        urls: Arc<dyn UrlStore>,
        cache: Arc<dyn UrlCache>,
        analytics: Arc<dyn AnalyticsStore>,
        generator: Arc<dyn CodeGenerator>,
        background: Arc<BackgroundTasks>,
        settings: ShortenerSettings,
    ) -> Self {
        Self {
            urls,
            cache,
            analytics,
            generator,
            background,
            settings,
        }
    }

    /// 创建短链接
    ///
    /// 自定义别名只尝试一次，冲突即返回 `Conflict`；随机短码在 short_code
    /// 唯一约束冲突时重新生成，最多 `max_generation_attempts` 次。
    pub async fn shorten_url(
        &self,
        original_url: &str,
        custom_alias: Option<&str>,
        expiry_hours: Option<i64>,
    ) -> Result<ShortUrl> {
        let expires_at = expiry_from_hours(Utc::now(), expiry_hours)?;

        let created = match custom_alias.filter(|a| !a.is_empty()) {
            Some(alias) => self.create_with_alias(alias, original_url, expires_at).await?,
            None => self.create_with_generated_code(original_url, expires_at).await?,
        };

        info!(
            "ShortenerService: created '{}' -> '{}'",
            created.short_code, created.original_url
        );
        Ok(created)
    }

    async fn create_with_alias(
        &self,
        alias: &str,
        original_url: &str,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<ShortUrl> {
        let new_url = NewShortUrl::new(alias, original_url).with_expires_at(expires_at);

        match self.urls.create(new_url).await {
            Ok(url) => Ok(url),
            Err(e) if e.is_short_code_violation() => Err(ShortenerError::conflict(format!(
                "Alias '{}' is already in use",
                alias
            ))),
            Err(e) => Err(ShortenerError::store(format!(
                "Failed to save alias '{}': {}",
                alias, e
            ))),
        }
    }

    async fn create_with_generated_code(
        &self,
        original_url: &str,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<ShortUrl> {
        let max_attempts = self.settings.max_generation_attempts;

        for attempt in 1..=max_attempts {
            let code = self.generator.generate()?;
            let new_url = NewShortUrl::new(code, original_url).with_expires_at(expires_at);

            match self.urls.create(new_url).await {
                Ok(url) => return Ok(url),
                Err(e) if e.is_short_code_violation() => {
                    debug!(
                        "Generated code collided (attempt {}/{}): {}",
                        attempt, max_attempts, e
                    );
                }
                Err(e) => {
                    return Err(ShortenerError::store(format!(
                        "Failed to save short URL: {}",
                        e
                    )));
                }
            }
        }

        warn!(
            "Failed to generate a unique short code after {} attempts",
            max_attempts
        );
        Err(ShortenerError::generation_exhausted(format!(
            "Could not generate a unique short code after {} attempts",
            max_attempts
        )))
    }

    /// 解析短码：先查缓存，未命中再查存储并在后台回写缓存
    pub async fn get_original_url(&self, short_code: &str) -> Result<ResolvedUrl> {
        match self.cache.get(short_code).await {
            Ok(CacheResult::Found(url)) => {
                trace!("Cache hit for '{}'", short_code);
                return Ok(ResolvedUrl { url, hit: true });
            }
            Ok(CacheResult::Miss) => trace!("Cache miss for '{}'", short_code),
            Err(e) => warn!("Cache lookup failed for '{}', falling back to store: {}", short_code, e),
        }

        let url = self.resolve_from_store(short_code).await?;
        self.schedule_cache_write_back(&url);

        Ok(ResolvedUrl { url, hit: false })
    }

    fn schedule_cache_write_back(&self, url: &ShortUrl) {
        // 已在读取后过期的链接不回写
        let Some(ttl) = url.cache_ttl(Utc::now(), self.settings.default_cache_ttl) else {
            return;
        };

        let cache = self.cache.clone();
        let entry = url.clone();
        self.background.submit("cache_write_back", async move {
            if let Err(e) = cache.set(&entry, ttl).await {
                warn!("Cache write-back failed for '{}': {}", entry.short_code, e);
            }
        });
    }

    /// 后台记录一次点击，失败只记日志
    pub fn record_click(&self, event: ClickEvent) {
        let analytics = self.analytics.clone();
        self.background.submit("record_click", async move {
            let url_id = event.url_id;
            if let Err(e) = analytics.record_click(event).await {
                warn!("Failed to record click for url {}: {}", url_id, e);
            }
        });
    }

    pub async fn get_analytics(&self, short_code: &str, window_days: u32) -> Result<UrlAnalytics> {
        let url = self.resolve_from_store(short_code).await?;

        self.analytics
            .get_analytics(&url, window_days)
            .await
            .map_err(|e| {
                ShortenerError::analytics(format!(
                    "Failed to load analytics for '{}': {}",
                    short_code, e
                ))
            })
    }

    pub async fn get_click_history(
        &self,
        short_code: &str,
        page: u64,
        page_size: u64,
    ) -> Result<ClickHistory> {
        if page == 0 || page_size == 0 {
            return Err(ShortenerError::validation(
                "page and page_size must be greater than 0",
            ));
        }

        let url = self.resolve_from_store(short_code).await?;

        self.analytics
            .get_click_history(url.id, page, page_size)
            .await
            .map_err(|e| {
                ShortenerError::analytics(format!(
                    "Failed to load click history for '{}': {}",
                    short_code, e
                ))
            })
    }

    async fn resolve_from_store(&self, short_code: &str) -> Result<ShortUrl> {
        match self.urls.get_by_short_code(short_code).await {
            Ok(url) => Ok(url),
            Err(StoreError::NotFound) => Err(ShortenerError::not_found(format!(
                "Short URL '{}' not found",
                short_code
            ))),
            Err(e) => Err(ShortenerError::store(format!(
                "Failed to load '{}': {}",
                short_code, e
            ))),
        }
    }
}

/// `expiry_hours` 必须为正数
fn expiry_from_hours(
    now: DateTime<Utc>,
    expiry_hours: Option<i64>,
) -> Result<Option<DateTime<Utc>>> {
    let Some(hours) = expiry_hours else {
        return Ok(None);
    };
    if hours <= 0 {
        return Err(ShortenerError::validation(
            "expiry_hours must be greater than 0",
        ));
    }

    TimeDelta::try_hours(hours)
        .and_then(|delta| now.checked_add_signed(delta))
        .map(Some)
        .ok_or_else(|| ShortenerError::validation("expiry_hours is out of range"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expiry_from_hours() {
        let now = Utc::now();
        assert_eq!(expiry_from_hours(now, None).unwrap(), None);
        assert_eq!(
            expiry_from_hours(now, Some(2)).unwrap(),
            Some(now + TimeDelta::hours(2))
        );
    }

    #[test]
    fn test_expiry_rejects_non_positive_and_overflow() {
        let now = Utc::now();
        assert!(matches!(
            expiry_from_hours(now, Some(0)),
            Err(ShortenerError::Validation(_))
        ));
        assert!(matches!(
            expiry_from_hours(now, Some(-5)),
            Err(ShortenerError::Validation(_))
        ));
        assert!(matches!(
            expiry_from_hours(now, Some(i64::MAX)),
            Err(ShortenerError::Validation(_))
        ));
    }

    #[test]
    fn test_settings_default() {
        let settings = ShortenerSettings::default();
        assert_eq!(settings.max_generation_attempts, 3);
        assert_eq!(settings.default_cache_ttl, Duration::from_secs(86400));
    }
}
