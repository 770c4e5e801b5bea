use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 短码到目标 URL 的映射
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortUrl {
    pub id: i64,
    pub short_code: String,
    pub original_url: String,
    pub click_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub is_active: bool,
}

impl ShortUrl {
    /// 启用且未过期
    pub fn is_resolvable_at(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.expires_at.is_none_or(|exp| exp > now)
    }

    /// 回写缓存时的 TTL：有过期时间则取剩余时长，否则取默认值。
    ///
    /// 已经过期（剩余时长非正）时返回 `None`，不应再写入缓存。
    pub fn cache_ttl(&self, now: DateTime<Utc>, default_ttl: Duration) -> Option<Duration> {
        match self.expires_at {
            None => Some(default_ttl),
            Some(exp) => (exp - now).to_std().ok().filter(|d| !d.is_zero()),
        }
    }
}

/// 待插入的新映射，id 与时间戳由存储层分配
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewShortUrl {
    pub short_code: String,
    pub original_url: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub is_active: bool,
}

impl NewShortUrl {
    pub fn new(short_code: impl Into<String>, original_url: impl Into<String>) -> Self {
        Self {
            short_code: short_code.into(),
            original_url: original_url.into(),
            expires_at: None,
            is_active: true,
        }
    }

    pub fn with_expires_at(mut self, expires_at: Option<DateTime<Utc>>) -> Self {
        self.expires_at = expires_at;
        self
    }
}
