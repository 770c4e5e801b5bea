//! HTTP 接口层
//!
//! 处理函数只做参数解析、校验和响应封装，业务逻辑在 `ShortenerService` 中。

pub mod middleware;
pub mod response;
pub mod routes;
pub mod services;
pub mod validation;

pub use routes::configure;

use crate::config::{AnalyticsConfig, AppConfig};

/// 处理函数共享的只读设置
#[derive(Debug, Clone, Default)]
pub struct ApiSettings {
    /// 对外短链接前缀；为空时从请求的 scheme/host 推导
    pub base_url: Option<String>,
    pub analytics: AnalyticsConfig,
}

impl ApiSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            base_url: config
                .server
                .base_url
                .as_deref()
                .map(|u| u.trim().trim_end_matches('/').to_string())
                .filter(|u| !u.is_empty()),
            analytics: config.analytics.clone(),
        }
    }
}
