pub mod device;
pub mod models;

pub use device::detect_device_type;
pub use models::*;

use async_trait::async_trait;

use crate::storage::{ShortUrl, StoreResult};

/// 点击日志的追加写入与聚合查询
#[async_trait]
pub trait AnalyticsStore: Send + Sync {
    /// 追加一条点击记录，并累加对应链接的 click_count
    async fn record_click(&self, event: ClickEvent) -> StoreResult<()>;

    /// 汇总统计；按天直方图只覆盖最近 `window_days` 天
    async fn get_analytics(&self, url: &ShortUrl, window_days: u32) -> StoreResult<UrlAnalytics>;

    /// 分页的原始点击日志，按时间倒序，`page` 从 1 开始
    async fn get_click_history(
        &self,
        url_id: i64,
        page: u64,
        page_size: u64,
    ) -> StoreResult<ClickHistory>;
}
