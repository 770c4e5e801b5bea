//! 点击统计查询
//!
//! 日期分桶与来源合并在内存中完成，避免依赖各数据库方言的日期函数。
//! 所有读取与 `find_resolvable` 一样对瞬时错误做退避重试。

use std::collections::HashMap;
use std::future::Future;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{
    ColumnTrait, DbErr, EntityTrait, FromQueryResult, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect,
};

use super::converters::model_to_url_click;
use super::{SeaOrmStorage, retry};
use crate::analytics::{
    AnalyticsStore, ClickEvent, ClickHistory, DeviceStats, DeviceType, TOP_REFERRERS_LIMIT,
    UrlAnalytics, bucket_by_date, rank_referrers, referrer_label, window_start,
};
use crate::storage::{ShortUrl, StoreResult};

use migration::entities::url_click;

/// 来源查询结果行
#[derive(Debug, FromQueryResult)]
struct ReferrerRow {
    referer: Option<String>,
    count: i64,
}

/// 设备类型查询结果行
#[derive(Debug, FromQueryResult)]
struct DeviceRow {
    device_type: Option<String>,
    count: i64,
}

impl SeaOrmStorage {
    /// 只读查询，瞬时错误按 retry_config 退避重试
    async fn read_with_retry<T, F, Fut>(&self, operation: &str, query: F) -> StoreResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, DbErr>>,
    {
        retry::with_retry(operation, self.retry_config, query)
            .await
            .map_err(retry::classify_db_error)
    }

    async fn count_unique_ips(&self, url_id: i64) -> StoreResult<i64> {
        let db = &self.db;
        let count = self
            .read_with_retry("count_unique_ips", || async {
                url_click::Entity::find()
                    .select_only()
                    .column(url_click::Column::IpAddress)
                    .distinct()
                    .filter(url_click::Column::UrlId.eq(url_id))
                    .filter(url_click::Column::IpAddress.is_not_null())
                    .filter(url_click::Column::IpAddress.ne(""))
                    .count(db)
                    .await
            })
            .await?;
        Ok(count as i64)
    }

    async fn last_clicked_at(&self, url_id: i64) -> StoreResult<Option<DateTime<Utc>>> {
        let db = &self.db;
        let latest = self
            .read_with_retry("last_clicked_at", || async {
                url_click::Entity::find()
                    .filter(url_click::Column::UrlId.eq(url_id))
                    .order_by_desc(url_click::Column::ClickedAt)
                    .one(db)
                    .await
            })
            .await?;
        Ok(latest.map(|c| c.clicked_at))
    }

    async fn click_times_since(
        &self,
        url_id: i64,
        since: DateTime<Utc>,
    ) -> StoreResult<Vec<DateTime<Utc>>> {
        let db = &self.db;
        self.read_with_retry("click_times_since", || async {
            url_click::Entity::find()
                .select_only()
                .column(url_click::Column::ClickedAt)
                .filter(url_click::Column::UrlId.eq(url_id))
                .filter(url_click::Column::ClickedAt.gte(since))
                .into_tuple::<DateTime<Utc>>()
                .all(db)
                .await
        })
        .await
    }

    async fn referrer_counts(&self, url_id: i64) -> StoreResult<HashMap<String, i64>> {
        let db = &self.db;
        let rows = self
            .read_with_retry("referrer_counts", || async {
                url_click::Entity::find()
                    .select_only()
                    .column(url_click::Column::Referer)
                    .column_as(url_click::Column::Id.count(), "count")
                    .filter(url_click::Column::UrlId.eq(url_id))
                    .group_by(url_click::Column::Referer)
                    .into_model::<ReferrerRow>()
                    .all(db)
                    .await
            })
            .await?;

        // NULL 与空串都归入 Direct
        let mut counts = HashMap::new();
        for row in rows {
            *counts.entry(referrer_label(row.referer.as_deref())).or_insert(0) += row.count;
        }
        Ok(counts)
    }

    async fn device_stats(&self, url_id: i64) -> StoreResult<DeviceStats> {
        let db = &self.db;
        let rows = self
            .read_with_retry("device_stats", || async {
                url_click::Entity::find()
                    .select_only()
                    .column(url_click::Column::DeviceType)
                    .column_as(url_click::Column::Id.count(), "count")
                    .filter(url_click::Column::UrlId.eq(url_id))
                    .group_by(url_click::Column::DeviceType)
                    .into_model::<DeviceRow>()
                    .all(db)
                    .await
            })
            .await?;

        let mut stats = DeviceStats::default();
        for row in rows {
            let device = row
                .device_type
                .as_deref()
                .map(DeviceType::parse_lossy)
                .unwrap_or_default();
            stats.add(device, row.count);
        }
        Ok(stats)
    }
}

#[async_trait]
impl AnalyticsStore for SeaOrmStorage {
    async fn record_click(&self, event: ClickEvent) -> StoreResult<()> {
        self.insert_click(&event).await
    }

    async fn get_analytics(&self, url: &ShortUrl, window_days: u32) -> StoreResult<UrlAnalytics> {
        let mut analytics = UrlAnalytics::for_url(url);

        analytics.unique_ips = self.count_unique_ips(url.id).await?;
        analytics.last_clicked_at = self.last_clicked_at(url.id).await?;

        let since = window_start(Utc::now(), window_days);
        analytics.clicks_by_date = bucket_by_date(self.click_times_since(url.id, since).await?);

        analytics.top_referrers =
            rank_referrers(self.referrer_counts(url.id).await?, TOP_REFERRERS_LIMIT);
        analytics.device_stats = self.device_stats(url.id).await?;

        Ok(analytics)
    }

    async fn get_click_history(
        &self,
        url_id: i64,
        page: u64,
        page_size: u64,
    ) -> StoreResult<ClickHistory> {
        let db = &self.db;
        let base = || url_click::Entity::find().filter(url_click::Column::UrlId.eq(url_id));

        let total = self
            .read_with_retry("click_history_count", || async { base().count(db).await })
            .await?;

        // 驱动按 i64 绑定 offset
        let offset = page
            .saturating_sub(1)
            .saturating_mul(page_size)
            .min(i64::MAX as u64);
        let clicks = self
            .read_with_retry("click_history_page", || async {
                base()
                    .order_by_desc(url_click::Column::ClickedAt)
                    .order_by_desc(url_click::Column::Id)
                    .offset(offset)
                    .limit(page_size)
                    .all(db)
                    .await
            })
            .await?
            .into_iter()
            .map(model_to_url_click)
            .collect();

        Ok(ClickHistory::new(clicks, total, page, page_size))
    }
}
