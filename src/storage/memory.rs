//! In-process storage backend
//!
//! Mirrors the semantics of the SQL backend (unique short codes, active /
//! expiry filtering, click log aggregation) on top of `DashMap`.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::debug;

use super::{NewShortUrl, ShortUrl, StoreError, StoreResult, UrlStore};
use crate::analytics::{
    AnalyticsStore, ClickEvent, ClickHistory, DeviceStats, TOP_REFERRERS_LIMIT, UrlAnalytics,
    UrlClick, bucket_by_date, rank_referrers, referrer_label, window_start,
};
use crate::errors::Result;
use crate::services::HealthProbe;

pub struct InMemoryStore {
    by_code: DashMap<String, ShortUrl>,
    /// id -> short_code
    by_id: DashMap<i64, String>,
    clicks: DashMap<i64, Vec<UrlClick>>,
    next_url_id: AtomicI64,
    next_click_id: AtomicI64,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            by_code: DashMap::new(),
            by_id: DashMap::new(),
            clicks: DashMap::new(),
            next_url_id: AtomicI64::new(1),
            next_click_id: AtomicI64::new(1),
        }
    }

    /// 不做过滤的原始读取，包括已停用和已过期的记录
    pub fn get_raw(&self, short_code: &str) -> Option<ShortUrl> {
        self.by_code.get(short_code).map(|r| r.value().clone())
    }

    /// 停用一条映射，之后按短码解析返回 NotFound，但短码仍被占用
    pub fn deactivate(&self, short_code: &str) -> bool {
        match self.by_code.get_mut(short_code) {
            Some(mut url) => {
                url.is_active = false;
                url.updated_at = Utc::now();
                true
            }
            None => false,
        }
    }

    fn clicks_for(&self, url_id: i64) -> Vec<UrlClick> {
        self.clicks
            .get(&url_id)
            .map(|c| c.value().clone())
            .unwrap_or_default()
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UrlStore for InMemoryStore {
    async fn create(&self, new_url: NewShortUrl) -> StoreResult<ShortUrl> {
        match self.by_code.entry(new_url.short_code.clone()) {
            Entry::Occupied(_) => Err(StoreError::unique_violation(
                migration::SHORT_CODE_UNIQUE_INDEX,
            )),
            Entry::Vacant(slot) => {
                let now = Utc::now();
                let url = ShortUrl {
                    id: self.next_url_id.fetch_add(1, Ordering::Relaxed),
                    short_code: new_url.short_code,
                    original_url: new_url.original_url,
                    click_count: 0,
                    created_at: now,
                    updated_at: now,
                    expires_at: new_url.expires_at,
                    is_active: new_url.is_active,
                };
                self.by_id.insert(url.id, url.short_code.clone());
                slot.insert(url.clone());
                debug!("InMemoryStore: created {} (id {})", url.short_code, url.id);
                Ok(url)
            }
        }
    }

    async fn get_by_short_code(&self, short_code: &str) -> StoreResult<ShortUrl> {
        let now = Utc::now();
        self.by_code
            .get(short_code)
            .map(|r| r.value().clone())
            .filter(|url| url.is_resolvable_at(now))
            .ok_or(StoreError::NotFound)
    }
}

#[async_trait]
impl AnalyticsStore for InMemoryStore {
    async fn record_click(&self, event: ClickEvent) -> StoreResult<()> {
        let code = self
            .by_id
            .get(&event.url_id)
            .map(|r| r.value().clone())
            .ok_or(StoreError::NotFound)?;

        if let Some(mut url) = self.by_code.get_mut(&code) {
            url.click_count += 1;
            url.updated_at = Utc::now();
        }

        let click = UrlClick {
            id: self.next_click_id.fetch_add(1, Ordering::Relaxed),
            url_id: event.url_id,
            clicked_at: event.clicked_at,
            user_agent: event.user_agent,
            referer: event.referer,
            ip_address: event.ip_address,
            device_type: event.device_type,
        };
        self.clicks.entry(event.url_id).or_default().push(click);
        Ok(())
    }

    async fn get_analytics(&self, url: &ShortUrl, window_days: u32) -> StoreResult<UrlAnalytics> {
        let clicks = self.clicks_for(url.id);
        let mut analytics = UrlAnalytics::for_url(url);

        // click_count 以存储中的最新值为准
        let code = self.by_id.get(&url.id).map(|c| c.value().clone());
        if let Some(current) = code.and_then(|c| self.get_raw(&c)) {
            analytics.total_clicks = current.click_count;
        }

        let unique_ips: HashSet<&str> = clicks
            .iter()
            .filter_map(|c| c.ip_address.as_deref())
            .filter(|ip| !ip.is_empty())
            .collect();
        analytics.unique_ips = unique_ips.len() as i64;
        analytics.last_clicked_at = clicks.iter().map(|c| c.clicked_at).max();

        let since = window_start(Utc::now(), window_days);
        analytics.clicks_by_date = bucket_by_date(
            clicks
                .iter()
                .map(|c| c.clicked_at)
                .filter(|ts| *ts >= since),
        );

        let mut referrers: HashMap<String, i64> = HashMap::new();
        let mut devices = DeviceStats::default();
        for click in &clicks {
            *referrers
                .entry(referrer_label(click.referer.as_deref()))
                .or_insert(0) += 1;
            devices.add(click.device_type, 1);
        }
        analytics.top_referrers = rank_referrers(referrers, TOP_REFERRERS_LIMIT);
        analytics.device_stats = devices;

        Ok(analytics)
    }

    async fn get_click_history(
        &self,
        url_id: i64,
        page: u64,
        page_size: u64,
    ) -> StoreResult<ClickHistory> {
        let mut clicks = self.clicks_for(url_id);
        clicks.sort_by(|a, b| b.clicked_at.cmp(&a.clicked_at).then(b.id.cmp(&a.id)));

        let total = clicks.len() as u64;
        let offset = page.saturating_sub(1).saturating_mul(page_size) as usize;
        let page_clicks: Vec<UrlClick> = clicks
            .into_iter()
            .skip(offset)
            .take(page_size as usize)
            .collect();

        Ok(ClickHistory::new(page_clicks, total, page, page_size))
    }
}

#[async_trait]
impl HealthProbe for InMemoryStore {
    fn name(&self) -> &'static str {
        "storage"
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}
