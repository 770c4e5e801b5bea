use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

use crate::storage::ShortUrl;

/// 参与 Top-N 来源排名的条目数
pub const TOP_REFERRERS_LIMIT: usize = 5;

/// 空 Referer 的展示名
pub const DIRECT_REFERRER: &str = "Direct";

/// 按天直方图的日期格式
pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DeviceType {
    Mobile,
    Desktop,
    Tablet,
    Bot,
    #[default]
    Unknown,
}

impl DeviceType {
    /// 无法识别的字符串归为 Unknown
    pub fn parse_lossy(value: &str) -> Self {
        value.parse().unwrap_or_default()
    }
}

/// 一次重定向产生的点击观测
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClickEvent {
    pub url_id: i64,
    pub clicked_at: DateTime<Utc>,
    pub user_agent: Option<String>,
    pub referer: Option<String>,
    pub ip_address: Option<String>,
    pub device_type: DeviceType,
}

impl ClickEvent {
    pub fn new(url_id: i64) -> Self {
        Self {
            url_id,
            clicked_at: Utc::now(),
            user_agent: None,
            referer: None,
            ip_address: None,
            device_type: DeviceType::Unknown,
        }
    }
}

/// 点击日志中的一行
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlClick {
    pub id: i64,
    pub url_id: i64,
    pub clicked_at: DateTime<Utc>,
    pub user_agent: Option<String>,
    pub referer: Option<String>,
    pub ip_address: Option<String>,
    pub device_type: DeviceType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClicksByDate {
    pub date: String,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferrerStats {
    pub referer: String,
    pub count: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceStats {
    pub mobile: i64,
    pub desktop: i64,
    pub tablet: i64,
    pub bot: i64,
    pub unknown: i64,
}

impl DeviceStats {
    pub fn add(&mut self, device_type: DeviceType, count: i64) {
        match device_type {
            DeviceType::Mobile => self.mobile += count,
            DeviceType::Desktop => self.desktop += count,
            DeviceType::Tablet => self.tablet += count,
            DeviceType::Bot => self.bot += count,
            DeviceType::Unknown => self.unknown += count,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlAnalytics {
    pub short_code: String,
    pub original_url: String,
    pub total_clicks: i64,
    pub unique_ips: i64,
    pub last_clicked_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub clicks_by_date: Vec<ClicksByDate>,
    pub top_referrers: Vec<ReferrerStats>,
    pub device_stats: DeviceStats,
}

impl UrlAnalytics {
    /// 以链接本身的信息初始化，聚合字段为空
    pub fn for_url(url: &ShortUrl) -> Self {
        Self {
            short_code: url.short_code.clone(),
            original_url: url.original_url.clone(),
            total_clicks: url.click_count,
            unique_ips: 0,
            last_clicked_at: None,
            created_at: url.created_at,
            clicks_by_date: Vec::new(),
            top_referrers: Vec::new(),
            device_stats: DeviceStats::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClickHistory {
    pub clicks: Vec<UrlClick>,
    pub total: u64,
    pub page: u64,
    pub page_size: u64,
    pub total_pages: u64,
}

impl ClickHistory {
    pub fn new(clicks: Vec<UrlClick>, total: u64, page: u64, page_size: u64) -> Self {
        Self {
            clicks,
            total,
            page,
            page_size,
            total_pages: total_pages(total, page_size),
        }
    }
}

/// 向上取整的总页数
pub fn total_pages(total: u64, page_size: u64) -> u64 {
    if page_size == 0 {
        return 0;
    }
    total.div_ceil(page_size)
}

/// 统计窗口的起点
pub fn window_start(now: DateTime<Utc>, window_days: u32) -> DateTime<Utc> {
    now - Duration::days(i64::from(window_days))
}

/// 空 / 缺失的 Referer 记为 Direct
pub fn referrer_label(referer: Option<&str>) -> String {
    match referer.map(str::trim) {
        Some(r) if !r.is_empty() => r.to_string(),
        _ => DIRECT_REFERRER.to_string(),
    }
}

/// 按天聚合点击时间，日期倒序
pub fn bucket_by_date<I>(timestamps: I) -> Vec<ClicksByDate>
where
    I: IntoIterator<Item = DateTime<Utc>>,
{
    let mut buckets: BTreeMap<String, i64> = BTreeMap::new();
    for ts in timestamps {
        *buckets.entry(ts.format(DATE_FORMAT).to_string()).or_insert(0) += 1;
    }
    buckets
        .into_iter()
        .rev()
        .map(|(date, count)| ClicksByDate { date, count })
        .collect()
}

/// 来源排名：次数倒序，次数相同按名称升序，截取前 `limit` 个
pub fn rank_referrers(counts: HashMap<String, i64>, limit: usize) -> Vec<ReferrerStats> {
    let mut ranked: Vec<ReferrerStats> = counts
        .into_iter()
        .map(|(referer, count)| ReferrerStats { referer, count })
        .collect();
    ranked.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.referer.cmp(&b.referer)));
    ranked.truncate(limit);
    ranked
}
