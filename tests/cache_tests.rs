//! 缓存后端测试

use std::time::Duration;

use chrono::Utc;

use tinylink::cache::{CacheFactory, CacheResult, MokaUrlCache, NullUrlCache, RedisUrlCache, UrlCache};
use tinylink::config::{CacheConfig, RedisConfig};
use tinylink::errors::ShortenerError;
use tinylink::services::HealthProbe;
use tinylink::storage::ShortUrl;

fn sample(code: &str) -> ShortUrl {
    let now = Utc::now();
    ShortUrl {
        id: 17,
        short_code: code.to_string(),
        original_url: "https://example.com/landing?utm_source=test".to_string(),
        click_count: 42,
        created_at: now,
        updated_at: now,
        expires_at: Some(now + chrono::Duration::days(1)),
        is_active: true,
    }
}

#[tokio::test]
async fn test_moka_round_trip_preserves_all_fields() {
    let cache = MokaUrlCache::new(100);
    let url = sample("round01");

    cache.set(&url, Duration::from_secs(60)).await.unwrap();

    match cache.get("round01").await.unwrap() {
        CacheResult::Found(cached) => assert_eq!(cached, url),
        CacheResult::Miss => panic!("expected a cache hit"),
    }
}

#[tokio::test]
async fn test_moka_miss_for_unknown_key() {
    let cache = MokaUrlCache::new(100);
    assert_eq!(cache.get("absent1").await.unwrap(), CacheResult::Miss);
}

#[tokio::test]
async fn test_moka_entry_expires_after_ttl() {
    let cache = MokaUrlCache::new(100);
    cache
        .set(&sample("short01"), Duration::from_millis(50))
        .await
        .unwrap();
    cache
        .set(&sample("long001"), Duration::from_secs(60))
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(150)).await;

    assert_eq!(cache.get("short01").await.unwrap(), CacheResult::Miss);
    assert!(matches!(
        cache.get("long001").await.unwrap(),
        CacheResult::Found(_)
    ));
}

#[tokio::test]
async fn test_moka_overwrite_replaces_value() {
    let cache = MokaUrlCache::new(100);
    let mut url = sample("over001");
    cache.set(&url, Duration::from_secs(60)).await.unwrap();

    url.original_url = "https://example.com/v2".to_string();
    cache.set(&url, Duration::from_secs(60)).await.unwrap();

    match cache.get("over001").await.unwrap() {
        CacheResult::Found(cached) => assert_eq!(cached.original_url, "https://example.com/v2"),
        CacheResult::Miss => panic!("expected a cache hit"),
    }
}

#[tokio::test]
async fn test_null_cache_never_stores() {
    let cache = NullUrlCache;
    cache
        .set(&sample("null001"), Duration::from_secs(60))
        .await
        .unwrap();
    assert_eq!(cache.get("null001").await.unwrap(), CacheResult::Miss);
}

#[tokio::test]
async fn test_probes_report_cache_name() {
    assert_eq!(MokaUrlCache::new(10).name(), "cache");
    assert_eq!(NullUrlCache.name(), "cache");
    assert!(MokaUrlCache::new(10).ping().await.is_ok());
}

#[tokio::test]
async fn test_factory_memory_backend() {
    let handles = CacheFactory::create(&CacheConfig::default()).await.unwrap();
    let url = sample("fact001");
    handles.cache.set(&url, Duration::from_secs(5)).await.unwrap();
    assert_eq!(
        handles.cache.get("fact001").await.unwrap(),
        CacheResult::Found(url)
    );
}

#[tokio::test]
async fn test_redis_rejects_invalid_url() {
    let config = RedisConfig {
        url: "definitely not a redis url".to_string(),
        ..RedisConfig::default()
    };
    let err = RedisUrlCache::new(&config).await.err().unwrap();
    assert!(matches!(err, ShortenerError::CacheConnection(_)));
}
