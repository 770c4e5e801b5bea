//! HTTP 接口集成测试（内存存储 + moka 缓存）

use std::time::Duration;

use actix_web::http::StatusCode;
use actix_web::test::{self, TestRequest};
use actix_web::{App, web};
use serde_json::{Value, json};

use tinylink::api::configure;
use tinylink::api::middleware::RequestIdMiddleware;
use tinylink::cache::CacheFactory;
use tinylink::config::AppConfig;
use tinylink::runtime::lifetime::startup::{StartupContext, assemble};
use tinylink::storage::StorageFactory;

const BASE_URL: &str = "https://sho.rt";

async fn context() -> StartupContext {
    let mut config = AppConfig::default();
    config.database.database_url = "memory://".to_string();
    config.server.base_url = Some(format!("{}/", BASE_URL));

    let storage = StorageFactory::create(&config.database).await.unwrap();
    let cache = CacheFactory::create(&config.cache).await.unwrap();
    assemble(&config, storage, cache)
}

macro_rules! init_app {
    ($ctx:expr) => {
        test::init_service(
            App::new()
                .wrap(RequestIdMiddleware)
                .app_data(web::Data::from($ctx.shortener.clone()))
                .app_data(web::Data::from($ctx.health.clone()))
                .app_data(web::Data::new($ctx.settings.clone()))
                .configure(configure),
        )
        .await
    };
}

macro_rules! shorten {
    ($app:expr, $body:expr) => {{
        let req = TestRequest::post()
            .uri("/api/shorten")
            .set_json($body)
            .to_request();
        let resp = test::call_service(&$app, req).await;
        let status = resp.status();
        let body: Value = test::read_body_json(resp).await;
        (status, body)
    }};
}

#[actix_web::test]
async fn test_shorten_returns_created_envelope() {
    let ctx = context().await;
    let app = init_app!(ctx);

    let (status, body) = shorten!(app, json!({"url": "https://example.com/page"}));

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "URL shortened successfully");

    let code = body["data"]["short_code"].as_str().unwrap();
    assert_eq!(code.len(), 7);
    assert_eq!(body["data"]["short_url"], format!("{}/{}", BASE_URL, code));
    assert_eq!(body["data"]["original_url"], "https://example.com/page");
    assert_eq!(body["data"]["expires_at"], Value::Null);
}

#[actix_web::test]
async fn test_shorten_with_alias_and_expiry() {
    let ctx = context().await;
    let app = init_app!(ctx);

    let (status, body) = shorten!(
        app,
        json!({"url": "https://example.com", "custom_alias": "my-link", "expiry_hours": 24})
    );

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["short_code"], "my-link");
    assert!(body["data"]["expires_at"].is_string());
}

#[actix_web::test]
async fn test_duplicate_alias_is_conflict() {
    let ctx = context().await;
    let app = init_app!(ctx);

    let payload = json!({"url": "https://example.com", "custom_alias": "taken1"});
    let (first, _) = shorten!(app, payload.clone());
    let (second, body) = shorten!(app, payload);

    assert_eq!(first, StatusCode::CREATED);
    assert_eq!(second, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("taken1"));
}

#[actix_web::test]
async fn test_validation_errors_are_listed() {
    let ctx = context().await;
    let app = init_app!(ctx);

    let (status, body) = shorten!(
        app,
        json!({"url": "ftp://example.com", "custom_alias": "api", "expiry_hours": -1})
    );

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Validation failed");
    let fields: Vec<&str> = body["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["url", "custom_alias", "expiry_hours"]);
}

#[actix_web::test]
async fn test_malformed_json_is_bad_request() {
    let ctx = context().await;
    let app = init_app!(ctx);

    let req = TestRequest::post()
        .uri("/api/shorten")
        .insert_header(("Content-Type", "application/json"))
        .set_payload("{not json")
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Invalid JSON format");
}

#[actix_web::test]
async fn test_redirect_miss_then_hit_and_click_recorded() {
    let ctx = context().await;
    let app = init_app!(ctx);

    let (_, body) = shorten!(app, json!({"url": "https://example.com/target"}));
    let code = body["data"]["short_code"].as_str().unwrap().to_string();

    let req = TestRequest::get()
        .uri(&format!("/{}", code))
        .insert_header(("User-Agent", "Mozilla/5.0 (iPad; CPU OS 17_0 like Mac OS X)"))
        .insert_header(("X-Forwarded-For", "198.51.100.7"))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::MOVED_PERMANENTLY);
    assert_eq!(resp.headers().get("Location").unwrap(), "https://example.com/target");
    assert_eq!(resp.headers().get("X-Cache-Hit").unwrap(), "false");
    assert!(resp.headers().get("x-request-id").is_some());

    // 回写与点击记录都在后台执行
    let mut hit = false;
    for _ in 0..50 {
        let resp = test::call_service(
            &app,
            TestRequest::get().uri(&format!("/{}", code)).to_request(),
        )
        .await;
        if resp.headers().get("X-Cache-Hit").unwrap() == "true" {
            hit = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(hit, "cache was never populated");

    assert!(ctx.background.shutdown(Duration::from_secs(2)).await);

    let resp = test::call_service(
        &app,
        TestRequest::get()
            .uri(&format!("/api/analytics/{}?days=7", code))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    let clicks = body["data"]["total_clicks"].as_i64().unwrap();
    assert!(clicks >= 2);
    assert_eq!(body["data"]["unique_ips"].as_i64().unwrap() >= 1, true);
    assert_eq!(body["data"]["device_stats"]["tablet"], 1);
}

#[actix_web::test]
async fn test_redirect_unknown_code_is_not_found() {
    let ctx = context().await;
    let app = init_app!(ctx);

    for uri in ["/nothere", "/bad.code"] {
        let resp = test::call_service(&app, TestRequest::get().uri(uri).to_request()).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND, "{uri}");
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "URL not found");
    }
}

#[actix_web::test]
async fn test_click_history_endpoint() {
    let ctx = context().await;
    let app = init_app!(ctx);

    let _ = shorten!(app, json!({"url": "https://example.com", "custom_alias": "hist01"}));
    for _ in 0..3 {
        test::call_service(&app, TestRequest::get().uri("/hist01").to_request()).await;
    }
    assert!(ctx.background.shutdown(Duration::from_secs(2)).await);

    let resp = test::call_service(
        &app,
        TestRequest::get()
            .uri("/api/analytics/hist01/clicks?page=1&page_size=2")
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["total"], 3);
    assert_eq!(body["data"]["total_pages"], 2);
    assert_eq!(body["data"]["clicks"].as_array().unwrap().len(), 2);

    // 非法参数回落到默认值
    let resp = test::call_service(
        &app,
        TestRequest::get()
            .uri("/api/analytics/hist01/clicks?page=0&page_size=1000")
            .to_request(),
    )
    .await;
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["page"], 1);
    assert_eq!(body["data"]["page_size"], 20);

    // 超大页码不会传到存储层
    let resp = test::call_service(
        &app,
        TestRequest::get()
            .uri("/api/analytics/hist01/clicks?page=18446744073709551615&page_size=100")
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["page"], 1);
    assert_eq!(body["data"]["clicks"].as_array().unwrap().len(), 3);
}

#[actix_web::test]
async fn test_analytics_unknown_code_is_not_found() {
    let ctx = context().await;
    let app = init_app!(ctx);

    for uri in ["/api/analytics/ghost01", "/api/analytics/ghost01/clicks"] {
        let resp = test::call_service(&app, TestRequest::get().uri(uri).to_request()).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND, "{uri}");
    }
}

#[actix_web::test]
async fn test_health_endpoints() {
    let ctx = context().await;
    let app = init_app!(ctx);

    let resp = test::call_service(&app, TestRequest::get().uri("/healthz").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "ok");

    let resp = test::call_service(&app, TestRequest::get().uri("/readyz").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], true);
    let names: Vec<&str> = body["data"]["checks"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["storage", "cache"]);
}
