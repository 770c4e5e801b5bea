//! 路由配置
//!
//! - GET/HEAD /healthz, /readyz
//! - POST /api/shorten
//! - GET /api/analytics/{code}, /api/analytics/{code}/clicks
//! - GET/HEAD /{code}（必须最后注册）

use actix_web::error::InternalError;
use actix_web::http::StatusCode;
use actix_web::web;

use super::response::error_response;
use super::services::{
    get_analytics, get_click_history, healthz, readyz, redirect, shorten,
};

/// 请求体上限
const MAX_JSON_BODY: usize = 64 * 1024;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .configure(health_routes)
        .service(api_routes())
        .service(redirect_routes());
}

fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(MAX_JSON_BODY)
        .error_handler(|err, _req| {
            let response = error_response(StatusCode::BAD_REQUEST, "Invalid JSON format");
            InternalError::from_response(err, response).into()
        })
}

pub fn health_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/healthz", web::get().to(healthz))
        .route("/healthz", web::head().to(healthz))
        .route("/readyz", web::get().to(readyz))
        .route("/readyz", web::head().to(readyz));
}

pub fn api_routes() -> actix_web::Scope {
    web::scope("/api")
        .route("/shorten", web::post().to(shorten))
        .route("/analytics/{code}/clicks", web::get().to(get_click_history))
        .route("/analytics/{code}", web::get().to(get_analytics))
}

pub fn redirect_routes() -> actix_web::Resource {
    web::resource("/{code}")
        .route(web::get().to(redirect))
        .route(web::head().to(redirect))
}
