use actix_web::http::StatusCode;
use actix_web::{HttpResponse, web};
use chrono::Utc;
use serde_json::json;
use tracing::{trace, warn};

use crate::api::response::ApiResponse;
use crate::services::HealthService;

/// 存活检查，不访问任何依赖
pub async fn healthz() -> HttpResponse {
    trace!("Received liveness check request");

    HttpResponse::Ok().json(json!({
        "status": "ok",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

/// 就绪检查：存储与缓存均可用时 200，否则 503
pub async fn readyz(health: web::Data<HealthService>) -> HttpResponse {
    let report = health.check().await;
    let healthy = report.is_healthy();

    if !healthy {
        warn!("Readiness check failed: {:?}", report.checks);
    }

    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    HttpResponse::build(status).json(ApiResponse {
        success: healthy,
        message: Some(if healthy { "OK" } else { "Service Unavailable" }.to_string()),
        data: Some(report),
        error: None,
    })
}
