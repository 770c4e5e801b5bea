use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, web};
use tracing::trace;

use crate::analytics::ClickEvent;
use crate::analytics::device::detect_device_type;
use crate::api::response::{error_from_shortener, error_response};
use crate::api::validation::is_valid_short_code;
use crate::errors::ShortenerError;
use crate::services::ShortenerService;
use crate::utils::client_ip;

pub const CACHE_HIT_HEADER: &str = "X-Cache-Hit";

/// GET /{code}
///
/// 301 到目标地址；点击在响应确定后提交到后台任务池记录。
pub async fn redirect(
    req: HttpRequest,
    path: web::Path<String>,
    service: web::Data<ShortenerService>,
) -> HttpResponse {
    let code = path.into_inner();

    if !is_valid_short_code(&code) {
        trace!("Invalid short code rejected: {}", code);
        return not_found_response();
    }

    let resolved = match service.get_original_url(&code).await {
        Ok(resolved) => resolved,
        Err(ShortenerError::NotFound(_)) => return not_found_response(),
        Err(e) => return error_from_shortener(&e),
    };

    let response = HttpResponse::build(StatusCode::MOVED_PERMANENTLY)
        .insert_header(("Location", resolved.url.original_url.as_str()))
        .insert_header((CACHE_HIT_HEADER, if resolved.hit { "true" } else { "false" }))
        .finish();

    service.record_click(click_event(&req, resolved.url.id));
    response
}

/// 从请求中提取点击信息
fn click_event(req: &HttpRequest, url_id: i64) -> ClickEvent {
    let header = |name: &str| {
        req.headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .filter(|v| !v.is_empty())
    };

    let user_agent = header("User-Agent");
    let device_type = detect_device_type(user_agent.as_deref().unwrap_or_default());

    ClickEvent {
        user_agent,
        referer: header("Referer"),
        ip_address: client_ip(req),
        device_type,
        ..ClickEvent::new(url_id)
    }
}

#[inline]
fn not_found_response() -> HttpResponse {
    error_response(StatusCode::NOT_FOUND, "URL not found")
}
