use actix_web::http::StatusCode;
use actix_web::{HttpResponse, web};
use tracing::trace;

use crate::api::ApiSettings;
use crate::api::response::{error_from_shortener, success_response};
use crate::api::validation::{AnalyticsQuery, ClickHistoryQuery};
use crate::services::ShortenerService;

/// GET /api/analytics/{code}?days=N
pub async fn get_analytics(
    path: web::Path<String>,
    query: web::Query<AnalyticsQuery>,
    service: web::Data<ShortenerService>,
    settings: web::Data<ApiSettings>,
) -> HttpResponse {
    let code = path.into_inner();
    let days = query.window_days(&settings.analytics);
    trace!("Analytics request for '{}' over {} days", code, days);

    match service.get_analytics(&code, days).await {
        Ok(analytics) => success_response(
            StatusCode::OK,
            "Analytics retrieved successfully",
            analytics,
        ),
        Err(e) => error_from_shortener(&e),
    }
}

/// GET /api/analytics/{code}/clicks?page=&page_size=
pub async fn get_click_history(
    path: web::Path<String>,
    query: web::Query<ClickHistoryQuery>,
    service: web::Data<ShortenerService>,
    settings: web::Data<ApiSettings>,
) -> HttpResponse {
    let code = path.into_inner();
    let (page, page_size) = query.pagination(&settings.analytics);

    match service.get_click_history(&code, page, page_size).await {
        Ok(history) => success_response(
            StatusCode::OK,
            "Click history retrieved successfully",
            history,
        ),
        Err(e) => error_from_shortener(&e),
    }
}
