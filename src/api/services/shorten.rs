use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, web};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::api::ApiSettings;
use crate::api::response::{error_from_shortener, success_response, validation_response};
use crate::api::validation::{ShortenRequest, validate_shorten_request};
use crate::services::ShortenerService;

#[derive(Debug, Serialize)]
pub struct ShortenResponse {
    pub short_url: String,
    pub short_code: String,
    pub original_url: String,
    pub expires_at: Option<DateTime<Utc>>,
}

/// POST /api/shorten
pub async fn shorten(
    req: HttpRequest,
    body: web::Json<ShortenRequest>,
    service: web::Data<ShortenerService>,
    settings: web::Data<ApiSettings>,
) -> HttpResponse {
    let request = match validate_shorten_request(&body) {
        Ok(request) => request,
        Err(errors) => {
            debug!("Rejected shorten request: {} field error(s)", errors.len());
            return validation_response(errors);
        }
    };

    let created = match service
        .shorten_url(
            &request.url,
            request.custom_alias.as_deref(),
            request.expiry_hours,
        )
        .await
    {
        Ok(created) => created,
        Err(e) => return error_from_shortener(&e),
    };

    let base_url = public_base_url(&req, &settings);
    success_response(
        StatusCode::CREATED,
        "URL shortened successfully",
        ShortenResponse {
            short_url: format!("{}/{}", base_url, created.short_code),
            short_code: created.short_code,
            original_url: created.original_url,
            expires_at: created.expires_at,
        },
    )
}

/// 配置的 base_url 优先，否则用请求的 scheme://host（会识别 X-Forwarded-Proto / Host）
fn public_base_url(req: &HttpRequest, settings: &ApiSettings) -> String {
    if let Some(base) = &settings.base_url {
        return base.clone();
    }
    let info = req.connection_info();
    format!("{}://{}", info.scheme(), info.host())
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn test_base_url_prefers_config() {
        let req = TestRequest::default()
            .insert_header(("Host", "ignored.example"))
            .to_http_request();
        let settings = ApiSettings {
            base_url: Some("https://sho.rt".to_string()),
            ..ApiSettings::default()
        };
        assert_eq!(public_base_url(&req, &settings), "https://sho.rt");
    }

    #[test]
    fn test_base_url_from_request() {
        let req = TestRequest::default()
            .insert_header(("Host", "links.example:8080"))
            .insert_header(("X-Forwarded-Proto", "https"))
            .to_http_request();
        assert_eq!(
            public_base_url(&req, &ApiSettings::default()),
            "https://links.example:8080"
        );
    }
}
