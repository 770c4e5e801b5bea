//! 统一响应封装

use actix_web::HttpResponse;
use actix_web::http::StatusCode;
use serde::Serialize;
use tracing::error;

use crate::errors::ShortenerError;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// 单个字段的校验错误
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ValidationErrorResponse {
    pub success: bool,
    pub message: String,
    pub errors: Vec<FieldError>,
}

/// 构建成功响应
pub fn success_response<T: Serialize>(
    status: StatusCode,
    message: impl Into<String>,
    data: T,
) -> HttpResponse {
    HttpResponse::build(status).json(ApiResponse {
        success: true,
        message: Some(message.into()),
        data: Some(data),
        error: None,
    })
}

/// 构建错误响应
pub fn error_response(status: StatusCode, message: impl Into<String>) -> HttpResponse {
    HttpResponse::build(status).json(ApiResponse::<()> {
        success: false,
        message: None,
        data: None,
        error: Some(message.into()),
    })
}

pub fn validation_response(errors: Vec<FieldError>) -> HttpResponse {
    HttpResponse::BadRequest().json(ValidationErrorResponse {
        success: false,
        message: "Validation failed".to_string(),
        errors,
    })
}

/// 从 ShortenerError 构建错误响应，5xx 不向客户端暴露内部细节
pub fn error_from_shortener(err: &ShortenerError) -> HttpResponse {
    let status =
        StatusCode::from_u16(err.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    if status.is_server_error() {
        error!("[{}] {}", err.code(), err);
        let message = match err {
            ShortenerError::GenerationExhausted(_) => "Could not allocate a short code, please retry",
            _ => "Internal server error",
        };
        return error_response(status, message);
    }

    error_response(status, err.message())
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    async fn body_json(resp: HttpResponse) -> serde_json::Value {
        let bytes = to_bytes(resp.into_body()).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[actix_web::test]
    async fn test_success_envelope() {
        let resp = success_response(StatusCode::CREATED, "done", serde_json::json!({"a": 1}));
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body = body_json(resp).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["message"], "done");
        assert_eq!(body["data"]["a"], 1);
        assert!(body.get("error").is_none());
    }

    #[actix_web::test]
    async fn test_conflict_keeps_message() {
        let resp = error_from_shortener(&ShortenerError::conflict("Alias 'abcd' is already in use"));
        assert_eq!(resp.status(), StatusCode::CONFLICT);
        let body = body_json(resp).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["data"], serde_json::Value::Null);
        assert_eq!(body["error"], "Alias 'abcd' is already in use");
    }

    #[actix_web::test]
    async fn test_store_error_is_masked() {
        let resp = error_from_shortener(&ShortenerError::store("connection reset by peer"));
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(resp).await;
        assert_eq!(body["error"], "Internal server error");
    }

    #[actix_web::test]
    async fn test_validation_envelope() {
        let resp = validation_response(vec![FieldError::new("url", "url is required")]);
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body = body_json(resp).await;
        assert_eq!(body["message"], "Validation failed");
        assert_eq!(body["errors"][0]["field"], "url");
    }
}
