//! Request ID / 访问日志中间件
//!
//! 为每个请求生成 UUID，注入 tracing span 并写回 `X-Request-ID`；
//! 请求开始和结束各记一条日志，4xx 升为 warn，5xx 升为 error。

use std::rc::Rc;
use std::time::Instant;

use actix_service::{Service, Transform};
use actix_web::{
    Error, HttpMessage,
    dev::{ServiceRequest, ServiceResponse},
    http::StatusCode,
    http::header::{HeaderName, HeaderValue},
};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use tracing::{Instrument, error, info, info_span, warn};
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// 请求 ID，可从 request extensions 中提取
#[derive(Clone, Debug)]
pub struct RequestId(pub String);

#[derive(Clone, Default)]
pub struct RequestIdMiddleware;

impl<S, B> Transform<S, ServiceRequest> for RequestIdMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = RequestIdService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequestIdService {
            service: Rc::new(service),
        }))
    }
}

pub struct RequestIdService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for RequestIdService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &self,
        ctx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let srv = self.service.clone();
        let start = Instant::now();

        let request_id = Uuid::new_v4().to_string();
        req.extensions_mut().insert(RequestId(request_id.clone()));

        let method = req.method().to_string();
        let path = match req.query_string() {
            "" => req.path().to_string(),
            query => format!("{}?{}", req.path(), query),
        };

        let span = info_span!(
            "request",
            request_id = %request_id,
            method = %method,
            path = %req.path(),
        );

        Box::pin(
            async move {
                info!(method = %method, path = %path, "HTTP request started");

                let mut response = match srv.call(req).await {
                    Ok(response) => response,
                    Err(e) => {
                        error!(
                            method = %method,
                            path = %path,
                            duration_ms = start.elapsed().as_millis() as u64,
                            "HTTP request failed: {}", e
                        );
                        return Err(e);
                    }
                };

                if let Ok(value) = HeaderValue::from_str(&request_id) {
                    response
                        .headers_mut()
                        .insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
                }

                log_completion(&method, &path, response.status(), start);
                Ok(response)
            }
            .instrument(span),
        )
    }
}

fn log_completion(method: &str, path: &str, status: StatusCode, start: Instant) {
    let duration_ms = start.elapsed().as_millis() as u64;
    let status = status.as_u16();

    if status >= 500 {
        error!(method, path, status, duration_ms, "HTTP request completed");
    } else if status >= 400 {
        warn!(method, path, status, duration_ms, "HTTP request completed");
    } else {
        info!(method, path, status, duration_ms, "HTTP request completed");
    }
}
