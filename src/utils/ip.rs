//! 客户端 IP 提取
//!
//! 优先级：X-Forwarded-For 第一个地址 > X-Real-IP > 连接对端地址（去掉端口）

use std::net::SocketAddr;

use actix_web::HttpRequest;

pub fn client_ip(req: &HttpRequest) -> Option<String> {
    let header = |name: &str| req.headers().get(name).and_then(|v| v.to_str().ok());
    resolve_client_ip(
        header("X-Forwarded-For"),
        header("X-Real-IP"),
        req.peer_addr(),
    )
}

pub fn resolve_client_ip(
    forwarded_for: Option<&str>,
    real_ip: Option<&str>,
    peer_addr: Option<SocketAddr>,
) -> Option<String> {
    if let Some(first) = forwarded_for
        .and_then(|xff| xff.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
    {
        return Some(first.to_string());
    }

    if let Some(ip) = real_ip.map(str::trim).filter(|ip| !ip.is_empty()) {
        return Some(ip.to_string());
    }

    peer_addr.map(|addr| addr.ip().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn peer() -> Option<SocketAddr> {
        Some("192.0.2.10:54321".parse().unwrap())
    }

    #[test]
    fn test_forwarded_for_wins() {
        assert_eq!(
            resolve_client_ip(Some("203.0.113.5, 10.0.0.1"), Some("10.0.0.2"), peer()),
            Some("203.0.113.5".to_string())
        );
    }

    #[test]
    fn test_real_ip_fallback() {
        assert_eq!(
            resolve_client_ip(Some("  "), Some("198.51.100.7"), peer()),
            Some("198.51.100.7".to_string())
        );
    }

    #[test]
    fn test_peer_addr_without_port() {
        assert_eq!(
            resolve_client_ip(None, None, peer()),
            Some("192.0.2.10".to_string())
        );
        let v6: SocketAddr = "[2001:db8::1]:443".parse().unwrap();
        assert_eq!(
            resolve_client_ip(None, None, Some(v6)),
            Some("2001:db8::1".to_string())
        );
        assert_eq!(resolve_client_ip(None, None, None), None);
    }

    #[actix_web::test]
    async fn test_client_ip_from_request() {
        let req = actix_web::test::TestRequest::default()
            .insert_header(("X-Real-IP", "198.51.100.9"))
            .to_http_request();
        assert_eq!(client_ip(&req), Some("198.51.100.9".to_string()));
    }
}
