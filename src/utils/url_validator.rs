//! Target URL validation

use url::Url;

/// 目标 URL 的最大长度
pub const MAX_URL_LENGTH: usize = 2048;

/// 直接拒绝的协议
const DANGEROUS_SCHEMES: &[&str] = &["javascript", "data", "file", "vbscript", "about", "blob"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UrlValidationError {
    Empty,
    TooLong(usize),
    DangerousScheme(String),
    UnsupportedScheme(String),
    MissingHost,
    Malformed(String),
}

impl std::fmt::Display for UrlValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "URL cannot be empty"),
            Self::TooLong(len) => write!(
                f,
                "URL is too long ({} characters, at most {} allowed)",
                len, MAX_URL_LENGTH
            ),
            Self::DangerousScheme(scheme) => write!(f, "URL scheme '{}' is not allowed", scheme),
            Self::UnsupportedScheme(scheme) => write!(
                f,
                "Unsupported URL scheme '{}', only http and https are allowed",
                scheme
            ),
            Self::MissingHost => write!(f, "URL must contain a host"),
            Self::Malformed(msg) => write!(f, "Invalid URL format: {}", msg),
        }
    }
}

impl std::error::Error for UrlValidationError {}

/// 校验目标 URL，返回去掉首尾空白后的原始字符串
pub fn validate_url(raw: &str) -> Result<&str, UrlValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(UrlValidationError::Empty);
    }
    if trimmed.len() > MAX_URL_LENGTH {
        return Err(UrlValidationError::TooLong(trimmed.len()));
    }

    // 先看协议前缀，`javascript:` 之类不一定能被完整解析
    if let Some((scheme, _)) = trimmed.split_once(':') {
        let scheme = scheme.to_ascii_lowercase();
        if DANGEROUS_SCHEMES.contains(&scheme.as_str()) {
            return Err(UrlValidationError::DangerousScheme(scheme));
        }
    }

    let parsed = Url::parse(trimmed).map_err(|e| UrlValidationError::Malformed(e.to_string()))?;
    match parsed.scheme() {
        "http" | "https" => {}
        other => return Err(UrlValidationError::UnsupportedScheme(other.to_string())),
    }
    if parsed.host_str().is_none_or(str::is_empty) {
        return Err(UrlValidationError::MissingHost);
    }

    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_urls() {
        assert_eq!(validate_url("https://example.com"), Ok("https://example.com"));
        assert!(validate_url("http://localhost:8080/a?b=c#d").is_ok());
        assert_eq!(
            validate_url("  https://example.com/path  "),
            Ok("https://example.com/path")
        );
    }

    #[test]
    fn test_dangerous_schemes() {
        assert!(matches!(
            validate_url("javascript:alert(1)"),
            Err(UrlValidationError::DangerousScheme(s)) if s == "javascript"
        ));
        assert!(matches!(
            validate_url("DATA:text/html,<b>x</b>"),
            Err(UrlValidationError::DangerousScheme(_))
        ));
    }

    #[test]
    fn test_unsupported_scheme() {
        assert!(matches!(
            validate_url("ftp://example.com/file"),
            Err(UrlValidationError::UnsupportedScheme(s)) if s == "ftp"
        ));
    }

    #[test]
    fn test_malformed_and_empty() {
        assert_eq!(validate_url("   "), Err(UrlValidationError::Empty));
        assert!(matches!(
            validate_url("not a url"),
            Err(UrlValidationError::Malformed(_))
        ));
    }

    #[test]
    fn test_too_long() {
        let long = format!("https://example.com/{}", "a".repeat(MAX_URL_LENGTH));
        assert!(matches!(validate_url(&long), Err(UrlValidationError::TooLong(_))));
    }
}
