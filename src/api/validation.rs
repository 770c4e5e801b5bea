//! 请求参数校验

use serde::Deserialize;

use crate::api::response::FieldError;
use crate::config::AnalyticsConfig;
use crate::utils::validate_url;

pub const MIN_ALIAS_LENGTH: usize = 4;
pub const MAX_ALIAS_LENGTH: usize = 20;

/// 与顶层路由冲突的别名（大小写不敏感）
pub const RESERVED_ALIASES: &[&str] = &["api", "healthz", "readyz"];

/// 点击历史的最大页码，offset = (page - 1) * page_size 必须落在 i64 范围内
pub const MAX_PAGE: u64 = 100_000;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ShortenRequest {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub custom_alias: Option<String>,
    #[serde(default)]
    pub expiry_hours: Option<i64>,
}

/// 校验通过的创建请求
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidShortenRequest {
    pub url: String,
    pub custom_alias: Option<String>,
    pub expiry_hours: Option<i64>,
}

/// 收集所有字段错误后一起返回
pub fn validate_shorten_request(
    req: &ShortenRequest,
) -> Result<ValidShortenRequest, Vec<FieldError>> {
    let mut errors = Vec::new();

    let url = if req.url.trim().is_empty() {
        errors.push(FieldError::new("url", "url is required"));
        None
    } else {
        match validate_url(&req.url) {
            Ok(url) => Some(url.to_string()),
            Err(e) => {
                errors.push(FieldError::new("url", e.to_string()));
                None
            }
        }
    };

    // 空字符串等同于未提供
    let custom_alias = req
        .custom_alias
        .as_deref()
        .map(str::trim)
        .filter(|a| !a.is_empty());
    if let Some(alias) = custom_alias
        && let Err(message) = check_alias(alias)
    {
        errors.push(FieldError::new("custom_alias", message));
    }

    if let Some(hours) = req.expiry_hours
        && hours <= 0
    {
        errors.push(FieldError::new(
            "expiry_hours",
            "expiry_hours must be greater than 0",
        ));
    }

    match url {
        Some(url) if errors.is_empty() => Ok(ValidShortenRequest {
            url,
            custom_alias: custom_alias.map(str::to_string),
            expiry_hours: req.expiry_hours,
        }),
        _ => Err(errors),
    }
}

fn check_alias(alias: &str) -> Result<(), String> {
    let len = alias.chars().count();
    if len < MIN_ALIAS_LENGTH {
        return Err(format!(
            "custom_alias must be at least {} characters",
            MIN_ALIAS_LENGTH
        ));
    }
    if len > MAX_ALIAS_LENGTH {
        return Err(format!(
            "custom_alias must be at most {} characters",
            MAX_ALIAS_LENGTH
        ));
    }
    if !has_code_charset(alias) {
        return Err(
            "custom_alias may only contain letters, digits, '_' and '-'".to_string(),
        );
    }
    if is_reserved_alias(alias) {
        return Err("This alias cannot be used".to_string());
    }
    Ok(())
}

fn has_code_charset(code: &str) -> bool {
    code.bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
}

pub fn is_reserved_alias(alias: &str) -> bool {
    RESERVED_ALIASES
        .iter()
        .any(|reserved| reserved.eq_ignore_ascii_case(alias))
}

/// 重定向路径上的短码格式检查，不合法的直接 404，不查缓存和存储
pub fn is_valid_short_code(code: &str) -> bool {
    (1..=MAX_ALIAS_LENGTH).contains(&code.len()) && has_code_charset(code)
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnalyticsQuery {
    pub days: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClickHistoryQuery {
    pub page: Option<String>,
    pub page_size: Option<String>,
}

/// 解析范围内的整数参数，缺失、非法或越界时使用默认值
fn parse_bounded<T>(raw: Option<&str>, min: T, max: T, default: T) -> T
where
    T: std::str::FromStr + PartialOrd + Copy,
{
    raw.and_then(|v| v.trim().parse::<T>().ok())
        .filter(|v| *v >= min && *v <= max)
        .unwrap_or(default)
}

impl AnalyticsQuery {
    pub fn window_days(&self, config: &AnalyticsConfig) -> u32 {
        parse_bounded(
            self.days.as_deref(),
            1,
            config.max_window_days,
            config.default_window_days,
        )
    }
}

impl ClickHistoryQuery {
    /// 返回 (page, page_size)
    pub fn pagination(&self, config: &AnalyticsConfig) -> (u64, u64) {
        let page = parse_bounded(self.page.as_deref(), 1, MAX_PAGE, 1);
        let page_size = parse_bounded(
            self.page_size.as_deref(),
            1,
            config.max_page_size,
            config.default_page_size,
        );
        (page, page_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(url: &str, alias: Option<&str>, hours: Option<i64>) -> ShortenRequest {
        ShortenRequest {
            url: url.to_string(),
            custom_alias: alias.map(str::to_string),
            expiry_hours: hours,
        }
    }

    #[test]
    fn test_valid_request() {
        let valid =
            validate_shorten_request(&request("  https://example.com/a ", Some("my-link"), Some(2)))
                .unwrap();
        assert_eq!(valid.url, "https://example.com/a");
        assert_eq!(valid.custom_alias.as_deref(), Some("my-link"));
        assert_eq!(valid.expiry_hours, Some(2));
    }

    #[test]
    fn test_empty_alias_is_ignored() {
        let valid = validate_shorten_request(&request("https://example.com", Some(""), None)).unwrap();
        assert_eq!(valid.custom_alias, None);
    }

    #[test]
    fn test_missing_url() {
        let errors = validate_shorten_request(&request("", None, None)).unwrap_err();
        assert_eq!(errors, vec![FieldError::new("url", "url is required")]);
    }

    #[test]
    fn test_collects_every_field_error() {
        let errors =
            validate_shorten_request(&request("javascript:alert(1)", Some("a b"), Some(0)))
                .unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["url", "custom_alias", "expiry_hours"]);
    }

    #[test]
    fn test_alias_rules() {
        assert!(check_alias("abcd").is_ok());
        assert!(check_alias("A_b-9").is_ok());
        assert!(check_alias("abc").is_err());
        assert!(check_alias(&"x".repeat(21)).is_err());
        assert!(check_alias("has/slash").is_err());
        assert!(check_alias("HealthZ").is_err());
        assert!(check_alias("readyz").is_err());
    }

    #[test]
    fn test_reserved_alias_is_case_insensitive() {
        assert!(is_reserved_alias("API"));
        assert!(!is_reserved_alias("apis"));
    }

    #[test]
    fn test_short_code_format() {
        assert!(is_valid_short_code("aB3dE9x"));
        assert!(!is_valid_short_code(""));
        assert!(!is_valid_short_code("favicon.ico"));
        assert!(!is_valid_short_code(&"a".repeat(21)));
    }

    #[test]
    fn test_window_days() {
        let config = AnalyticsConfig::default();
        let q = |days: Option<&str>| AnalyticsQuery {
            days: days.map(str::to_string),
        };
        assert_eq!(q(None).window_days(&config), 30);
        assert_eq!(q(Some("7")).window_days(&config), 7);
        assert_eq!(q(Some("365")).window_days(&config), 365);
        assert_eq!(q(Some("0")).window_days(&config), 30);
        assert_eq!(q(Some("366")).window_days(&config), 30);
        assert_eq!(q(Some("abc")).window_days(&config), 30);
    }

    #[test]
    fn test_pagination() {
        let config = AnalyticsConfig::default();
        let q = |page: Option<&str>, size: Option<&str>| ClickHistoryQuery {
            page: page.map(str::to_string),
            page_size: size.map(str::to_string),
        };
        assert_eq!(q(None, None).pagination(&config), (1, 20));
        assert_eq!(q(Some("3"), Some("50")).pagination(&config), (3, 50));
        assert_eq!(q(Some("0"), Some("101")).pagination(&config), (1, 20));
        assert_eq!(q(Some("-2"), Some("x")).pagination(&config), (1, 20));
        assert_eq!(q(Some("100000"), None).pagination(&config), (MAX_PAGE, 20));
        assert_eq!(q(Some("100001"), None).pagination(&config), (1, 20));
        assert_eq!(q(Some("18446744073709551615"), None).pagination(&config), (1, 20));
    }
}
