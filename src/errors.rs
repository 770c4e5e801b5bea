use std::fmt;

#[derive(Debug, Clone)]
pub enum ShortenerError {
    /// 自定义别名已被占用
    Conflict(String),
    /// 随机短码在重试上限内始终冲突
    GenerationExhausted(String),
    /// 短码不存在、已停用或已过期（对外不可区分）
    NotFound(String),
    /// 其他持久化失败
    Store(String),
    Analytics(String),
    CodeGeneration(String),
    Validation(String),
    Config(String),
    DatabaseConnection(String),
    CacheConnection(String),
    Serialization(String),
}

impl ShortenerError {
    /// 获取错误代码
    pub fn code(&self) -> &'static str {
        match self {
            ShortenerError::Conflict(_) => "E001",
            ShortenerError::GenerationExhausted(_) => "E002",
            ShortenerError::NotFound(_) => "E003",
            ShortenerError::Store(_) => "E004",
            ShortenerError::Analytics(_) => "E005",
            ShortenerError::CodeGeneration(_) => "E006",
            ShortenerError::Validation(_) => "E007",
            ShortenerError::Config(_) => "E008",
            ShortenerError::DatabaseConnection(_) => "E009",
            ShortenerError::CacheConnection(_) => "E010",
            ShortenerError::Serialization(_) => "E011",
        }
    }

    /// 获取错误类型名称
    pub fn error_type(&self) -> &'static str {
        match self {
            ShortenerError::Conflict(_) => "Conflict",
            ShortenerError::GenerationExhausted(_) => "Code Generation Exhausted",
            ShortenerError::NotFound(_) => "Resource Not Found",
            ShortenerError::Store(_) => "Store Operation Error",
            ShortenerError::Analytics(_) => "Analytics Query Error",
            ShortenerError::CodeGeneration(_) => "Code Generation Error",
            ShortenerError::Validation(_) => "Validation Error",
            ShortenerError::Config(_) => "Configuration Error",
            ShortenerError::DatabaseConnection(_) => "Database Connection Error",
            ShortenerError::CacheConnection(_) => "Cache Connection Error",
            ShortenerError::Serialization(_) => "Serialization Error",
        }
    }

    /// 获取错误详情
    pub fn message(&self) -> &str {
        match self {
            ShortenerError::Conflict(msg)
            | ShortenerError::GenerationExhausted(msg)
            | ShortenerError::NotFound(msg)
            | ShortenerError::Store(msg)
            | ShortenerError::Analytics(msg)
            | ShortenerError::CodeGeneration(msg)
            | ShortenerError::Validation(msg)
            | ShortenerError::Config(msg)
            | ShortenerError::DatabaseConnection(msg)
            | ShortenerError::CacheConnection(msg)
            | ShortenerError::Serialization(msg) => msg,
        }
    }

    /// HTTP 状态码映射
    pub fn http_status(&self) -> u16 {
        match self {
            ShortenerError::Conflict(_) => 409,
            ShortenerError::GenerationExhausted(_) => 503,
            ShortenerError::NotFound(_) => 404,
            ShortenerError::Validation(_) => 400,
            ShortenerError::CacheConnection(_) | ShortenerError::DatabaseConnection(_) => 503,
            ShortenerError::Store(_)
            | ShortenerError::Analytics(_)
            | ShortenerError::CodeGeneration(_)
            | ShortenerError::Config(_)
            | ShortenerError::Serialization(_) => 500,
        }
    }

    /// 格式化为简洁输出
    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }
}

impl fmt::Display for ShortenerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for ShortenerError {}

// 便捷的构造函数
impl ShortenerError {
    pub fn conflict<T: Into<String>>(msg: T) -> Self {
        ShortenerError::Conflict(msg.into())
    }

    pub fn generation_exhausted<T: Into<String>>(msg: T) -> Self {
        ShortenerError::GenerationExhausted(msg.into())
    }

    pub fn not_found<T: Into<String>>(msg: T) -> Self {
        ShortenerError::NotFound(msg.into())
    }

    pub fn store<T: Into<String>>(msg: T) -> Self {
        ShortenerError::Store(msg.into())
    }

    pub fn analytics<T: Into<String>>(msg: T) -> Self {
        ShortenerError::Analytics(msg.into())
    }

    pub fn code_generation<T: Into<String>>(msg: T) -> Self {
        ShortenerError::CodeGeneration(msg.into())
    }

    pub fn validation<T: Into<String>>(msg: T) -> Self {
        ShortenerError::Validation(msg.into())
    }

    pub fn config<T: Into<String>>(msg: T) -> Self {
        ShortenerError::Config(msg.into())
    }

    pub fn database_connection<T: Into<String>>(msg: T) -> Self {
        ShortenerError::DatabaseConnection(msg.into())
    }

    pub fn cache_connection<T: Into<String>>(msg: T) -> Self {
        ShortenerError::CacheConnection(msg.into())
    }

    pub fn serialization<T: Into<String>>(msg: T) -> Self {
        ShortenerError::Serialization(msg.into())
    }
}

// 为常见的错误类型实现 From trait
impl From<sea_orm::DbErr> for ShortenerError {
    fn from(err: sea_orm::DbErr) -> Self {
        ShortenerError::Store(err.to_string())
    }
}

impl From<std::io::Error> for ShortenerError {
    fn from(err: std::io::Error) -> Self {
        ShortenerError::Store(err.to_string())
    }
}

impl From<serde_json::Error> for ShortenerError {
    fn from(err: serde_json::Error) -> Self {
        ShortenerError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ShortenerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_are_distinct() {
        let errors = [
            ShortenerError::conflict("x"),
            ShortenerError::generation_exhausted("x"),
            ShortenerError::not_found("x"),
            ShortenerError::store("x"),
            ShortenerError::analytics("x"),
            ShortenerError::code_generation("x"),
            ShortenerError::validation("x"),
            ShortenerError::config("x"),
            ShortenerError::database_connection("x"),
            ShortenerError::cache_connection("x"),
            ShortenerError::serialization("x"),
        ];
        let mut codes: Vec<&str> = errors.iter().map(|e| e.code()).collect();
        codes.sort();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn test_http_status_mapping() {
        assert_eq!(ShortenerError::conflict("taken").http_status(), 409);
        assert_eq!(ShortenerError::generation_exhausted("x").http_status(), 503);
        assert_eq!(ShortenerError::not_found("x").http_status(), 404);
        assert_eq!(ShortenerError::store("x").http_status(), 500);
        assert_eq!(ShortenerError::validation("x").http_status(), 400);
    }

    #[test]
    fn test_display_uses_simple_format() {
        let err = ShortenerError::not_found("short code 'abc' not found");
        assert_eq!(
            err.to_string(),
            "Resource Not Found: short code 'abc' not found"
        );
    }

    #[test]
    fn test_from_db_err_maps_to_store() {
        let err: ShortenerError = sea_orm::DbErr::Custom("boom".to_string()).into();
        assert!(matches!(err, ShortenerError::Store(_)));
    }
}
