//! Short code generation

use crate::errors::Result;

/// 数字 + 大小写字母，共 62 个符号
pub const ALPHABET: &[u8; 62] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

pub const DEFAULT_CODE_LENGTH: usize = 7;

/// 生成候选短码，不保证唯一，唯一性由存储层约束兜底
///
/// 返回 `Err` 表示随机源不可用，调用方直接失败不重试。
/// `RandomCodeGenerator` 不会返回 `Err`；该错误只来自基于可失败随机源的自定义实现。
pub trait CodeGenerator: Send + Sync {
    fn generate(&self) -> Result<String>;
}

/// 从 62 字符表中均匀随机取样的定长短码
///
/// 随机源为 `rand` 的线程本地 CSPRNG（由操作系统熵定期重新播种）。
/// 操作系统熵源失效时 `rand` 直接 panic，所以 `generate` 总是返回 `Ok`。
#[derive(Debug, Clone)]
pub struct RandomCodeGenerator {
    length: usize,
}

impl RandomCodeGenerator {
    pub fn new(length: usize) -> Self {
        Self { length }
    }
}

impl Default for RandomCodeGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_CODE_LENGTH)
    }
}

impl CodeGenerator for RandomCodeGenerator {
    fn generate(&self) -> Result<String> {
        Ok(std::iter::repeat_with(|| ALPHABET[rand::random_range(0..ALPHABET.len())] as char)
            .take(self.length)
            .collect())
    }
}
