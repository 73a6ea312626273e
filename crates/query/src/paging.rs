//! 分页
//!
//! 令牌格式 `"<session>:<fingerprint>:<page>"`。前缀不匹配或页码无法解析时
//! 一律视为第 1 页；令牌对调用方是不透明的。

use sha2::{Digest, Sha256};

/// 分页尺寸限制
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLimits {
    pub default_size: u32,
    pub max_size: u32,
}

impl Default for PageLimits {
    fn default() -> Self {
        Self {
            default_size: 20,
            max_size: 100,
        }
    }
}

impl PageLimits {
    pub fn new(default_size: u32, max_size: u32) -> Self {
        let max_size = max_size.max(1);
        Self {
            default_size: default_size.clamp(1, max_size),
            max_size,
        }
    }

    /// 非正数取默认值，超过上限取上限
    pub fn clamp(&self, requested: i32) -> u32 {
        match u32::try_from(requested) {
            Ok(0) | Err(_) => self.default_size,
            Ok(size) => size.min(self.max_size),
        }
    }
}

/// 令牌命名空间：会话 + 查询指纹
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenScope {
    pub session_id: String,
    pub fingerprint: String,
}

impl TokenScope {
    pub fn new(session_id: impl Into<String>, fingerprint: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            fingerprint: fingerprint.into(),
        }
    }

    pub fn prefix(&self) -> String {
        format!("{}:{}:", self.session_id, self.fingerprint)
    }

    pub fn token_for(&self, page: u64) -> String {
        format!("{}{}", self.prefix(), page)
    }

    /// 从令牌解析页码，任何不匹配都返回 1
    pub fn decode_page_number(&self, token: Option<&str>) -> u64 {
        token
            .map(str::trim)
            .and_then(|t| t.strip_prefix(self.prefix().as_str()))
            .and_then(|page| page.parse::<u64>().ok())
            .filter(|&page| page >= 1)
            .unwrap_or(1)
    }
}

/// 一次分页请求（页码从 1 开始）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub number: u64,
    pub size: u32,
}

impl PageRequest {
    pub fn offset(&self) -> u64 {
        self.number
            .saturating_sub(1)
            .saturating_mul(u64::from(self.size))
    }

    pub fn limit(&self) -> u64 {
        u64::from(self.size)
    }

    /// 仍有剩余行时返回下一页令牌
    pub fn next_page_token(&self, total: u64, scope: &TokenScope) -> Option<String> {
        let end = self.offset().checked_add(self.limit())?;
        if end < total {
            Some(scope.token_for(self.number + 1))
        } else {
            None
        }
    }
}

/// 由令牌和请求尺寸确定当前页
pub fn resolve_page(
    token: Option<&str>,
    requested_size: i32,
    limits: &PageLimits,
    scope: &TokenScope,
) -> PageRequest {
    PageRequest {
        number: scope.decode_page_number(token),
        size: limits.clamp(requested_size),
    }
}

/// 64 位短哈希（SHA-256 前 8 字节的十六进制）
pub fn short_hash(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    let bytes = hasher.finalize();
    hex::encode(&bytes[..8])
}
