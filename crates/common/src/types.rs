//! 通用类型定义

use derive_more::Display;

/// 系统租户 / 系统组织 ID，所有角色可读
pub const SYSTEM_ID: i64 = 0;

/// 请求上下文
///
/// 由拦截器从 gRPC metadata 中提取，显式传入每一次调用，
/// 不依赖任何全局或线程局部的会话状态。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    /// 会话 ID，分页令牌以此为命名空间
    pub session_id: String,
    pub client_id: i64,
    pub org_id: i64,
    pub role_id: i64,
    pub user_id: i64,
    pub language: String,
}

impl RequestContext {
    pub const DEFAULT_LANGUAGE: &'static str = "en_US";

    pub fn new(session_id: impl Into<String>, client_id: i64, org_id: i64, role_id: i64, user_id: i64) -> Self {
        Self {
            session_id: session_id.into(),
            client_id,
            org_id,
            role_id,
            user_id,
            language: Self::DEFAULT_LANGUAGE.to_string(),
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }
}

/// 实体引用（表名 + 数值主键）
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display)]
#[display("{table_name}#{id}")]
pub struct EntityRef {
    pub table_name: String,
    pub id: i64,
}

impl EntityRef {
    pub fn new(table_name: impl Into<String>, id: i64) -> Self {
        Self {
            table_name: table_name.into(),
            id,
        }
    }
}
