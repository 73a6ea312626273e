//! bridge-errors - 统一错误处理
//!
//! 每种错误映射到独立的 gRPC 状态码

use thiserror::Error;

/// 应用错误类型
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// 业务规则拒绝（单据已处理、已锁定等），消息原样透传
    #[error("Failed precondition: {0}")]
    FailedPrecondition(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl AppError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn unauthenticated(msg: impl Into<String>) -> Self {
        Self::Unauthenticated(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn failed_precondition(msg: impl Into<String>) -> Self {
        Self::FailedPrecondition(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn database(msg: impl Into<String>) -> Self {
        Self::Database(msg.into())
    }

    /// 转换为 gRPC 状态码
    pub fn grpc_code(&self) -> tonic::Code {
        match self {
            Self::NotFound(_) => tonic::Code::NotFound,
            Self::Validation(_) => tonic::Code::InvalidArgument,
            Self::Unauthenticated(_) => tonic::Code::Unauthenticated,
            Self::Forbidden(_) => tonic::Code::PermissionDenied,
            Self::Conflict(_) => tonic::Code::AlreadyExists,
            Self::FailedPrecondition(_) => tonic::Code::FailedPrecondition,
            Self::Internal(_) => tonic::Code::Internal,
            Self::Database(_) => tonic::Code::Internal,
        }
    }

    /// 是否为基础设施错误（日志记录完整信息，客户端只看到概要）
    pub fn is_infrastructure(&self) -> bool {
        matches!(self, Self::Internal(_) | Self::Database(_))
    }
}

impl From<AppError> for tonic::Status {
    fn from(err: AppError) -> Self {
        let code = err.grpc_code();
        match &err {
            AppError::Database(detail) => {
                tracing::error!(error = %detail, "Database failure while handling request");
                tonic::Status::new(code, "Database error while handling request")
            }
            AppError::Internal(detail) => {
                tracing::error!(error = %detail, "Internal failure while handling request");
                tonic::Status::new(code, err.to_string())
            }
            _ => tonic::Status::new(code, err.to_string()),
        }
    }
}

/// Result 类型别名
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distinct_grpc_codes() {
        assert_eq!(AppError::not_found("x").grpc_code(), tonic::Code::NotFound);
        assert_eq!(AppError::validation("x").grpc_code(), tonic::Code::InvalidArgument);
        assert_eq!(AppError::forbidden("x").grpc_code(), tonic::Code::PermissionDenied);
        assert_eq!(
            AppError::failed_precondition("x").grpc_code(),
            tonic::Code::FailedPrecondition
        );
        assert_eq!(AppError::database("x").grpc_code(), tonic::Code::Internal);
    }

    #[test]
    fn test_validation_message_keeps_field() {
        let status: tonic::Status = AppError::validation("Invalid column: Amount").into();
        assert_eq!(status.code(), tonic::Code::InvalidArgument);
        assert!(status.message().contains("Amount"));
    }

    #[test]
    fn test_database_detail_not_leaked() {
        let status: tonic::Status =
            AppError::database("relation \"secret_table\" does not exist").into();
        assert_eq!(status.code(), tonic::Code::Internal);
        assert!(!status.message().contains("secret_table"));
    }

    #[test]
    fn test_business_rule_passed_verbatim() {
        let status: tonic::Status = AppError::failed_precondition("Document already processed").into();
        assert!(status.message().contains("Document already processed"));
    }
}
