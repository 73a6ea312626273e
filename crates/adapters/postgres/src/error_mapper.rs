//! 数据库错误映射
//!
//! 按 SQLSTATE 将 sqlx 错误转换为 AppError；未识别的错误记录完整日志后按数据库错误返回

use bridge_errors::AppError;
use sqlx::postgres::PgDatabaseError;
use tracing::error;

/// 将 sqlx 错误转换为 AppError
pub fn map_sqlx_error(e: sqlx::Error) -> AppError {
    match e {
        sqlx::Error::RowNotFound => AppError::not_found("Record not found"),
        sqlx::Error::Database(db_err) => match db_err.code().as_deref() {
            Some("23505") => AppError::conflict("Duplicate entry violates unique constraint"),
            Some("23503") => AppError::validation("Foreign key constraint violation"),
            Some("23514") => AppError::validation("Check constraint violation"),
            Some("23502") => {
                let column = db_err
                    .try_downcast_ref::<PgDatabaseError>()
                    .and_then(|pg| pg.column());
                match column {
                    Some(column) => AppError::validation(format!("Column {} is mandatory", column)),
                    None => AppError::validation("Not null constraint violation"),
                }
            }
            Some("22001") => AppError::validation("String data too long"),
            Some("22P02") => AppError::validation("Invalid input syntax"),
            Some("42P01") => AppError::not_found("Table not found"),
            Some("42703") => AppError::not_found("Column not found"),
            Some(code) => {
                error!(code, error = %db_err, "Unhandled database error");
                AppError::database(format!("Database error ({}): {}", code, db_err))
            }
            None => {
                error!(error = %db_err, "Database error without SQLSTATE");
                AppError::database(db_err.to_string())
            }
        },
        sqlx::Error::PoolTimedOut => AppError::internal("Database connection pool timeout"),
        sqlx::Error::PoolClosed => AppError::internal("Database connection pool is closed"),
        sqlx::Error::Protocol(msg) => AppError::internal(format!("Database protocol error: {}", msg)),
        other => {
            error!(error = %other, "Database error");
            AppError::database(other.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_not_found() {
        let err = map_sqlx_error(sqlx::Error::RowNotFound);
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn test_pool_timeout() {
        let err = map_sqlx_error(sqlx::Error::PoolTimedOut);
        assert!(matches!(err, AppError::Internal(_)));
    }

    #[test]
    fn test_protocol_error_is_internal() {
        let err = map_sqlx_error(sqlx::Error::Protocol("unexpected message".into()));
        assert!(matches!(err, AppError::Internal(_)));
        assert!(err.to_string().contains("unexpected message"));
    }
}
