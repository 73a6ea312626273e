//! PostgreSQL 事务管理
//!
//! 写操作在单个事务内执行：成功提交，出错回滚，外部读者看不到中间状态。

use bridge_errors::AppResult;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::{debug, warn};

use crate::error_mapper::map_sqlx_error;

/// 事务管理器
#[derive(Clone)]
pub struct TransactionManager {
    pool: PgPool,
}

impl TransactionManager {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 开始事务
    pub async fn begin(&self) -> AppResult<Transaction<'static, Postgres>> {
        self.pool.begin().await.map_err(map_sqlx_error)
    }

    /// 按结果结束事务：Ok 提交，Err 回滚后原样返回错误
    pub async fn finish<T>(tx: Transaction<'static, Postgres>, result: AppResult<T>) -> AppResult<T> {
        match result {
            Ok(value) => {
                tx.commit().await.map_err(map_sqlx_error)?;
                debug!("Transaction committed");
                Ok(value)
            }
            Err(e) => {
                if let Err(rollback_err) = tx.rollback().await {
                    warn!(error = %rollback_err, "Failed to rollback transaction");
                } else {
                    debug!(error = %e, "Transaction rolled back");
                }
                Err(e)
            }
        }
    }
}
