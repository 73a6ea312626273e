//! 单条实体读写
//!
//! 写操作都在一个事务内完成，写入后在同一事务内回读记录；
//! 新插入的行回读时带写限制，限制之外的行整体回滚。

use async_trait::async_trait;
use bridge_errors::{AppError, AppResult};
use bridge_ports::EntityRepository;
use bridge_query::{Assignment, EntityStatements, Record, SqlFragment, convert_row};
use sqlx::{PgConnection, PgPool};

use crate::bind::bind;
use crate::error_mapper::map_sqlx_error;
use crate::row::{PgCellReader, first_i64};
use crate::transaction::TransactionManager;

async fn select_record(
    conn: &mut PgConnection,
    statements: &EntityStatements,
    id: i64,
    restriction: SqlFragment,
) -> AppResult<Option<Record>> {
    let query = bind(&statements.select_one(id, restriction))?;
    let row = sqlx::query_with(&query.sql, query.arguments)
        .fetch_optional(&mut *conn)
        .await
        .map_err(map_sqlx_error)?;
    Ok(row.map(|row| convert_row(statements.schema(), &PgCellReader::new(&row))))
}

async fn reload(conn: &mut PgConnection, statements: &EntityStatements, id: i64) -> AppResult<Record> {
    select_record(conn, statements, id, SqlFragment::empty())
        .await?
        .ok_or_else(|| {
            AppError::internal(format!(
                "{} #{} vanished after write",
                statements.schema().name(),
                id
            ))
        })
}

async fn insert_in(
    conn: &mut PgConnection,
    statements: &EntityStatements,
    assignments: &[Assignment],
) -> AppResult<i64> {
    let query = bind(&statements.insert(assignments))?;
    let row = sqlx::query_with(&query.sql, query.arguments)
        .fetch_one(&mut *conn)
        .await
        .map_err(map_sqlx_error)?;
    first_i64(&row).map_err(|e| AppError::internal(e.to_string()))
}

async fn insert_within(
    conn: &mut PgConnection,
    statements: &EntityStatements,
    assignments: &[Assignment],
    restriction: SqlFragment,
) -> AppResult<Record> {
    let id = insert_in(conn, statements, assignments).await?;
    select_record(conn, statements, id, restriction)
        .await?
        .ok_or_else(|| {
            AppError::forbidden(format!(
                "New {} row is outside the writable scope",
                statements.schema().name()
            ))
        })
}

async fn update_in(
    conn: &mut PgConnection,
    statements: &EntityStatements,
    id: i64,
    assignments: &[Assignment],
    restriction: SqlFragment,
) -> AppResult<Option<Record>> {
    let query = bind(&statements.update(id, assignments, restriction)?)?;
    let affected = sqlx::query_with(&query.sql, query.arguments)
        .execute(&mut *conn)
        .await
        .map_err(map_sqlx_error)?
        .rows_affected();
    if affected == 0 {
        return Ok(None);
    }
    reload(conn, statements, id).await.map(Some)
}

async fn delete_in(
    conn: &mut PgConnection,
    statements: &EntityStatements,
    id: i64,
    restriction: SqlFragment,
) -> AppResult<bool> {
    let query = bind(&statements.delete(id, restriction))?;
    let affected = sqlx::query_with(&query.sql, query.arguments)
        .execute(&mut *conn)
        .await
        .map_err(map_sqlx_error)?
        .rows_affected();
    Ok(affected > 0)
}

async fn upsert_in(
    conn: &mut PgConnection,
    statements: &EntityStatements,
    matching: SqlFragment,
    updates: &[Assignment],
    inserts: &[Assignment],
) -> AppResult<Record> {
    let query = bind(&statements.lock_first(matching))?;
    let existing = sqlx::query_with(&query.sql, query.arguments)
        .fetch_optional(&mut *conn)
        .await
        .map_err(map_sqlx_error)?;

    match existing {
        Some(row) => {
            let id = first_i64(&row).map_err(|e| AppError::internal(e.to_string()))?;
            if updates.is_empty() {
                return reload(conn, statements, id).await;
            }
            update_in(conn, statements, id, updates, SqlFragment::empty())
                .await?
                .ok_or_else(|| AppError::internal("Locked row not updated"))
        }
        None => {
            let all: Vec<Assignment> = updates.iter().chain(inserts).cloned().collect();
            let id = insert_in(conn, statements, &all).await?;
            reload(conn, statements, id).await
        }
    }
}

#[derive(Clone)]
pub struct PgEntityRepository {
    pool: PgPool,
    transactions: TransactionManager,
}

impl PgEntityRepository {
    pub fn new(pool: PgPool) -> Self {
        Self {
            transactions: TransactionManager::new(pool.clone()),
            pool,
        }
    }
}

#[async_trait]
impl EntityRepository for PgEntityRepository {
    async fn find(
        &self,
        statements: &EntityStatements,
        id: i64,
        restriction: SqlFragment,
    ) -> AppResult<Option<Record>> {
        let mut conn = self.pool.acquire().await.map_err(map_sqlx_error)?;
        select_record(&mut conn, statements, id, restriction).await
    }

    async fn insert(
        &self,
        statements: &EntityStatements,
        assignments: &[Assignment],
        restriction: SqlFragment,
    ) -> AppResult<Record> {
        let mut tx = self.transactions.begin().await?;
        let result = insert_within(&mut tx, statements, assignments, restriction).await;
        TransactionManager::finish(tx, result).await
    }

    async fn update(
        &self,
        statements: &EntityStatements,
        id: i64,
        assignments: &[Assignment],
        restriction: SqlFragment,
    ) -> AppResult<Option<Record>> {
        let mut tx = self.transactions.begin().await?;
        let result = update_in(&mut tx, statements, id, assignments, restriction).await;
        TransactionManager::finish(tx, result).await
    }

    async fn delete(
        &self,
        statements: &EntityStatements,
        id: i64,
        restriction: SqlFragment,
    ) -> AppResult<bool> {
        let mut tx = self.transactions.begin().await?;
        let result = delete_in(&mut tx, statements, id, restriction).await;
        TransactionManager::finish(tx, result).await
    }

    async fn upsert(
        &self,
        statements: &EntityStatements,
        matching: SqlFragment,
        updates: &[Assignment],
        inserts: &[Assignment],
    ) -> AppResult<Record> {
        let mut tx = self.transactions.begin().await?;
        let result = upsert_in(&mut tx, statements, matching, updates, inserts).await;
        TransactionManager::finish(tx, result).await
    }
}
