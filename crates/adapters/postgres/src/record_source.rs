//! 列表语句执行

use std::time::Instant;

use async_trait::async_trait;
use bridge_errors::AppResult;
use bridge_ports::RecordSource;
use bridge_query::{ListingStatement, PageRequest, Record, convert_row};
use metrics::{counter, histogram};
use sqlx::PgPool;
use tracing::debug;

use crate::bind::bind;
use crate::error_mapper::map_sqlx_error;
use crate::row::PgCellReader;

/// 记录数据库查询指标
fn record_query(kind: &'static str, table: &str, success: bool, started: Instant) {
    let labels = [
        ("kind", kind.to_string()),
        ("table", table.to_string()),
        ("success", success.to_string()),
    ];
    counter!("db_queries_total", &labels).increment(1);
    histogram!("db_query_duration_ms", &labels).record(started.elapsed().as_secs_f64() * 1000.0);
}

#[derive(Clone)]
pub struct PgRecordSource {
    pool: PgPool,
}

impl PgRecordSource {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RecordSource for PgRecordSource {
    async fn count(&self, statement: &ListingStatement) -> AppResult<u64> {
        let query = bind(&statement.count_query())?;
        let table = statement.schema().name();
        let started = Instant::now();

        let result = sqlx::query_scalar_with::<_, i64, _>(&query.sql, query.arguments)
            .fetch_one(&self.pool)
            .await;
        record_query("count", table, result.is_ok(), started);

        let total = result.map_err(map_sqlx_error)?;
        Ok(u64::try_from(total).unwrap_or(0))
    }

    async fn fetch(&self, statement: &ListingStatement, page: &PageRequest) -> AppResult<Vec<Record>> {
        let query = bind(&statement.page_query(page))?;
        let schema = statement.schema();
        let started = Instant::now();

        let result = sqlx::query_with(&query.sql, query.arguments)
            .fetch_all(&self.pool)
            .await;
        record_query("page", schema.name(), result.is_ok(), started);

        let rows = result.map_err(map_sqlx_error)?;
        debug!(
            table = schema.name(),
            page = page.number,
            rows = rows.len(),
            "Page fetched"
        );
        Ok(rows
            .iter()
            .map(|row| convert_row(schema, &PgCellReader::new(row)))
            .collect())
    }
}
