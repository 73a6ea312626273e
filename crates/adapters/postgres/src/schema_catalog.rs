//! 表结构目录（information_schema）
//!
//! 结构按表名缓存：容量有界，不设过期时间

use std::sync::Arc;

use async_trait::async_trait;
use bridge_errors::{AppError, AppResult};
use bridge_ports::SchemaCatalog;
use bridge_query::schema::is_system_managed;
use bridge_query::{ColumnSchema, SemanticType, TableSchema};
use moka::future::Cache;
use sqlx::PgPool;
use tracing::debug;

use crate::error_mapper::map_sqlx_error;

#[derive(Debug, sqlx::FromRow)]
struct ColumnRow {
    column_name: String,
    data_type: String,
    is_nullable: String,
    character_maximum_length: Option<i32>,
}

/// 由数据库列类型推断语义类型
pub fn semantic_type(
    column_name: &str,
    data_type: &str,
    char_length: Option<i32>,
    is_key: bool,
) -> SemanticType {
    let column = column_name.to_lowercase();
    let id_like = is_key || column.ends_with("_id");
    match data_type {
        "smallint" | "integer" | "bigint" => {
            if !is_key && column.ends_with("_id") {
                SemanticType::Reference
            } else {
                SemanticType::Integer
            }
        }
        // NUMERIC(10) 主键与外键
        "numeric" if id_like => {
            if is_key {
                SemanticType::Integer
            } else {
                SemanticType::Reference
            }
        }
        "numeric" | "real" | "double precision" => SemanticType::Decimal,
        "boolean" => SemanticType::Boolean,
        "date" => SemanticType::Date,
        "timestamp without time zone" | "timestamp with time zone" => SemanticType::Timestamp,
        "character" if char_length == Some(1) && (column.starts_with("is") || column == "processed") => {
            SemanticType::YesNo
        }
        _ => SemanticType::String,
    }
}

/// PostgreSQL 表结构目录
#[derive(Clone)]
pub struct PgSchemaCatalog {
    pool: PgPool,
    cache: Cache<String, Arc<TableSchema>>,
}

impl PgSchemaCatalog {
    pub fn new(pool: PgPool, capacity: u64) -> Self {
        let cache = Cache::builder().max_capacity(capacity).build();
        Self { pool, cache }
    }

    async fn primary_key(&self, table: &str) -> AppResult<Option<String>> {
        sqlx::query_scalar::<_, String>(
            r#"
            SELECT kcu.column_name::text
            FROM information_schema.table_constraints tc
            JOIN information_schema.key_column_usage kcu
              ON tc.constraint_name = kcu.constraint_name
             AND tc.table_schema = kcu.table_schema
            WHERE tc.constraint_type = 'PRIMARY KEY'
              AND tc.table_schema = current_schema()
              AND tc.table_name = $1
            ORDER BY kcu.ordinal_position
            LIMIT 1
            "#,
        )
        .bind(table)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)
    }

    async fn load(&self, table: &str) -> AppResult<TableSchema> {
        let rows = sqlx::query_as::<_, ColumnRow>(
            r#"
            SELECT column_name::text, data_type::text, is_nullable::text,
                   character_maximum_length::int4
            FROM information_schema.columns
            WHERE table_schema = current_schema() AND table_name = $1
            ORDER BY ordinal_position
            "#,
        )
        .bind(table)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        if rows.is_empty() {
            return Err(AppError::not_found(format!("Table {} not found", table)));
        }

        let key = self
            .primary_key(table)
            .await?
            .unwrap_or_else(|| format!("{}_id", table));

        let columns = rows
            .into_iter()
            .map(|row| {
                let is_key = row.column_name.eq_ignore_ascii_case(&key);
                let semantic = semantic_type(
                    &row.column_name,
                    &row.data_type,
                    row.character_maximum_length,
                    is_key,
                );
                let mut column = ColumnSchema::new(row.column_name, semantic);
                if row.is_nullable == "NO" {
                    column = column.not_null();
                }
                if is_system_managed(&column.name) {
                    column = column.read_only();
                }
                column
            })
            .collect();

        TableSchema::new(table, &key, columns)
    }
}

#[async_trait]
impl SchemaCatalog for PgSchemaCatalog {
    async fn table_schema(&self, table_name: &str) -> AppResult<Arc<TableSchema>> {
        let table = table_name.trim().to_lowercase();
        if let Some(schema) = self.cache.get(&table).await {
            return Ok(schema);
        }

        let schema = Arc::new(self.load(&table).await?);
        debug!(table = %table, columns = schema.columns().len(), "Table schema loaded");
        self.cache.insert(table, schema.clone()).await;
        Ok(schema)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_semantic_type_inference() {
        assert_eq!(semantic_type("c_bankstatement_id", "integer", None, true), SemanticType::Integer);
        assert_eq!(semantic_type("c_bankaccount_id", "integer", None, false), SemanticType::Reference);
        assert_eq!(semantic_type("line", "integer", None, false), SemanticType::Integer);
        assert_eq!(semantic_type("stmtamt", "numeric", None, false), SemanticType::Decimal);
        assert_eq!(semantic_type("ad_note_id", "numeric", None, true), SemanticType::Integer);
        assert_eq!(semantic_type("ad_window_id", "numeric", None, false), SemanticType::Reference);
        assert_eq!(semantic_type("isactive", "character", Some(1), false), SemanticType::YesNo);
        assert_eq!(semantic_type("processed", "character", Some(1), false), SemanticType::YesNo);
        assert_eq!(semantic_type("docstatus", "character", Some(2), false), SemanticType::String);
        assert_eq!(semantic_type("postingtype", "character", Some(1), false), SemanticType::String);
        assert_eq!(semantic_type("statementdate", "timestamp without time zone", None, false), SemanticType::Timestamp);
        assert_eq!(semantic_type("movementdate", "date", None, false), SemanticType::Date);
        assert_eq!(semantic_type("name", "character varying", Some(60), false), SemanticType::String);
    }
}
