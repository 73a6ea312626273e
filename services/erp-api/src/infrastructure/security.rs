//! 角色安全引擎
//!
//! 按租户与角色的组织访问表生成行限制，结果按
//! (租户, 角色, 表, 模式, 限定方式) 缓存，容量有界，不设过期时间。

use std::sync::Arc;

use async_trait::async_trait;
use bridge_adapter_postgres::{PgCellReader, map_sqlx_error};
use bridge_common::{RequestContext, SYSTEM_ID};
use bridge_errors::{AppError, AppResult};
use bridge_ports::SchemaCatalog;
use bridge_query::{
    AccessMode, CellReader, Qualification, SecurityEngine, SqlFragment, SqlParam, TableSchema,
};
use moka::future::Cache;
use sqlx::PgPool;
use tracing::debug;

/// 角色可访问的组织
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrgAccess {
    /// 角色可访问全部组织
    All,
    Only(Vec<i64>),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct AccessKey {
    client_id: i64,
    role_id: i64,
    table: String,
    mode: AccessMode,
    qualification: Qualification,
}

fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

/// 生成行限制片段
///
/// 租户：读取 `IN (0, ?)`，写入 `= ?`。
/// 组织：系统组织 0 可读不可写。
pub fn build_restriction(
    schema: &TableSchema,
    qualification: Qualification,
    mode: AccessMode,
    client_id: i64,
    orgs: &OrgAccess,
) -> SqlFragment {
    let prefix = match qualification {
        Qualification::FullyQualified => format!("{}.", schema.name()),
        Qualification::Unqualified => String::new(),
    };
    let mut parts = Vec::new();

    if let Some(column) = schema.column("ad_client_id") {
        let sql = match mode {
            AccessMode::ReadOnly => format!("{}{} IN ({}, ?)", prefix, column.name, SYSTEM_ID),
            AccessMode::ReadWrite => format!("{}{} = ?", prefix, column.name),
        };
        parts.push(SqlFragment::new(sql, vec![SqlParam::Integer(client_id)]));
    }

    if let Some(column) = schema.column("ad_org_id") {
        let org = format!("{}{}", prefix, column.name);
        let part = match (orgs, mode) {
            (OrgAccess::All, AccessMode::ReadOnly) => None,
            (OrgAccess::All, AccessMode::ReadWrite) => {
                Some(SqlFragment::raw(format!("{} <> {}", org, SYSTEM_ID)))
            }
            (OrgAccess::Only(ids), mode) => {
                let ids: Vec<i64> = ids.iter().copied().filter(|&id| id != SYSTEM_ID).collect();
                let params = ids.iter().map(|&id| SqlParam::Integer(id)).collect();
                Some(match (mode, ids.is_empty()) {
                    (AccessMode::ReadOnly, true) => SqlFragment::raw(format!("{} = {}", org, SYSTEM_ID)),
                    (AccessMode::ReadOnly, false) => SqlFragment::new(
                        format!("{} IN ({}, {})", org, SYSTEM_ID, placeholders(ids.len())),
                        params,
                    ),
                    (AccessMode::ReadWrite, true) => SqlFragment::raw("1 = 0"),
                    (AccessMode::ReadWrite, false) => SqlFragment::new(
                        format!("{} IN ({})", org, placeholders(ids.len())),
                        params,
                    ),
                })
            }
        };
        parts.extend(part);
    }

    SqlFragment::conjunction(parts.into_iter().map(SqlFragment::grouped))
}

pub struct RoleSecurityEngine {
    pool: PgPool,
    catalog: Arc<dyn SchemaCatalog>,
    cache: Cache<AccessKey, SqlFragment>,
}

impl RoleSecurityEngine {
    pub fn new(pool: PgPool, catalog: Arc<dyn SchemaCatalog>, capacity: u64) -> Self {
        Self {
            pool,
            catalog,
            cache: Cache::builder().max_capacity(capacity).build(),
        }
    }

    async fn org_access(&self, ctx: &RequestContext) -> AppResult<OrgAccess> {
        let access_all = sqlx::query_scalar::<_, String>(
            r#"
            SELECT isaccessallorgs::text
            FROM ad_role
            WHERE ad_role_id = $1 AND ad_client_id IN (0, $2) AND isactive = 'Y'
            "#,
        )
        .bind(ctx.role_id)
        .bind(ctx.client_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?
        .ok_or_else(|| AppError::forbidden(format!("Role {} is not active", ctx.role_id)))?;

        if access_all.trim() == "Y" {
            return Ok(OrgAccess::All);
        }

        let rows = sqlx::query(
            "SELECT ad_org_id FROM ad_role_orgaccess WHERE ad_role_id = $1 AND isactive = 'Y'",
        )
        .bind(ctx.role_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        let mut orgs = Vec::with_capacity(rows.len());
        for row in &rows {
            let org = PgCellReader::new(row)
                .read_integer("ad_org_id")
                .map_err(|e| AppError::internal(e.to_string()))?;
            orgs.extend(org);
        }
        Ok(OrgAccess::Only(orgs))
    }
}

#[async_trait]
impl SecurityEngine for RoleSecurityEngine {
    async fn restriction(
        &self,
        ctx: &RequestContext,
        table_name: &str,
        mode: AccessMode,
        qualification: Qualification,
    ) -> AppResult<SqlFragment> {
        let key = AccessKey {
            client_id: ctx.client_id,
            role_id: ctx.role_id,
            table: table_name.to_lowercase(),
            mode,
            qualification,
        };
        if let Some(restriction) = self.cache.get(&key).await {
            return Ok(restriction);
        }

        let schema = self.catalog.table_schema(table_name).await?;
        let orgs = self.org_access(ctx).await?;
        let restriction = build_restriction(&schema, qualification, mode, ctx.client_id, &orgs);
        debug!(
            table = %schema.name(),
            role = ctx.role_id,
            ?mode,
            sql = restriction.sql(),
            "Access restriction built"
        );

        self.cache.insert(key, restriction.clone()).await;
        Ok(restriction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_query::{ColumnSchema, SemanticType};

    fn bank_statement() -> TableSchema {
        TableSchema::new(
            "c_bankstatement",
            "c_bankstatement_id",
            vec![
                ColumnSchema::new("c_bankstatement_id", SemanticType::Integer),
                ColumnSchema::new("ad_client_id", SemanticType::Reference),
                ColumnSchema::new("ad_org_id", SemanticType::Reference),
                ColumnSchema::new("name", SemanticType::String),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_read_includes_system_rows() {
        let fragment = build_restriction(
            &bank_statement(),
            Qualification::FullyQualified,
            AccessMode::ReadOnly,
            11,
            &OrgAccess::Only(vec![0, 50000, 50001]),
        );
        assert_eq!(
            fragment.sql(),
            "(c_bankstatement.ad_client_id IN (0, ?)) AND (c_bankstatement.ad_org_id IN (0, ?, ?))"
        );
        assert_eq!(
            fragment.params(),
            &[SqlParam::Integer(11), SqlParam::Integer(50000), SqlParam::Integer(50001)]
        );
    }

    #[test]
    fn test_write_excludes_system_org() {
        let fragment = build_restriction(
            &bank_statement(),
            Qualification::Unqualified,
            AccessMode::ReadWrite,
            11,
            &OrgAccess::Only(vec![0, 50000]),
        );
        assert_eq!(fragment.sql(), "(ad_client_id = ?) AND (ad_org_id IN (?))");
        assert_eq!(fragment.params(), &[SqlParam::Integer(11), SqlParam::Integer(50000)]);
    }

    #[test]
    fn test_all_orgs() {
        let schema = bank_statement();
        let read = build_restriction(&schema, Qualification::Unqualified, AccessMode::ReadOnly, 11, &OrgAccess::All);
        assert_eq!(read.sql(), "(ad_client_id IN (0, ?))");

        let write = build_restriction(&schema, Qualification::Unqualified, AccessMode::ReadWrite, 11, &OrgAccess::All);
        assert_eq!(write.sql(), "(ad_client_id = ?) AND (ad_org_id <> 0)");
    }

    #[test]
    fn test_no_writable_org() {
        let fragment = build_restriction(
            &bank_statement(),
            Qualification::Unqualified,
            AccessMode::ReadWrite,
            11,
            &OrgAccess::Only(vec![0]),
        );
        assert_eq!(fragment.sql(), "(ad_client_id = ?) AND (1 = 0)");
    }

    #[test]
    fn test_table_without_access_columns() {
        let schema = TableSchema::new(
            "ad_sequence_no",
            "ad_sequence_no_id",
            vec![ColumnSchema::new("ad_sequence_no_id", SemanticType::Integer)],
        )
        .unwrap();
        let fragment = build_restriction(&schema, Qualification::FullyQualified, AccessMode::ReadWrite, 11, &OrgAccess::All);
        assert!(fragment.is_empty());
    }
}
