//! 语句构建
//!
//! 计数语句与分页语句由同一个 WHERE 片段渲染，保证总数与分页一致；
//! 分页语句总以主键作为最后的排序键，保证切片确定。

use std::sync::Arc;

use bridge_errors::{AppError, AppResult};

use crate::criteria::OrderBy;
use crate::paging::{PageRequest, short_hash};
use crate::schema::TableSchema;
use crate::setter::Assignment;
use crate::sql::{SqlFragment, SqlParam};

fn to_i64(n: u64) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

fn select_list(schema: &TableSchema) -> String {
    schema
        .columns()
        .iter()
        .map(|c| c.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

fn key_equals(schema: &TableSchema, id: i64) -> SqlFragment {
    SqlFragment::new(
        format!("{} = ?", schema.key_column()),
        vec![SqlParam::Integer(id)],
    )
}

/// 一次列表查询
#[derive(Debug, Clone)]
pub struct ListingStatement {
    schema: Arc<TableSchema>,
    filter: SqlFragment,
    order_by: Vec<OrderBy>,
}

impl ListingStatement {
    /// 排序列按表结构校验并规范化，主键追加为最后的升序排序键
    pub fn new(schema: Arc<TableSchema>, filter: SqlFragment, order_by: &[OrderBy]) -> AppResult<Self> {
        let mut resolved: Vec<OrderBy> = Vec::with_capacity(order_by.len() + 1);
        for order in order_by {
            let name = schema.require_column(&order.column_name)?.name.clone();
            if resolved.iter().any(|o| o.column_name == name) {
                continue;
            }
            resolved.push(OrderBy {
                column_name: name,
                descending: order.descending,
            });
        }
        if !resolved.iter().any(|o| o.column_name == schema.key_column()) {
            resolved.push(OrderBy::asc(schema.key_column()));
        }
        Ok(Self {
            schema,
            filter,
            order_by: resolved,
        })
    }

    pub fn schema(&self) -> &Arc<TableSchema> {
        &self.schema
    }

    pub fn filter(&self) -> &SqlFragment {
        &self.filter
    }

    pub fn order_by(&self) -> &[OrderBy] {
        &self.order_by
    }

    fn order_clause(&self) -> String {
        self.order_by
            .iter()
            .map(|o| {
                if o.descending {
                    format!("{} DESC", o.column_name)
                } else {
                    format!("{} ASC", o.column_name)
                }
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn from_where(&self) -> SqlFragment {
        let mut fragment = SqlFragment::raw(format!("FROM {}", self.schema.name()));
        if !self.filter.is_empty() {
            fragment.push(" WHERE ", []);
            fragment.push(self.filter.sql(), self.filter.params().iter().cloned());
        }
        fragment
    }

    /// 查询指纹：表名、过滤骨架、绑定值与排序
    pub fn fingerprint(&self) -> String {
        let params = self
            .filter
            .params()
            .iter()
            .map(SqlParam::canonical)
            .collect::<Vec<_>>()
            .join(",");
        short_hash(&format!(
            "{}|{}|{}|{}",
            self.schema.name().to_lowercase(),
            self.filter.sql(),
            params,
            self.order_clause()
        ))
    }

    /// `SELECT COUNT(*)`，与分页语句共用 WHERE
    pub fn count_query(&self) -> SqlFragment {
        let mut query = SqlFragment::raw("SELECT COUNT(*) ");
        let (sql, params) = self.from_where().into_parts();
        query.push(&sql, params);
        query
    }

    pub fn page_query(&self, page: &PageRequest) -> SqlFragment {
        let mut query = SqlFragment::raw(format!("SELECT {} ", select_list(&self.schema)));
        let (sql, params) = self.from_where().into_parts();
        query.push(&sql, params);
        query.push(&format!(" ORDER BY {}", self.order_clause()), []);
        query.push(
            " LIMIT ? OFFSET ?",
            [
                SqlParam::Integer(to_i64(page.limit())),
                SqlParam::Integer(to_i64(page.offset())),
            ],
        );
        query
    }
}

/// 单条实体的读写语句
#[derive(Debug, Clone)]
pub struct EntityStatements {
    schema: Arc<TableSchema>,
}

impl EntityStatements {
    pub fn new(schema: Arc<TableSchema>) -> Self {
        Self { schema }
    }

    pub fn schema(&self) -> &Arc<TableSchema> {
        &self.schema
    }

    fn where_key(&self, id: i64, restriction: SqlFragment) -> SqlFragment {
        key_equals(&self.schema, id).and(restriction)
    }

    pub fn select_one(&self, id: i64, restriction: SqlFragment) -> SqlFragment {
        let mut query = SqlFragment::raw(format!(
            "SELECT {} FROM {} WHERE ",
            select_list(&self.schema),
            self.schema.name()
        ));
        let (sql, params) = self.where_key(id, restriction).into_parts();
        query.push(&sql, params);
        query
    }

    /// 插入并返回新主键；主键由数据库默认值生成
    pub fn insert(&self, assignments: &[Assignment]) -> SqlFragment {
        let key = self.schema.key_column();
        if assignments.is_empty() {
            return SqlFragment::raw(format!(
                "INSERT INTO {} DEFAULT VALUES RETURNING {}",
                self.schema.name(),
                key
            ));
        }
        let columns = assignments
            .iter()
            .map(|a| a.column.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        let placeholders = vec!["?"; assignments.len()].join(", ");
        SqlFragment::new(
            format!(
                "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
                self.schema.name(),
                columns,
                placeholders,
                key
            ),
            assignments.iter().map(|a| a.param.clone()).collect(),
        )
    }

    /// 更新，限制之外的行不受影响
    pub fn update(
        &self,
        id: i64,
        assignments: &[Assignment],
        restriction: SqlFragment,
    ) -> AppResult<SqlFragment> {
        if assignments.is_empty() {
            return Err(AppError::validation(format!(
                "No attributes to update for {}",
                self.schema.name()
            )));
        }
        let set = assignments
            .iter()
            .map(|a| format!("{} = ?", a.column))
            .collect::<Vec<_>>()
            .join(", ");
        let mut query = SqlFragment::new(
            format!("UPDATE {} SET {} WHERE ", self.schema.name(), set),
            assignments.iter().map(|a| a.param.clone()).collect(),
        );
        let (sql, params) = self.where_key(id, restriction).into_parts();
        query.push(&sql, params);
        Ok(query)
    }

    /// 锁定首个匹配行，返回其主键
    pub fn lock_first(&self, matching: SqlFragment) -> SqlFragment {
        let key = self.schema.key_column();
        let mut query = SqlFragment::raw(format!("SELECT {} FROM {}", key, self.schema.name()));
        if !matching.is_empty() {
            let (sql, params) = matching.into_parts();
            query.push(" WHERE ", []);
            query.push(&sql, params);
        }
        query.push(&format!(" ORDER BY {} LIMIT 1 FOR UPDATE", key), []);
        query
    }

    pub fn delete(&self, id: i64, restriction: SqlFragment) -> SqlFragment {
        let mut query = SqlFragment::raw(format!("DELETE FROM {} WHERE ", self.schema.name()));
        let (sql, params) = self.where_key(id, restriction).into_parts();
        query.push(&sql, params);
        query
    }
}
