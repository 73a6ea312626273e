//! 条件翻译：Criteria -> 参数化 WHERE 片段
//!
//! 值一律作为绑定参数；写入 SQL 文本的列名只取自表结构的规范名称。

use bridge_errors::{AppError, AppResult};

use crate::criteria::{Condition, Criteria, Operator};
use crate::schema::{ColumnSchema, SemanticType, TableSchema};
use crate::setter::coerce;
use crate::sql::{SqlFragment, SqlParam};
use crate::value::Value;

/// 翻译结构化条件与全文搜索
///
/// 每个条件单独加括号后以 AND 连接；搜索条件在各搜索列间 OR 组合，
/// 整体加括号后追加在最后。没有条件也没有搜索时返回空片段。
pub fn translate(schema: &TableSchema, criteria: &Criteria) -> AppResult<SqlFragment> {
    let mut parts = Vec::with_capacity(criteria.conditions.len() + 1);
    for condition in &criteria.conditions {
        parts.push(translate_condition(schema, condition)?.grouped());
    }
    if let Some(search) = criteria.effective_search() {
        parts.push(search_fragment(schema, search).grouped());
    }
    Ok(SqlFragment::conjunction(parts))
}

/// 翻译单个条件（不加外层括号）
pub fn translate_condition(schema: &TableSchema, condition: &Condition) -> AppResult<SqlFragment> {
    let column = schema.require_column(&condition.column_name)?;
    let name = column.name.as_str();

    match condition.operator {
        Operator::Null => Ok(SqlFragment::raw(format!("{} IS NULL", name))),
        Operator::NotNull => Ok(SqlFragment::raw(format!("{} IS NOT NULL", name))),
        Operator::Equal if condition.value.is_null() => {
            Ok(SqlFragment::raw(format!("{} IS NULL", name)))
        }
        Operator::NotEqual if condition.value.is_null() => {
            Ok(SqlFragment::raw(format!("{} IS NOT NULL", name)))
        }
        Operator::Equal => compare(column, "=", &condition.value),
        Operator::NotEqual => compare(column, "<>", &condition.value),
        Operator::Greater => compare(column, ">", &condition.value),
        Operator::GreaterEqual => compare(column, ">=", &condition.value),
        Operator::Less => compare(column, "<", &condition.value),
        Operator::LessEqual => compare(column, "<=", &condition.value),
        Operator::Like => like(column, "LIKE", &condition.value),
        Operator::NotLike => like(column, "NOT LIKE", &condition.value),
        Operator::Between => between(column, &condition.value, &condition.value_to),
        Operator::In => one_of(column, "IN", condition),
        Operator::NotIn => one_of(column, "NOT IN", condition),
    }
}

fn require_value<'a>(column: &ColumnSchema, operator: &str, value: &'a Value) -> AppResult<&'a Value> {
    if value.is_null() {
        return Err(AppError::validation(format!(
            "Operator {} on column {} requires a value",
            operator, column.name
        )));
    }
    Ok(value)
}

fn compare(column: &ColumnSchema, op: &str, value: &Value) -> AppResult<SqlFragment> {
    let param = coerce(column, require_value(column, op, value)?)?;
    Ok(SqlFragment::new(format!("{} {} ?", column.name, op), vec![param]))
}

fn like(column: &ColumnSchema, op: &str, value: &Value) -> AppResult<SqlFragment> {
    if column.semantic != SemanticType::String {
        return Err(AppError::validation(format!(
            "Operator {} requires a text column, {} is {}",
            op,
            column.name,
            column.semantic.as_str()
        )));
    }
    let text = require_value(column, op, value)?
        .as_text()
        .unwrap_or_default();
    Ok(SqlFragment::new(
        format!("UPPER({}) {} '%'||UPPER(?)||'%'", column.name, op),
        vec![SqlParam::Text(text)],
    ))
}

fn between(column: &ColumnSchema, from: &Value, to: &Value) -> AppResult<SqlFragment> {
    let from = coerce(column, require_value(column, "BETWEEN", from)?)?;
    let to = coerce(column, require_value(column, "BETWEEN", to)?)?;
    Ok(SqlFragment::new(
        format!("{} BETWEEN ? AND ?", column.name),
        vec![from, to],
    ))
}

fn one_of(column: &ColumnSchema, op: &str, condition: &Condition) -> AppResult<SqlFragment> {
    let values: &[Value] = if condition.values.is_empty() && !condition.value.is_null() {
        std::slice::from_ref(&condition.value)
    } else {
        &condition.values
    };
    if values.is_empty() {
        return Err(AppError::validation(format!(
            "Operator {} on column {} requires at least one value",
            op, column.name
        )));
    }

    let params = values
        .iter()
        .map(|v| coerce(column, require_value(column, op, v)?))
        .collect::<AppResult<Vec<_>>>()?;
    let placeholders = vec!["?"; params.len()].join(", ");
    Ok(SqlFragment::new(
        format!("{} {} ({})", column.name, op, placeholders),
        params,
    ))
}

/// 全文搜索：在所有搜索列间 OR 组合；表中没有搜索列时返回空片段
pub fn search_fragment(schema: &TableSchema, search: &str) -> SqlFragment {
    let mut clauses = Vec::new();
    let mut params = Vec::new();
    for column in schema.search_columns() {
        clauses.push(format!("UPPER({}) LIKE '%'||UPPER(?)||'%'", column.name));
        params.push(SqlParam::Text(search.to_string()));
    }
    if clauses.is_empty() {
        return SqlFragment::empty();
    }
    SqlFragment::new(clauses.join(" OR "), params)
}
