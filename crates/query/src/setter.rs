//! 按列类型分派的赋值表
//!
//! 每张表在结构加载后构建一次 [`SetterTable`]：列名 -> 类型转换函数。
//! 所有类型转换集中在这里，条件翻译和实体写入共用。

use std::collections::{HashMap, HashSet};
use std::str::FromStr;
use std::sync::Arc;

use bridge_errors::{AppError, AppResult};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use crate::schema::{ColumnSchema, SemanticType, TableSchema};
use crate::sql::SqlParam;
use crate::value::Value;

/// 类型转换函数
pub type Setter = fn(&ColumnSchema, &Value) -> AppResult<SqlParam>;

/// 按语义类型选择转换函数
pub fn setter_for(semantic: SemanticType) -> Setter {
    match semantic {
        SemanticType::String => set_string,
        SemanticType::Integer | SemanticType::Reference => set_integer,
        SemanticType::Decimal => set_decimal,
        SemanticType::Boolean => set_boolean,
        SemanticType::YesNo => set_yes_no,
        SemanticType::Date | SemanticType::Timestamp => set_timestamp,
    }
}

/// 将值转换为该列的绑定参数
pub fn coerce(column: &ColumnSchema, value: &Value) -> AppResult<SqlParam> {
    setter_for(column.semantic)(column, value)
}

fn mismatch(column: &ColumnSchema, value: &Value) -> AppError {
    AppError::validation(format!(
        "Invalid value for column {}: expected {}, got {}",
        column.name,
        column.semantic.as_str(),
        value.type_name()
    ))
}

fn set_string(column: &ColumnSchema, value: &Value) -> AppResult<SqlParam> {
    match value {
        Value::Null => Ok(SqlParam::Null(column.semantic)),
        Value::Timestamp(_) => Err(mismatch(column, value)),
        other => other
            .as_text()
            .map(SqlParam::Text)
            .ok_or_else(|| mismatch(column, value)),
    }
}

fn set_integer(column: &ColumnSchema, value: &Value) -> AppResult<SqlParam> {
    match value {
        Value::Null => Ok(SqlParam::Null(column.semantic)),
        Value::Integer(i) | Value::Reference(i) => Ok(SqlParam::Integer(*i)),
        Value::Decimal(d) if d.fract().is_zero() => d
            .to_i64()
            .map(SqlParam::Integer)
            .ok_or_else(|| mismatch(column, value)),
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map(SqlParam::Integer)
            .map_err(|_| mismatch(column, value)),
        _ => Err(mismatch(column, value)),
    }
}

fn set_decimal(column: &ColumnSchema, value: &Value) -> AppResult<SqlParam> {
    match value {
        Value::Null => Ok(SqlParam::Null(column.semantic)),
        Value::Decimal(d) => Ok(SqlParam::Decimal(*d)),
        Value::Integer(i) | Value::Reference(i) => Ok(SqlParam::Decimal(Decimal::from(*i))),
        Value::String(s) => Decimal::from_str(s.trim())
            .map(SqlParam::Decimal)
            .map_err(|_| mismatch(column, value)),
        _ => Err(mismatch(column, value)),
    }
}

fn parse_flag(value: &Value) -> Option<bool> {
    match value {
        Value::Boolean(b) => Some(*b),
        Value::String(s) => match s.trim().to_ascii_uppercase().as_str() {
            "Y" | "TRUE" => Some(true),
            "N" | "FALSE" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn set_boolean(column: &ColumnSchema, value: &Value) -> AppResult<SqlParam> {
    if value.is_null() {
        return Ok(SqlParam::Null(column.semantic));
    }
    parse_flag(value)
        .map(SqlParam::Boolean)
        .ok_or_else(|| mismatch(column, value))
}

fn set_yes_no(column: &ColumnSchema, value: &Value) -> AppResult<SqlParam> {
    if value.is_null() {
        return Ok(SqlParam::Null(column.semantic));
    }
    parse_flag(value)
        .map(|b| SqlParam::Text(if b { "Y" } else { "N" }.to_string()))
        .ok_or_else(|| mismatch(column, value))
}

fn millis_to_naive(millis: i64) -> Option<NaiveDateTime> {
    DateTime::from_timestamp_millis(millis).map(|dt| dt.naive_utc())
}

fn set_timestamp(column: &ColumnSchema, value: &Value) -> AppResult<SqlParam> {
    let parsed = match value {
        Value::Null => return Ok(SqlParam::Null(column.semantic)),
        Value::Timestamp(ms) | Value::Integer(ms) => millis_to_naive(*ms),
        Value::String(s) => {
            let s = s.trim();
            DateTime::parse_from_rfc3339(s)
                .map(|dt| dt.naive_utc())
                .ok()
                .or_else(|| {
                    NaiveDate::parse_from_str(s, "%Y-%m-%d")
                        .ok()
                        .and_then(|d| d.and_hms_opt(0, 0, 0))
                })
        }
        _ => None,
    };
    parsed
        .map(SqlParam::Timestamp)
        .ok_or_else(|| mismatch(column, value))
}

/// 一次列赋值
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    /// 规范列名
    pub column: String,
    pub param: SqlParam,
}

/// 表级赋值表
#[derive(Debug, Clone)]
pub struct SetterTable {
    schema: Arc<TableSchema>,
    setters: HashMap<String, (usize, Setter)>,
}

impl SetterTable {
    pub fn for_schema(schema: Arc<TableSchema>) -> Self {
        let setters = schema
            .columns()
            .iter()
            .enumerate()
            .map(|(i, c)| (c.name.to_lowercase(), (i, setter_for(c.semantic))))
            .collect();
        Self { schema, setters }
    }

    pub fn schema(&self) -> &Arc<TableSchema> {
        &self.schema
    }

    fn resolve(&self, column_name: &str) -> AppResult<(&ColumnSchema, Setter)> {
        let key = column_name.trim().to_lowercase();
        if key.is_empty() {
            return Err(AppError::validation(format!(
                "Column name is required for table {}",
                self.schema.name()
            )));
        }
        self.setters
            .get(&key)
            .map(|&(i, setter)| (&self.schema.columns()[i], setter))
            .ok_or_else(|| {
                AppError::validation(format!(
                    "Unknown column {} for table {}",
                    column_name,
                    self.schema.name()
                ))
            })
    }

    fn convert(&self, column: &ColumnSchema, setter: Setter, value: &Value) -> AppResult<Assignment> {
        if value.is_null() && !column.nullable {
            return Err(AppError::validation(format!(
                "Column {} is mandatory",
                column.name
            )));
        }
        Ok(Assignment {
            column: column.name.clone(),
            param: setter(column, value)?,
        })
    }

    /// 调用方赋值：拒绝主键列和系统维护列
    pub fn assign(&self, column_name: &str, value: &Value) -> AppResult<Assignment> {
        let (column, setter) = self.resolve(column_name)?;
        if column.name == self.schema.key_column() {
            return Err(AppError::validation(format!(
                "Key column {} cannot be set",
                column.name
            )));
        }
        if !column.updatable {
            return Err(AppError::validation(format!(
                "Column {} is not updatable",
                column.name
            )));
        }
        self.convert(column, setter, value)
    }

    /// 批量赋值，同一列（大小写不敏感）只能出现一次
    pub fn assign_all<'a>(
        &self,
        attributes: impl IntoIterator<Item = (&'a str, &'a Value)>,
    ) -> AppResult<Vec<Assignment>> {
        let mut seen = HashSet::new();
        let mut assignments = Vec::new();
        for (name, value) in attributes {
            let assignment = self.assign(name, value)?;
            if !seen.insert(assignment.column.clone()) {
                return Err(AppError::validation(format!(
                    "Column {} assigned more than once",
                    assignment.column
                )));
            }
            assignments.push(assignment);
        }
        Ok(assignments)
    }

    /// 系统赋值（上下文戳记），跳过可更新检查；表中没有该列时返回 None
    pub fn stamp(&self, column_name: &str, value: &Value) -> AppResult<Option<Assignment>> {
        match self.resolve(column_name) {
            Ok((column, setter)) => self.convert(column, setter, value).map(Some),
            Err(_) => Ok(None),
        }
    }
}
