//! 行转换：结果行 -> 通用类型值
//!
//! 单元格转换失败只记录日志并跳过该列，整行和整页照常返回。

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use thiserror::Error;
use tracing::warn;

use crate::schema::{SemanticType, TableSchema};
use crate::value::Value;

/// 单元格读取错误
#[derive(Debug, Clone, Error, PartialEq)]
#[error("Cannot read column {column}: {reason}")]
pub struct CellError {
    pub column: String,
    pub reason: String,
}

impl CellError {
    pub fn new(column: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            reason: reason.into(),
        }
    }
}

/// 按类型读取结果行中的单元格，`Ok(None)` 表示数据库 NULL
///
/// 时间值以毫秒时间戳返回，不做时区换算。
pub trait CellReader {
    fn read_string(&self, column: &str) -> Result<Option<String>, CellError>;
    fn read_integer(&self, column: &str) -> Result<Option<i64>, CellError>;
    fn read_decimal(&self, column: &str) -> Result<Option<Decimal>, CellError>;
    fn read_boolean(&self, column: &str) -> Result<Option<bool>, CellError>;
    fn read_timestamp_millis(&self, column: &str) -> Result<Option<i64>, CellError>;
}

/// 转换后的记录
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    /// 主键值（主键列读取失败时为 None）
    pub id: Option<i64>,
    pub values: BTreeMap<String, Value>,
}

impl Record {
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.values.get(column)
    }
}

fn read_yes_no<R: CellReader + ?Sized>(row: &R, column: &str) -> Result<Option<bool>, CellError> {
    match row.read_string(column)? {
        None => Ok(None),
        Some(flag) => match flag.trim() {
            "Y" | "y" => Ok(Some(true)),
            "N" | "n" => Ok(Some(false)),
            other => Err(CellError::new(column, format!("invalid Y/N flag '{}'", other))),
        },
    }
}

fn read_cell<R: CellReader + ?Sized>(
    row: &R,
    column: &str,
    semantic: SemanticType,
) -> Result<Value, CellError> {
    let value = match semantic {
        SemanticType::String => row.read_string(column)?.map(Value::String),
        SemanticType::Integer => row.read_integer(column)?.map(Value::Integer),
        SemanticType::Reference => row.read_integer(column)?.map(Value::Reference),
        SemanticType::Decimal => row.read_decimal(column)?.map(Value::Decimal),
        SemanticType::Boolean => row.read_boolean(column)?.map(Value::Boolean),
        SemanticType::YesNo => read_yes_no(row, column)?.map(Value::Boolean),
        SemanticType::Date | SemanticType::Timestamp => {
            row.read_timestamp_millis(column)?.map(Value::Timestamp)
        }
    };
    Ok(value.unwrap_or(Value::Null))
}

/// 按表结构转换一行
pub fn convert_row<R: CellReader + ?Sized>(schema: &TableSchema, row: &R) -> Record {
    let mut record = Record::default();
    for column in schema.columns() {
        match read_cell(row, &column.name, column.semantic) {
            Ok(value) => {
                if column.name == schema.key_column() {
                    record.id = match &value {
                        Value::Integer(id) | Value::Reference(id) => Some(*id),
                        _ => None,
                    };
                }
                record.values.insert(column.name.clone(), value);
            }
            Err(e) => {
                warn!(
                    table = schema.name(),
                    column = %column.name,
                    error = %e,
                    "Cell conversion failed, column omitted"
                );
            }
        }
    }
    record
}
