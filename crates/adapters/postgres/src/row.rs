//! PgRow 单元格读取
//!
//! 按数据库实际列类型读取，时间值按 UTC 墙钟换算为毫秒时间戳

use bridge_query::{CellError, CellReader};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use sqlx::postgres::PgRow;
use sqlx::{Column, Decode, Postgres, Row, Type, TypeInfo};

pub struct PgCellReader<'r> {
    row: &'r PgRow,
}

impl<'r> PgCellReader<'r> {
    pub fn new(row: &'r PgRow) -> Self {
        Self { row }
    }

    fn type_name(&self, column: &str) -> Result<String, CellError> {
        self.row
            .try_column(column)
            .map(|c| c.type_info().name().to_string())
            .map_err(|e| CellError::new(column, e.to_string()))
    }

    fn get<T>(&self, column: &str) -> Result<Option<T>, CellError>
    where
        T: for<'a> Decode<'a, Postgres> + Type<Postgres>,
    {
        self.row
            .try_get::<Option<T>, _>(column)
            .map_err(|e| CellError::new(column, e.to_string()))
    }

    fn unsupported(column: &str, type_name: &str, target: &str) -> CellError {
        CellError::new(column, format!("cannot read {} as {}", type_name, target))
    }
}

impl CellReader for PgCellReader<'_> {
    fn read_string(&self, column: &str) -> Result<Option<String>, CellError> {
        match self.type_name(column)?.as_str() {
            "TEXT" | "VARCHAR" | "BPCHAR" | "CHAR" | "NAME" => self.get::<String>(column),
            other => Err(Self::unsupported(column, other, "string")),
        }
    }

    fn read_integer(&self, column: &str) -> Result<Option<i64>, CellError> {
        match self.type_name(column)?.as_str() {
            "INT2" => Ok(self.get::<i16>(column)?.map(i64::from)),
            "INT4" => Ok(self.get::<i32>(column)?.map(i64::from)),
            "INT8" => self.get::<i64>(column),
            "NUMERIC" => self
                .get::<Decimal>(column)?
                .map(|d| {
                    d.fract()
                        .is_zero()
                        .then(|| d.to_i64())
                        .flatten()
                        .ok_or_else(|| CellError::new(column, format!("{} is not an integer", d)))
                })
                .transpose(),
            other => Err(Self::unsupported(column, other, "integer")),
        }
    }

    fn read_decimal(&self, column: &str) -> Result<Option<Decimal>, CellError> {
        match self.type_name(column)?.as_str() {
            "NUMERIC" => self.get::<Decimal>(column),
            "INT2" | "INT4" | "INT8" => Ok(self.read_integer(column)?.map(Decimal::from)),
            "FLOAT4" => self
                .get::<f32>(column)?
                .map(|f| Decimal::from_f32(f).ok_or_else(|| CellError::new(column, "float out of range")))
                .transpose(),
            "FLOAT8" => self
                .get::<f64>(column)?
                .map(|f| Decimal::from_f64(f).ok_or_else(|| CellError::new(column, "float out of range")))
                .transpose(),
            other => Err(Self::unsupported(column, other, "decimal")),
        }
    }

    fn read_boolean(&self, column: &str) -> Result<Option<bool>, CellError> {
        match self.type_name(column)?.as_str() {
            "BOOL" => self.get::<bool>(column),
            other => Err(Self::unsupported(column, other, "boolean")),
        }
    }

    fn read_timestamp_millis(&self, column: &str) -> Result<Option<i64>, CellError> {
        match self.type_name(column)?.as_str() {
            "TIMESTAMPTZ" => Ok(self
                .get::<DateTime<Utc>>(column)?
                .map(|ts| ts.timestamp_millis())),
            "TIMESTAMP" => Ok(self
                .get::<NaiveDateTime>(column)?
                .map(|ts| ts.and_utc().timestamp_millis())),
            "DATE" => Ok(self
                .get::<NaiveDate>(column)?
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|ts| ts.and_utc().timestamp_millis())),
            other => Err(Self::unsupported(column, other, "timestamp")),
        }
    }
}

/// 读取 `RETURNING` 或计数语句的首列整数
pub fn first_i64(row: &PgRow) -> Result<i64, CellError> {
    let column = row
        .columns()
        .first()
        .map(|c| c.name().to_string())
        .ok_or_else(|| CellError::new("?column?", "empty row"))?;
    PgCellReader::new(row)
        .read_integer(&column)?
        .ok_or_else(|| CellError::new(column, "unexpected NULL"))
}
