//! Proto 与领域类型互转

use std::collections::HashMap;
use std::str::FromStr;

use bridge_errors::{AppError, AppResult};
use bridge_query::{Condition, Criteria, Operator, OrderBy, Record, Value};
use rust_decimal::Decimal;

use crate::application::{ListPage, ListParams, PreferenceEntry};
use crate::common::v1 as proto;
use crate::common::v1::value::Kind;
use crate::erp::v1 as erp;

/// 未设置的值视为空值
pub fn value_from_proto(value: Option<&proto::Value>) -> AppResult<Value> {
    let Some(kind) = value.and_then(|v| v.kind.as_ref()) else {
        return Ok(Value::Null);
    };
    Ok(match kind {
        Kind::NullValue(_) => Value::Null,
        Kind::StringValue(s) => Value::String(s.clone()),
        Kind::IntegerValue(i) => Value::Integer(*i),
        Kind::DecimalValue(s) => Decimal::from_str(s.trim())
            .map(Value::Decimal)
            .map_err(|_| AppError::validation(format!("Invalid decimal value: {}", s)))?,
        Kind::BooleanValue(b) => Value::Boolean(*b),
        Kind::TimestampValue(ms) => Value::Timestamp(*ms),
        Kind::ReferenceValue(id) => Value::Reference(*id),
    })
}

pub fn value_to_proto(value: &Value) -> proto::Value {
    let kind = match value {
        Value::Null => Kind::NullValue(prost_types::NullValue::NullValue as i32),
        Value::String(s) => Kind::StringValue(s.clone()),
        Value::Integer(i) => Kind::IntegerValue(*i),
        Value::Decimal(d) => Kind::DecimalValue(d.to_string()),
        Value::Boolean(b) => Kind::BooleanValue(*b),
        Value::Timestamp(ms) => Kind::TimestampValue(*ms),
        Value::Reference(id) => Kind::ReferenceValue(*id),
    };
    proto::Value { kind: Some(kind) }
}

pub fn operator_from_proto(operator: i32) -> AppResult<Operator> {
    let operator = proto::Operator::try_from(operator)
        .map_err(|_| AppError::validation(format!("Unknown operator: {}", operator)))?;
    Ok(match operator {
        proto::Operator::Unspecified => {
            return Err(AppError::validation("Operator is required"));
        }
        proto::Operator::Equal => Operator::Equal,
        proto::Operator::NotEqual => Operator::NotEqual,
        proto::Operator::Like => Operator::Like,
        proto::Operator::NotLike => Operator::NotLike,
        proto::Operator::Greater => Operator::Greater,
        proto::Operator::GreaterEqual => Operator::GreaterEqual,
        proto::Operator::Less => Operator::Less,
        proto::Operator::LessEqual => Operator::LessEqual,
        proto::Operator::Between => Operator::Between,
        proto::Operator::In => Operator::In,
        proto::Operator::NotIn => Operator::NotIn,
        proto::Operator::Null => Operator::Null,
        proto::Operator::NotNull => Operator::NotNull,
    })
}

pub fn condition_from_proto(condition: &proto::Condition) -> AppResult<Condition> {
    Ok(Condition {
        column_name: condition.column_name.clone(),
        operator: operator_from_proto(condition.operator)?,
        value: value_from_proto(condition.value.as_ref())?,
        value_to: value_from_proto(condition.value_to.as_ref())?,
        values: condition
            .values
            .iter()
            .map(|v| value_from_proto(Some(v)))
            .collect::<AppResult<_>>()?,
    })
}

/// 列表请求；缺省时取第一页、默认页大小
pub fn list_params(list: Option<proto::ListRequest>) -> AppResult<ListParams> {
    let Some(list) = list else {
        return Ok(ListParams::default());
    };

    let mut criteria = Criteria::new();
    if let Some(c) = &list.criteria {
        criteria.conditions = c
            .conditions
            .iter()
            .map(condition_from_proto)
            .collect::<AppResult<_>>()?;
        criteria.order_by = c
            .order_by
            .iter()
            .map(|o| OrderBy {
                column_name: o.column_name.clone(),
                descending: o.descending,
            })
            .collect();
    }
    if !list.search_value.trim().is_empty() {
        criteria = criteria.search(list.search_value);
    }

    Ok(ListParams {
        criteria,
        page_size: list.page_size,
        page_token: Some(list.page_token).filter(|t| !t.trim().is_empty()),
    })
}

/// 属性按列名排序，保证赋值顺序稳定
pub fn attributes_from_proto(
    attributes: HashMap<String, proto::Value>,
) -> AppResult<Vec<(String, Value)>> {
    let mut converted = attributes
        .into_iter()
        .map(|(name, value)| Ok((name, value_from_proto(Some(&value))?)))
        .collect::<AppResult<Vec<_>>>()?;
    converted.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(converted)
}

pub fn entity_to_proto(table_name: &str, record: &Record) -> proto::Entity {
    proto::Entity {
        table_name: table_name.to_string(),
        id: record.id.unwrap_or_default(),
        values: record
            .values
            .iter()
            .map(|(column, value)| (column.clone(), value_to_proto(value)))
            .collect(),
    }
}

pub fn list_response(table_name: &str, page: ListPage) -> proto::ListEntitiesResponse {
    proto::ListEntitiesResponse {
        record_count: i64::try_from(page.total).unwrap_or(i64::MAX),
        records: page
            .records
            .iter()
            .map(|record| entity_to_proto(table_name, record))
            .collect(),
        next_page_token: page.next_page_token.unwrap_or_default(),
    }
}

pub fn preference_to_proto(entry: PreferenceEntry) -> erp::Preference {
    erp::Preference {
        id: entry.id,
        attribute: entry.attribute,
        value: entry.value,
        ad_window_id: entry.window_id.unwrap_or_default(),
    }
}

/// 0 表示未指定
pub fn optional_window(window_id: i64) -> AppResult<Option<i64>> {
    match window_id {
        0 => Ok(None),
        id if id > 0 => Ok(Some(id)),
        id => Err(AppError::validation(format!(
            "ad_window_id must be a positive id, got {}",
            id
        ))),
    }
}
