//! 请求校验

use bridge_common::utils::is_sql_identifier;
use bridge_errors::{AppError, AppResult};

/// 表名必填且必须是合法标识符，返回去除空白后的表名
pub fn require_table_name(table_name: &str) -> AppResult<&str> {
    let name = table_name.trim();
    if name.is_empty() {
        return Err(AppError::validation("table_name is required"));
    }
    if !is_sql_identifier(name) {
        return Err(AppError::validation(format!("Invalid table_name: {}", name)));
    }
    Ok(name)
}

/// 记录 ID 必须为正数
pub fn require_id(field: &str, id: i64) -> AppResult<i64> {
    if id <= 0 {
        return Err(AppError::validation(format!(
            "{} must be a positive id, got {}",
            field, id
        )));
    }
    Ok(id)
}

/// 必填文本字段
pub fn require_text<'a>(field: &str, value: &'a str) -> AppResult<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::validation(format!("{} is required", field)));
    }
    Ok(trimmed)
}

/// 必填消息体
pub fn require_present<T>(field: &str, value: Option<T>) -> AppResult<T> {
    value.ok_or_else(|| AppError::validation(format!("{} is required", field)))
}
