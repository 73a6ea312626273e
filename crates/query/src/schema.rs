//! 表结构元数据
//!
//! 列名只从这里进入 SQL 文本，调用方给出的列名仅用于查找。

use std::collections::HashMap;

use bridge_common::utils::is_sql_identifier;
use bridge_errors::{AppError, AppResult};

/// 参与全文搜索的列（按表结构顺序取存在的文本列）
pub const SEARCH_COLUMNS: [&str; 4] = ["value", "name", "code", "documentno"];

/// 由系统维护、调用方不可直接写入的列
pub const SYSTEM_MANAGED_COLUMNS: [&str; 5] =
    ["ad_client_id", "created", "createdby", "updated", "updatedby"];

/// 列的语义类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SemanticType {
    String,
    Integer,
    Decimal,
    Boolean,
    /// CHAR(1) 'Y'/'N' 标志列
    YesNo,
    Date,
    Timestamp,
    /// 外键
    Reference,
}

impl SemanticType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SemanticType::String => "string",
            SemanticType::Integer => "integer",
            SemanticType::Decimal => "decimal",
            SemanticType::Boolean => "boolean",
            SemanticType::YesNo => "yes/no",
            SemanticType::Date => "date",
            SemanticType::Timestamp => "timestamp",
            SemanticType::Reference => "reference",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSchema {
    pub name: String,
    pub semantic: SemanticType,
    pub nullable: bool,
    pub updatable: bool,
}

impl ColumnSchema {
    pub fn new(name: impl Into<String>, semantic: SemanticType) -> Self {
        Self {
            name: name.into(),
            semantic,
            nullable: true,
            updatable: true,
        }
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn read_only(mut self) -> Self {
        self.updatable = false;
        self
    }
}

/// 表结构
#[derive(Debug, Clone)]
pub struct TableSchema {
    name: String,
    key_column: String,
    columns: Vec<ColumnSchema>,
    index: HashMap<String, usize>,
}

impl TableSchema {
    pub fn new(
        name: impl Into<String>,
        key_column: &str,
        columns: Vec<ColumnSchema>,
    ) -> AppResult<Self> {
        let name = name.into();
        if !is_sql_identifier(&name) {
            return Err(AppError::validation(format!("Invalid table name: {}", name)));
        }

        let mut index = HashMap::with_capacity(columns.len());
        for (i, column) in columns.iter().enumerate() {
            if !is_sql_identifier(&column.name) {
                return Err(AppError::validation(format!(
                    "Invalid column name {} in table {}",
                    column.name, name
                )));
            }
            index.insert(column.name.to_lowercase(), i);
        }

        let key = index
            .get(&key_column.to_lowercase())
            .map(|&i| columns[i].name.clone())
            .ok_or_else(|| {
                AppError::not_found(format!("Key column {} not found in table {}", key_column, name))
            })?;

        Ok(Self {
            name,
            key_column: key,
            columns,
            index,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn key_column(&self) -> &str {
        &self.key_column
    }

    pub fn columns(&self) -> &[ColumnSchema] {
        &self.columns
    }

    /// 按名称查找列（大小写不敏感）
    pub fn column(&self, name: &str) -> Option<&ColumnSchema> {
        self.index
            .get(&name.trim().to_lowercase())
            .map(|&i| &self.columns[i])
    }

    /// 查找列，不存在时返回校验错误
    pub fn require_column(&self, name: &str) -> AppResult<&ColumnSchema> {
        if name.trim().is_empty() {
            return Err(AppError::validation(format!(
                "Column name is required for table {}",
                self.name
            )));
        }
        self.column(name).ok_or_else(|| {
            AppError::validation(format!("Unknown column {} for table {}", name, self.name))
        })
    }

    /// 全文搜索列
    pub fn search_columns(&self) -> impl Iterator<Item = &ColumnSchema> {
        self.columns.iter().filter(|c| {
            c.semantic == SemanticType::String
                && SEARCH_COLUMNS.contains(&c.name.to_lowercase().as_str())
        })
    }
}

/// 是否为系统维护列
pub fn is_system_managed(column: &str) -> bool {
    SYSTEM_MANAGED_COLUMNS.contains(&column.to_lowercase().as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bank_statement() -> TableSchema {
        TableSchema::new(
            "C_BankStatement",
            "c_bankstatement_id",
            vec![
                ColumnSchema::new("C_BankStatement_ID", SemanticType::Integer).not_null(),
                ColumnSchema::new("Name", SemanticType::String),
                ColumnSchema::new("DocumentNo", SemanticType::String),
                ColumnSchema::new("StatementDifference", SemanticType::Decimal),
                ColumnSchema::new("Code", SemanticType::Integer),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let schema = bank_statement();
        assert_eq!(schema.column("name").unwrap().name, "Name");
        assert_eq!(schema.column(" DOCUMENTNO ").unwrap().name, "DocumentNo");
        assert_eq!(schema.key_column(), "C_BankStatement_ID");
    }

    #[test]
    fn test_require_column_errors() {
        let schema = bank_statement();
        assert!(matches!(schema.require_column(""), Err(AppError::Validation(_))));
        let err = schema.require_column("Amount").unwrap_err();
        assert!(err.to_string().contains("Amount"));
    }

    #[test]
    fn test_search_columns_only_text() {
        let schema = bank_statement();
        let names: Vec<_> = schema.search_columns().map(|c| c.name.as_str()).collect();
        // Code 是整数列，不参与搜索
        assert_eq!(names, vec!["Name", "DocumentNo"]);
    }

    #[test]
    fn test_rejects_bad_identifiers() {
        assert!(TableSchema::new("bad table", "id", vec![]).is_err());
        let columns = vec![ColumnSchema::new("x; drop", SemanticType::String)];
        assert!(TableSchema::new("t", "x; drop", columns).is_err());
    }

    #[test]
    fn test_missing_key_column() {
        let columns = vec![ColumnSchema::new("name", SemanticType::String)];
        assert!(matches!(
            TableSchema::new("t", "t_id", columns),
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn test_system_managed_columns() {
        assert!(is_system_managed("CreatedBy"));
        assert!(is_system_managed("ad_client_id"));
        assert!(!is_system_managed("ad_org_id"));
    }
}
