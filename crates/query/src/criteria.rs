//! 结构化过滤条件

use crate::value::Value;

/// 条件运算符
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Equal,
    NotEqual,
    Like,
    NotLike,
    Greater,
    GreaterEqual,
    Less,
    LessEqual,
    Between,
    In,
    NotIn,
    Null,
    NotNull,
}

impl Operator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Equal => "EQUAL",
            Operator::NotEqual => "NOT_EQUAL",
            Operator::Like => "LIKE",
            Operator::NotLike => "NOT_LIKE",
            Operator::Greater => "GREATER",
            Operator::GreaterEqual => "GREATER_EQUAL",
            Operator::Less => "LESS",
            Operator::LessEqual => "LESS_EQUAL",
            Operator::Between => "BETWEEN",
            Operator::In => "IN",
            Operator::NotIn => "NOT_IN",
            Operator::Null => "NULL",
            Operator::NotNull => "NOT_NULL",
        }
    }
}

/// 单个条件：列、运算符、值（区间上界、列表值）
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub column_name: String,
    pub operator: Operator,
    pub value: Value,
    pub value_to: Value,
    pub values: Vec<Value>,
}

impl Condition {
    pub fn new(column_name: impl Into<String>, operator: Operator, value: impl Into<Value>) -> Self {
        Self {
            column_name: column_name.into(),
            operator,
            value: value.into(),
            value_to: Value::Null,
            values: Vec::new(),
        }
    }

    pub fn equal(column_name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(column_name, Operator::Equal, value)
    }

    pub fn like(column_name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(column_name, Operator::Like, value)
    }

    pub fn between(
        column_name: impl Into<String>,
        from: impl Into<Value>,
        to: impl Into<Value>,
    ) -> Self {
        Self {
            value_to: to.into(),
            ..Self::new(column_name, Operator::Between, from)
        }
    }

    pub fn one_of(column_name: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            values,
            ..Self::new(column_name, Operator::In, Value::Null)
        }
    }

    pub fn is_null(column_name: impl Into<String>) -> Self {
        Self::new(column_name, Operator::Null, Value::Null)
    }
}

/// 排序
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub column_name: String,
    pub descending: bool,
}

impl OrderBy {
    pub fn asc(column_name: impl Into<String>) -> Self {
        Self {
            column_name: column_name.into(),
            descending: false,
        }
    }

    pub fn desc(column_name: impl Into<String>) -> Self {
        Self {
            column_name: column_name.into(),
            descending: true,
        }
    }
}

/// 一次请求的过滤条件集合（AND 语义）
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Criteria {
    pub conditions: Vec<Condition>,
    pub search_value: Option<String>,
    pub order_by: Vec<OrderBy>,
}

impl Criteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn search(mut self, value: impl Into<String>) -> Self {
        self.search_value = Some(value.into());
        self
    }

    pub fn order(mut self, order: OrderBy) -> Self {
        self.order_by.push(order);
        self
    }

    /// 非空白的搜索值
    pub fn effective_search(&self) -> Option<&str> {
        self.search_value
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}
