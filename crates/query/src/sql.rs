//! SQL 片段：语句骨架与绑定参数分离
//!
//! 骨架中使用 `?` 占位，最终渲染时才编号为 PostgreSQL 的 `$n`。
//! 调用方提供的值只能以 [`SqlParam`] 的形式出现。

use chrono::NaiveDateTime;
use rust_decimal::Decimal;

use crate::schema::SemanticType;

/// 带类型标签的绑定参数
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    /// 空值，保留列类型以便绑定带类型的 NULL
    Null(SemanticType),
    Text(String),
    Integer(i64),
    Decimal(Decimal),
    Boolean(bool),
    Timestamp(NaiveDateTime),
}

impl SqlParam {
    /// 稳定的文本表示，用于分页令牌指纹
    pub fn canonical(&self) -> String {
        match self {
            SqlParam::Null(t) => format!("NULL({})", t.as_str()),
            SqlParam::Text(s) => format!("STR({})", s),
            SqlParam::Integer(i) => format!("INT({})", i),
            SqlParam::Decimal(d) => format!("DEC({})", d.normalize()),
            SqlParam::Boolean(b) => format!("BOOL({})", b),
            SqlParam::Timestamp(ts) => format!("TS({})", ts.format("%Y-%m-%dT%H:%M:%S%.f")),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SqlFragment {
    sql: String,
    params: Vec<SqlParam>,
}

impl SqlFragment {
    pub fn new(sql: impl Into<String>, params: Vec<SqlParam>) -> Self {
        let sql = sql.into();
        debug_assert_eq!(
            count_placeholders(&sql),
            params.len(),
            "placeholder count mismatch in `{}`",
            sql
        );
        Self { sql, params }
    }

    /// 不带参数的片段
    pub fn raw(sql: impl Into<String>) -> Self {
        Self::new(sql, Vec::new())
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.sql.trim().is_empty()
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn params(&self) -> &[SqlParam] {
        &self.params
    }

    pub fn into_parts(self) -> (String, Vec<SqlParam>) {
        (self.sql, self.params)
    }

    /// 用括号包裹，便于与其他条件安全组合
    pub fn grouped(self) -> Self {
        if self.is_empty() {
            return self;
        }
        Self {
            sql: format!("({})", self.sql),
            params: self.params,
        }
    }

    /// 以 AND 连接各片段，跳过空片段；各片段的分组由调用方负责
    pub fn conjunction(parts: impl IntoIterator<Item = SqlFragment>) -> Self {
        let mut sql = String::new();
        let mut params = Vec::new();
        for part in parts.into_iter().filter(|p| !p.is_empty()) {
            if !sql.is_empty() {
                sql.push_str(" AND ");
            }
            sql.push_str(&part.sql);
            params.extend(part.params);
        }
        Self { sql, params }
    }

    /// AND 组合两个片段，两侧分别加括号
    pub fn and(self, other: SqlFragment) -> Self {
        match (self.is_empty(), other.is_empty()) {
            (true, _) => other,
            (_, true) => self,
            _ => Self::conjunction([self.grouped(), other.grouped()]),
        }
    }

    /// 追加 SQL 文本与参数
    pub fn push(&mut self, sql: &str, params: impl IntoIterator<Item = SqlParam>) {
        self.sql.push_str(sql);
        self.params.extend(params);
    }

    /// 渲染为 PostgreSQL 语句（`?` -> `$1..$n`）
    pub fn to_postgres(&self) -> String {
        number_placeholders(&self.sql)
    }
}

/// 统计单引号字面量之外的 `?` 个数
pub fn count_placeholders(sql: &str) -> usize {
    let mut in_literal = false;
    let mut count = 0;
    for c in sql.chars() {
        match c {
            '\'' => in_literal = !in_literal,
            '?' if !in_literal => count += 1,
            _ => {}
        }
    }
    count
}

/// 将单引号字面量之外的 `?` 依次替换为 `$1`、`$2`...
pub fn number_placeholders(sql: &str) -> String {
    let mut out = String::with_capacity(sql.len() + 8);
    let mut in_literal = false;
    let mut next = 1;
    for c in sql.chars() {
        match c {
            '\'' => {
                in_literal = !in_literal;
                out.push(c);
            }
            '?' if !in_literal => {
                out.push('$');
                out.push_str(&next.to_string());
                next += 1;
            }
            _ => out.push(c),
        }
    }
    out
}
