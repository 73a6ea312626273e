//! 绑定参数
//!
//! 把 [`SqlFragment`] 渲染为 `$n` 语句，并按参数标签逐个绑定

use bridge_errors::{AppError, AppResult};
use bridge_query::{SemanticType, SqlFragment, SqlParam};
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use sqlx::Arguments;
use sqlx::postgres::PgArguments;

/// 可执行语句：渲染后的 SQL 与绑定参数
pub struct BoundQuery {
    pub sql: String,
    pub arguments: PgArguments,
}

fn add_null(args: &mut PgArguments, semantic: SemanticType) -> Result<(), sqlx::error::BoxDynError> {
    match semantic {
        SemanticType::String | SemanticType::YesNo => args.add(Option::<String>::None),
        SemanticType::Integer | SemanticType::Reference => args.add(Option::<i64>::None),
        SemanticType::Decimal => args.add(Option::<Decimal>::None),
        SemanticType::Boolean => args.add(Option::<bool>::None),
        SemanticType::Date | SemanticType::Timestamp => args.add(Option::<NaiveDateTime>::None),
    }
}

/// 按标签绑定参数
pub fn arguments(params: &[SqlParam]) -> AppResult<PgArguments> {
    let mut args = PgArguments::default();
    for (i, param) in params.iter().enumerate() {
        let added = match param {
            SqlParam::Null(semantic) => add_null(&mut args, *semantic),
            SqlParam::Text(s) => args.add(s.clone()),
            SqlParam::Integer(n) => args.add(*n),
            SqlParam::Decimal(d) => args.add(*d),
            SqlParam::Boolean(b) => args.add(*b),
            SqlParam::Timestamp(ts) => args.add(*ts),
        };
        added.map_err(|e| AppError::internal(format!("Failed to bind parameter ${}: {}", i + 1, e)))?;
    }
    Ok(args)
}

/// 渲染并绑定
pub fn bind(fragment: &SqlFragment) -> AppResult<BoundQuery> {
    Ok(BoundQuery {
        sql: fragment.to_postgres(),
        arguments: arguments(fragment.params())?,
    })
}
