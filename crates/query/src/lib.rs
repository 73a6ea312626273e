//! bridge-query - 通用列表查询层
//!
//! 所有列表接口共用的查询流程：
//! 请求校验 -> 条件翻译为参数化 WHERE -> 注入访问限制 -> 分页 -> 行转换

pub mod access;
pub mod convert;
pub mod criteria;
pub mod paging;
pub mod schema;
pub mod setter;
pub mod sql;
pub mod statement;
pub mod translator;
pub mod validate;
pub mod value;

pub use access::{AccessMode, AccessRestrictionInjector, Qualification, SecurityEngine};
pub use convert::{CellError, CellReader, Record, convert_row};
pub use criteria::{Condition, Criteria, Operator, OrderBy};
pub use paging::{PageLimits, PageRequest, TokenScope};
pub use schema::{ColumnSchema, SemanticType, TableSchema};
pub use setter::{Assignment, SetterTable};
pub use sql::{SqlFragment, SqlParam};
pub use statement::{EntityStatements, ListingStatement};
pub use translator::translate;
pub use value::Value;
