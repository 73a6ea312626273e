//! bridge-adapter-postgres - PostgreSQL 适配器
//!
//! `bridge-ports` 中各 trait 的 sqlx 实现

mod attachment_store;
mod bind;
mod connection;
mod entity_repository;
mod error_mapper;
mod record_source;
mod row;
mod schema_catalog;
mod transaction;

pub use attachment_store::*;
pub use bind::*;
pub use connection::*;
pub use entity_repository::*;
pub use error_mapper::*;
pub use record_source::*;
pub use row::*;
pub use schema_catalog::*;
pub use transaction::*;
