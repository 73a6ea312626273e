//! bridge-ports - 外部协作方的抽象 trait 层
//!
//! ERP 持久层、附件存储等外部系统只通过这里的接口访问

mod attachment_store;
mod entity_repository;
mod record_source;
mod schema_catalog;

pub use attachment_store::*;
pub use entity_repository::*;
pub use record_source::*;
pub use schema_catalog::*;
