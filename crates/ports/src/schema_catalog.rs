//! 表结构目录

use std::sync::Arc;

use async_trait::async_trait;
use bridge_errors::AppResult;
use bridge_query::TableSchema;

#[async_trait]
pub trait SchemaCatalog: Send + Sync {
    /// 加载表结构，表不存在时返回 NotFound
    async fn table_schema(&self, table_name: &str) -> AppResult<Arc<TableSchema>>;
}
