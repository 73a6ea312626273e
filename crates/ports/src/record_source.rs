//! 列表查询执行

use async_trait::async_trait;
use bridge_errors::AppResult;
use bridge_query::{ListingStatement, PageRequest, Record};

/// 执行列表语句
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// 满足条件的总行数（不带 LIMIT/OFFSET）
    async fn count(&self, statement: &ListingStatement) -> AppResult<u64>;

    /// 取一页记录
    async fn fetch(&self, statement: &ListingStatement, page: &PageRequest) -> AppResult<Vec<Record>>;
}
