//! 单条实体的读写
//!
//! 写操作各自在一个事务内完成，出错回滚。

use async_trait::async_trait;
use bridge_errors::AppResult;
use bridge_query::{Assignment, EntityStatements, Record, SqlFragment};

#[async_trait]
pub trait EntityRepository: Send + Sync {
    /// 在限制条件内按主键查找
    async fn find(
        &self,
        statements: &EntityStatements,
        id: i64,
        restriction: SqlFragment,
    ) -> AppResult<Option<Record>>;

    /// 插入并在限制条件内回读新记录
    ///
    /// 新行不满足限制时回滚并返回 Forbidden。
    async fn insert(
        &self,
        statements: &EntityStatements,
        assignments: &[Assignment],
        restriction: SqlFragment,
    ) -> AppResult<Record>;

    /// 更新；限制之外或不存在的行返回 None
    async fn update(
        &self,
        statements: &EntityStatements,
        id: i64,
        assignments: &[Assignment],
        restriction: SqlFragment,
    ) -> AppResult<Option<Record>>;

    /// 删除；返回是否删除了行
    async fn delete(
        &self,
        statements: &EntityStatements,
        id: i64,
        restriction: SqlFragment,
    ) -> AppResult<bool>;

    /// 按匹配条件锁定首行并更新，没有匹配行时插入
    ///
    /// `updates` 用于两种情况，`inserts` 只在插入时追加。
    async fn upsert(
        &self,
        statements: &EntityStatements,
        matching: SqlFragment,
        updates: &[Assignment],
        inserts: &[Assignment],
    ) -> AppResult<Record>;
}
