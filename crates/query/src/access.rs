//! 访问限制注入
//!
//! 行级安全谓词由外部安全引擎生成，这里只负责以正确的模式调用它，
//! 并将结果与已有条件 AND 组合（从不替换）。

use std::sync::Arc;

use async_trait::async_trait;
use bridge_common::RequestContext;
use bridge_errors::AppResult;
use tracing::debug;

use crate::sql::SqlFragment;

/// 访问模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessMode {
    /// 列表、查询
    ReadOnly,
    /// 更新、删除
    ReadWrite,
}

/// 列引用的限定方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Qualification {
    /// `table.column`
    FullyQualified,
    /// `column`
    Unqualified,
}

/// 角色安全引擎
#[async_trait]
pub trait SecurityEngine: Send + Sync {
    /// 返回调用方对该表的行限制；无限制时返回空片段
    async fn restriction(
        &self,
        ctx: &RequestContext,
        table_name: &str,
        mode: AccessMode,
        qualification: Qualification,
    ) -> AppResult<SqlFragment>;
}

#[derive(Clone)]
pub struct AccessRestrictionInjector {
    engine: Arc<dyn SecurityEngine>,
}

impl AccessRestrictionInjector {
    pub fn new(engine: Arc<dyn SecurityEngine>) -> Self {
        Self { engine }
    }

    /// 当前调用方的限制片段（全限定列名）
    pub async fn restriction_for(
        &self,
        ctx: &RequestContext,
        table_name: &str,
        mode: AccessMode,
    ) -> AppResult<SqlFragment> {
        self.engine
            .restriction(ctx, table_name, mode, Qualification::FullyQualified)
            .await
    }

    /// 在已有条件上追加访问限制
    pub async fn inject(
        &self,
        ctx: &RequestContext,
        table_name: &str,
        filter: SqlFragment,
        mode: AccessMode,
    ) -> AppResult<SqlFragment> {
        let restriction = self.restriction_for(ctx, table_name, mode).await?;
        debug!(
            table = table_name,
            ?mode,
            restricted = !restriction.is_empty(),
            "Access restriction applied"
        );
        Ok(filter.and(restriction))
    }
}
