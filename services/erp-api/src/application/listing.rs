//! 列表查询流程
//!
//! 校验 -> 表结构 -> 条件翻译 -> 访问限制 -> 分页 -> 计数与取页

use std::sync::Arc;

use bridge_common::RequestContext;
use bridge_errors::AppResult;
use bridge_ports::{RecordSource, SchemaCatalog};
use bridge_query::paging::resolve_page;
use bridge_query::validate::require_table_name;
use bridge_query::{
    AccessMode, AccessRestrictionInjector, Condition, Criteria, ListingStatement, PageLimits,
    Record, TokenScope, translate,
};
use tracing::{Instrument, debug, debug_span};

/// 调用方给出的列表参数
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListParams {
    pub criteria: Criteria,
    pub page_size: i32,
    pub page_token: Option<String>,
}

/// 一次列表查询：表、调用方参数、固定过滤条件
#[derive(Debug, Clone, PartialEq)]
pub struct ListQuery {
    pub table_name: String,
    pub params: ListParams,
    pub base: Vec<Condition>,
}

impl ListQuery {
    pub fn new(table_name: impl Into<String>, params: ListParams) -> Self {
        Self {
            table_name: table_name.into(),
            params,
            base: Vec::new(),
        }
    }

    /// 追加固定过滤条件（与调用方条件 AND 组合）
    pub fn with_base(mut self, condition: Condition) -> Self {
        self.base.push(condition);
        self
    }

    fn effective_criteria(&self) -> Criteria {
        let mut criteria = self.params.criteria.clone();
        let mut conditions = self.base.clone();
        conditions.append(&mut criteria.conditions);
        criteria.conditions = conditions;
        criteria
    }
}

/// 一页结果
#[derive(Debug, Clone, PartialEq)]
pub struct ListPage {
    pub total: u64,
    pub records: Vec<Record>,
    pub next_page_token: Option<String>,
}

pub struct ListingHandler {
    catalog: Arc<dyn SchemaCatalog>,
    source: Arc<dyn RecordSource>,
    injector: AccessRestrictionInjector,
    limits: PageLimits,
}

impl ListingHandler {
    pub fn new(
        catalog: Arc<dyn SchemaCatalog>,
        source: Arc<dyn RecordSource>,
        injector: AccessRestrictionInjector,
        limits: PageLimits,
    ) -> Self {
        Self {
            catalog,
            source,
            injector,
            limits,
        }
    }

    pub async fn list(&self, ctx: &RequestContext, query: ListQuery) -> AppResult<ListPage> {
        let table_name = require_table_name(&query.table_name)?;
        let schema = self.catalog.table_schema(table_name).await?;

        let criteria = query.effective_criteria();
        let filter = translate(&schema, &criteria)?;
        let filter = self
            .injector
            .inject(ctx, schema.name(), filter, AccessMode::ReadOnly)
            .await?;

        let statement = ListingStatement::new(schema, filter, &criteria.order_by)?;
        let scope = TokenScope::new(ctx.session_id.clone(), statement.fingerprint());
        let page = resolve_page(
            query.params.page_token.as_deref(),
            query.params.page_size,
            &self.limits,
            &scope,
        );

        let span = debug_span!(
            "list",
            table = %statement.schema().name(),
            page = page.number,
            size = page.size,
        );
        async {
            let total = self.source.count(&statement).await?;
            let records = if page.offset() < total {
                self.source.fetch(&statement, &page).await?
            } else {
                Vec::new()
            };
            debug!(total, returned = records.len(), "Listed page");

            Ok(ListPage {
                total,
                next_page_token: page.next_page_token(total, &scope),
                records,
            })
        }
        .instrument(span)
        .await
    }
}
