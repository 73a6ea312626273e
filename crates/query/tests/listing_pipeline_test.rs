//! 列表查询流程测试
//!
//! 本测试套件串联条件翻译、访问限制注入、语句构建和分页
//! 测试覆盖：
//! - 多页遍历的偏移量与令牌
//! - 计数语句与分页语句共用 WHERE
//! - 注入尝试只出现在绑定参数中
//! - 令牌不能跨会话、跨查询复用

use std::sync::Arc;

use async_trait::async_trait;
use bridge_common::RequestContext;
use bridge_errors::AppResult;
use bridge_query::paging::resolve_page;
use bridge_query::{
    AccessMode, AccessRestrictionInjector, ColumnSchema, Condition, Criteria, ListingStatement,
    PageLimits, Qualification, SecurityEngine, SemanticType, SqlFragment, SqlParam, TableSchema,
    TokenScope, translate,
};

/// 按租户限制的假安全引擎
struct ClientEngine;

#[async_trait]
impl SecurityEngine for ClientEngine {
    async fn restriction(
        &self,
        ctx: &RequestContext,
        table_name: &str,
        mode: AccessMode,
        qualification: Qualification,
    ) -> AppResult<SqlFragment> {
        assert_eq!(qualification, Qualification::FullyQualified);
        let sql = match mode {
            AccessMode::ReadOnly => format!("{}.ad_client_id IN (0, ?)", table_name),
            AccessMode::ReadWrite => format!("{}.ad_client_id = ?", table_name),
        };
        Ok(SqlFragment::new(sql, vec![SqlParam::Integer(ctx.client_id)]))
    }
}

fn bank_statement() -> Arc<TableSchema> {
    Arc::new(
        TableSchema::new(
            "c_bankstatement",
            "c_bankstatement_id",
            vec![
                ColumnSchema::new("c_bankstatement_id", SemanticType::Integer).not_null(),
                ColumnSchema::new("ad_client_id", SemanticType::Reference).read_only(),
                ColumnSchema::new("name", SemanticType::String),
                ColumnSchema::new("documentno", SemanticType::String),
                ColumnSchema::new("statementdifference", SemanticType::Decimal),
                ColumnSchema::new("c_bankaccount_id", SemanticType::Reference),
            ],
        )
        .unwrap(),
    )
}

fn ctx(session: &str) -> RequestContext {
    RequestContext::new(session, 11, 11, 102, 100)
}

async fn build_statement(criteria: &Criteria, ctx: &RequestContext) -> ListingStatement {
    let schema = bank_statement();
    let filter = translate(&schema, criteria).unwrap();
    let injector = AccessRestrictionInjector::new(Arc::new(ClientEngine));
    let filter = injector
        .inject(ctx, schema.name(), filter, AccessMode::ReadOnly)
        .await
        .unwrap();
    ListingStatement::new(schema, filter, &criteria.order_by).unwrap()
}

#[tokio::test]
async fn test_three_pages_of_twenty_five() {
    let ctx = ctx("sess-1");
    let criteria = Criteria::new().with(Condition::equal("C_BankAccount_ID", 100i64));
    let statement = build_statement(&criteria, &ctx).await;
    let scope = TokenScope::new(ctx.session_id.clone(), statement.fingerprint());
    let limits = PageLimits::default();

    let mut token: Option<String> = None;
    let mut offsets = Vec::new();
    loop {
        let page = resolve_page(token.as_deref(), 10, &limits, &scope);
        offsets.push(page.offset());
        token = page.next_page_token(25, &scope);
        if token.is_none() {
            break;
        }
    }
    assert_eq!(offsets, vec![0, 10, 20]);
}

#[tokio::test]
async fn test_count_matches_page_where() {
    let ctx = ctx("sess-1");
    let criteria = Criteria::new()
        .with(Condition::between("StatementDifference", 1i64, 10i64))
        .search("acme");
    let statement = build_statement(&criteria, &ctx).await;

    let count = statement.count_query();
    let page = statement.page_query(&bridge_query::PageRequest { number: 1, size: 20 });

    let where_clause = "WHERE ((statementdifference BETWEEN ? AND ?) AND \
                        (UPPER(name) LIKE '%'||UPPER(?)||'%' OR UPPER(documentno) LIKE '%'||UPPER(?)||'%')) \
                        AND (c_bankstatement.ad_client_id IN (0, ?))";
    assert!(count.sql().ends_with(where_clause), "{}", count.sql());
    assert!(page.sql().contains(where_clause), "{}", page.sql());
    assert_eq!(count.params().len(), 5);
    assert_eq!(count.params(), &page.params()[..5]);
}

#[tokio::test]
async fn test_injection_attempts_are_bound() {
    let ctx = ctx("sess-1");
    let payloads = [
        "' OR '1'='1",
        "'; DROP TABLE c_bankstatement; --",
        "' UNION SELECT password FROM ad_user --",
        "acme%' AND 1=1 --",
    ];
    for payload in payloads {
        let criteria = Criteria::new()
            .with(Condition::like("Name", payload))
            .search(payload);
        let statement = build_statement(&criteria, &ctx).await;
        let page = statement.page_query(&bridge_query::PageRequest { number: 1, size: 10 });
        let rendered = page.to_postgres();

        assert!(!rendered.contains(payload), "payload leaked: {}", rendered);
        assert!(!rendered.contains("DROP"));
        assert!(!rendered.contains("UNION"));
        assert!(page.params().contains(&SqlParam::Text(payload.to_string())));
    }
}

#[tokio::test]
async fn test_token_scoped_to_session_and_query() {
    let limits = PageLimits::default();
    let criteria_a = Criteria::new().with(Condition::equal("c_bankaccount_id", 100i64));
    let criteria_b = Criteria::new().with(Condition::equal("c_bankaccount_id", 200i64));

    let a = build_statement(&criteria_a, &ctx("sess-1")).await;
    let b = build_statement(&criteria_b, &ctx("sess-1")).await;
    let scope_a = TokenScope::new("sess-1", a.fingerprint());
    let scope_b = TokenScope::new("sess-1", b.fingerprint());
    let scope_other_session = TokenScope::new("sess-2", a.fingerprint());

    let token = resolve_page(None, 10, &limits, &scope_a)
        .next_page_token(100, &scope_a)
        .unwrap();

    assert_eq!(resolve_page(Some(&token), 10, &limits, &scope_a).number, 2);
    assert_eq!(resolve_page(Some(&token), 10, &limits, &scope_b).number, 1);
    assert_eq!(resolve_page(Some(&token), 10, &limits, &scope_other_session).number, 1);
}

#[tokio::test]
async fn test_repeated_request_is_identical() {
    let ctx = ctx("sess-1");
    let criteria = Criteria::new().search("acme");
    let first = build_statement(&criteria, &ctx).await;
    let second = build_statement(&criteria, &ctx).await;
    let page = bridge_query::PageRequest { number: 2, size: 10 };

    assert_eq!(first.fingerprint(), second.fingerprint());
    assert_eq!(first.page_query(&page), second.page_query(&page));
    assert_eq!(first.count_query(), second.count_query());
}
