//! 列表处理器测试
//!
//! 覆盖多页遍历、令牌作用域、固定过滤条件与访问限制的组合、
//! 注入尝试与越界页。

mod support;

use std::sync::Arc;

use bridge_errors::AppError;
use bridge_query::{AccessMode, Condition, Criteria, PageLimits};
use erp_api::application::{ListParams, ListQuery, ListingHandler, views};

use support::{FakeCatalog, FakeSource, RecordingEngine, ctx};

fn handler(source: Arc<FakeSource>, engine: Arc<RecordingEngine>) -> ListingHandler {
    ListingHandler::new(
        Arc::new(FakeCatalog::new()),
        source,
        bridge_query::AccessRestrictionInjector::new(engine),
        PageLimits::default(),
    )
}

fn params(page_size: i32, page_token: Option<String>) -> ListParams {
    ListParams {
        criteria: Criteria::new(),
        page_size,
        page_token,
    }
}

#[tokio::test]
async fn test_three_pages_cover_all_rows() {
    let source = Arc::new(FakeSource::with_rows(25));
    let handler = handler(source.clone(), Arc::new(RecordingEngine::default()));
    let ctx = ctx("sess-1");

    let mut token = None;
    let mut ids = Vec::new();
    let mut pages = 0;
    loop {
        let page = handler
            .list(&ctx, ListQuery::new("c_bankstatement", params(10, token)))
            .await
            .unwrap();
        assert_eq!(page.total, 25);
        pages += 1;
        ids.extend(page.records.iter().filter_map(|r| r.id));
        token = page.next_page_token;
        if token.is_none() {
            assert_eq!(page.records.len(), 5);
            break;
        }
        assert_eq!(page.records.len(), 10);
    }

    assert_eq!(pages, 3);
    assert_eq!(ids, (1..=25).collect::<Vec<i64>>());
    let offsets: Vec<u64> = source
        .fetched
        .lock()
        .unwrap()
        .iter()
        .map(|(_, page)| page.offset())
        .collect();
    assert_eq!(offsets, vec![0, 10, 20]);
}

#[tokio::test]
async fn test_repeated_page_request_is_idempotent() {
    let source = Arc::new(FakeSource::with_rows(25));
    let handler = handler(source, Arc::new(RecordingEngine::default()));
    let ctx = ctx("sess-1");

    let first = handler
        .list(&ctx, ListQuery::new("c_bankstatement", params(10, None)))
        .await
        .unwrap();
    let token = first.next_page_token.clone();

    let a = handler
        .list(&ctx, ListQuery::new("c_bankstatement", params(10, token.clone())))
        .await
        .unwrap();
    let b = handler
        .list(&ctx, ListQuery::new("c_bankstatement", params(10, token)))
        .await
        .unwrap();
    assert_eq!(a, b);
    assert_eq!(a.records[0].id, Some(11));
}

#[tokio::test]
async fn test_foreign_token_restarts_at_first_page() {
    let source = Arc::new(FakeSource::with_rows(25));
    let handler = handler(source, Arc::new(RecordingEngine::default()));

    let page = handler
        .list(&ctx("sess-1"), ListQuery::new("c_bankstatement", params(10, None)))
        .await
        .unwrap();
    let token = page.next_page_token;

    // 其他会话
    let other = handler
        .list(&ctx("sess-2"), ListQuery::new("c_bankstatement", params(10, token.clone())))
        .await
        .unwrap();
    assert_eq!(other.records[0].id, Some(1));

    // 同一会话换了条件
    let mut changed = params(10, token);
    changed.criteria = Criteria::new().search("acme");
    let changed = handler
        .list(&ctx("sess-1"), ListQuery::new("c_bankstatement", changed))
        .await
        .unwrap();
    assert_eq!(changed.records[0].id, Some(1));
}

#[tokio::test]
async fn test_base_filter_and_restriction_combined() {
    let source = Arc::new(FakeSource::with_rows(3));
    let engine = Arc::new(RecordingEngine::default());
    let handler = handler(source.clone(), engine.clone());

    let mut caller = params(0, None);
    caller.criteria = Criteria::new().with(Condition::like("name", "Q1"));
    let query = views::bank_statements(caller, 7).unwrap();
    handler.list(&ctx("sess-1"), query).await.unwrap();

    let counted = source.counted.lock().unwrap();
    assert_eq!(
        counted[0].sql(),
        "SELECT COUNT(*) FROM c_bankstatement WHERE ((c_bankaccount_id = ?) AND \
         (UPPER(name) LIKE '%'||UPPER(?)||'%')) AND (c_bankstatement.ad_client_id IN (0, ?))"
    );
    assert_eq!(
        engine.calls.lock().unwrap().as_slice(),
        &[("c_bankstatement".to_string(), AccessMode::ReadOnly)]
    );
}

#[tokio::test]
async fn test_unknown_column_is_validation_error() {
    let source = Arc::new(FakeSource::with_rows(3));
    let handler = handler(source.clone(), Arc::new(RecordingEngine::default()));

    let mut bad = params(10, None);
    bad.criteria = Criteria::new().with(Condition::equal("no_such_column", 1_i64));
    let err = handler
        .list(&ctx("sess-1"), ListQuery::new("c_bankstatement", bad))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    assert!(source.counted.lock().unwrap().is_empty());

    let err = handler
        .list(&ctx("sess-1"), ListQuery::new("c_bankstatement; --", params(10, None)))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let err = handler
        .list(&ctx("sess-1"), ListQuery::new("m_unknown", params(10, None)))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn test_search_payload_only_bound() {
    let source = Arc::new(FakeSource::with_rows(1));
    let handler = handler(source.clone(), Arc::new(RecordingEngine::default()));

    let payload = "x' OR '1'='1'; DROP TABLE c_bankstatement; --";
    let mut search = params(10, None);
    search.criteria = Criteria::new().search(payload);
    handler
        .list(&ctx("sess-1"), ListQuery::new("c_bankstatement", search))
        .await
        .unwrap();

    let fetched = source.fetched.lock().unwrap();
    let (statement, _) = &fetched[0];
    assert!(!statement.sql().contains("DROP"));
    assert!(!statement.to_postgres().contains("1'='1"));
    assert!(
        statement
            .params()
            .contains(&bridge_query::SqlParam::Text(payload.to_string()))
    );
}

#[tokio::test]
async fn test_page_beyond_total_skips_fetch() {
    let source = Arc::new(FakeSource::with_rows(0));
    let handler = handler(source.clone(), Arc::new(RecordingEngine::default()));

    let page = handler
        .list(&ctx("sess-1"), ListQuery::new("c_bankstatement", params(-5, None)))
        .await
        .unwrap();
    assert_eq!(page.total, 0);
    assert!(page.records.is_empty());
    assert!(page.next_page_token.is_none());
    assert!(source.fetched.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_page_size_clamped() {
    let source = Arc::new(FakeSource::with_rows(250));
    let handler = handler(source.clone(), Arc::new(RecordingEngine::default()));

    let page = handler
        .list(&ctx("sess-1"), ListQuery::new("c_bankstatement", params(1000, None)))
        .await
        .unwrap();
    assert_eq!(page.records.len(), 100);

    let page = handler
        .list(&ctx("sess-1"), ListQuery::new("c_bankstatement", params(0, None)))
        .await
        .unwrap();
    assert_eq!(page.records.len(), 20);
}
