//! 业务列表视图：固定表 + 固定过滤条件

use bridge_common::RequestContext;
use bridge_errors::{AppError, AppResult};
use bridge_query::Condition;
use bridge_query::validate::require_id;

use super::listing::{ListParams, ListQuery};

/// 可选 ID：0 表示不限，负数非法
fn optional_id(field: &str, id: i64) -> AppResult<Option<i64>> {
    match id {
        0 => Ok(None),
        id => require_id(field, id).map(Some),
    }
}

fn with_optional(query: ListQuery, column: &str, id: Option<i64>) -> ListQuery {
    match id {
        Some(id) => query.with_base(Condition::equal(column, id)),
        None => query,
    }
}

/// 会计分录；来源单据须同时给出表与记录
pub fn accounting_facts(
    params: ListParams,
    ad_table_id: i64,
    record_id: i64,
    acct_schema_id: i64,
) -> AppResult<ListQuery> {
    let table_id = optional_id("ad_table_id", ad_table_id)?;
    let record_id = optional_id("record_id", record_id)?;
    if table_id.is_some() != record_id.is_some() {
        return Err(AppError::validation(
            "ad_table_id and record_id must be given together",
        ));
    }
    let query = ListQuery::new("fact_acct", params);
    let query = with_optional(query, "ad_table_id", table_id);
    let query = with_optional(query, "record_id", record_id);
    Ok(with_optional(
        query,
        "c_acctschema_id",
        optional_id("c_acctschema_id", acct_schema_id)?,
    ))
}

pub fn bank_statements(params: ListParams, bank_account_id: i64) -> AppResult<ListQuery> {
    Ok(with_optional(
        ListQuery::new("c_bankstatement", params),
        "c_bankaccount_id",
        optional_id("c_bankaccount_id", bank_account_id)?,
    ))
}

pub fn bank_statement_lines(params: ListParams, statement_id: i64) -> AppResult<ListQuery> {
    let statement_id = require_id("c_bankstatement_id", statement_id)?;
    Ok(ListQuery::new("c_bankstatementline", params)
        .with_base(Condition::equal("c_bankstatement_id", statement_id)))
}

/// 库存移动单，`doc_status` 为空表示不限
pub fn movements(params: ListParams, doc_status: &str) -> ListQuery {
    let query = ListQuery::new("m_movement", params);
    match doc_status.trim() {
        "" => query,
        status => query.with_base(Condition::equal("docstatus", status)),
    }
}

pub fn movement_lines(params: ListParams, movement_id: i64) -> AppResult<ListQuery> {
    let movement_id = require_id("m_movement_id", movement_id)?;
    Ok(ListQuery::new("m_movementline", params)
        .with_base(Condition::equal("m_movement_id", movement_id)))
}

/// 当前用户挂起（OS）的工作流活动
pub fn activities(ctx: &RequestContext, params: ListParams) -> ListQuery {
    ListQuery::new("ad_wf_activity", params)
        .with_base(Condition::equal("ad_user_id", ctx.user_id))
        .with_base(Condition::equal("wfstate", "OS"))
}

pub fn notices(ctx: &RequestContext, params: ListParams, include_processed: bool) -> ListQuery {
    let query =
        ListQuery::new("ad_note", params).with_base(Condition::equal("ad_user_id", ctx.user_id));
    if include_processed {
        query
    } else {
        query.with_base(Condition::equal("processed", false))
    }
}

pub fn change_logs(params: ListParams, ad_table_id: i64, record_id: i64) -> AppResult<ListQuery> {
    let table_id = require_id("ad_table_id", ad_table_id)?;
    let record_id = require_id("record_id", record_id)?;
    Ok(ListQuery::new("ad_changelog", params)
        .with_base(Condition::equal("ad_table_id", table_id))
        .with_base(Condition::equal("record_id", record_id)))
}

pub fn payroll_movements(
    params: ListParams,
    bpartner_id: i64,
    process_id: i64,
) -> AppResult<ListQuery> {
    let query = ListQuery::new("hr_movement", params);
    let query = with_optional(
        query,
        "c_bpartner_id",
        optional_id("c_bpartner_id", bpartner_id)?,
    );
    Ok(with_optional(
        query,
        "hr_process_id",
        optional_id("hr_process_id", process_id)?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> RequestContext {
        RequestContext::new("s-1", 11, 0, 102, 100)
    }

    #[test]
    fn test_accounting_facts_requires_pair() {
        let err = accounting_facts(ListParams::default(), 318, 0, 0).unwrap_err();
        assert!(err.to_string().contains("together"));

        let query = accounting_facts(ListParams::default(), 318, 1000, 101).unwrap();
        assert_eq!(query.table_name, "fact_acct");
        assert_eq!(
            query.base,
            vec![
                Condition::equal("ad_table_id", 318_i64),
                Condition::equal("record_id", 1000_i64),
                Condition::equal("c_acctschema_id", 101_i64),
            ]
        );
    }

    #[test]
    fn test_optional_filters_skipped() {
        assert!(bank_statements(ListParams::default(), 0).unwrap().base.is_empty());
        assert!(movements(ListParams::default(), "  ").base.is_empty());
        assert!(payroll_movements(ListParams::default(), 0, 0).unwrap().base.is_empty());
        assert!(bank_statements(ListParams::default(), -4).is_err());
    }

    #[test]
    fn test_required_parent() {
        assert!(bank_statement_lines(ListParams::default(), 0).is_err());
        assert!(movement_lines(ListParams::default(), -1).is_err());
        assert!(change_logs(ListParams::default(), 259, 0).is_err());
        assert_eq!(movement_lines(ListParams::default(), 7).unwrap().base.len(), 1);
    }

    #[test]
    fn test_user_scoped_views() {
        let activities = activities(&ctx(), ListParams::default());
        assert_eq!(activities.base[0], Condition::equal("ad_user_id", 100_i64));
        assert_eq!(activities.base[1], Condition::equal("wfstate", "OS"));

        assert_eq!(notices(&ctx(), ListParams::default(), false).base.len(), 2);
        assert_eq!(notices(&ctx(), ListParams::default(), true).base.len(), 1);
    }
}
