//! 通知确认

use std::sync::Arc;

use bridge_common::RequestContext;
use bridge_errors::{AppError, AppResult};
use bridge_query::validate::require_id;
use bridge_query::{
    AccessMode, Condition, Criteria, EntityStatements, Record, Value, translate,
};
use tracing::info;

use super::entity::{EntityHandler, update_stamps};

pub const NOTICE_TABLE: &str = "ad_note";

pub struct NoticeHandler {
    entities: Arc<EntityHandler>,
}

impl NoticeHandler {
    pub fn new(entities: Arc<EntityHandler>) -> Self {
        Self { entities }
    }

    /// 将调用方自己的通知标记为已处理
    ///
    /// 通知归属收件人：以租户与收件人条件加只读限制定位，系统组织 0 的通知同样可确认。
    pub async fn acknowledge(&self, ctx: &RequestContext, notice_id: i64) -> AppResult<Record> {
        let notice_id = require_id("notice_id", notice_id)?;
        let setters = self.entities.setter_table(NOTICE_TABLE).await?;
        let schema = setters.schema();
        let statements = EntityStatements::new(schema.clone());

        let owned = translate(
            schema,
            &Criteria::new()
                .with(Condition::equal("ad_client_id", ctx.client_id))
                .with(Condition::equal("ad_user_id", ctx.user_id)),
        )?;
        let restriction = self
            .entities
            .injector()
            .inject(ctx, schema.name(), owned, AccessMode::ReadOnly)
            .await?;
        let not_found = || AppError::not_found(format!("Notice {} not found", notice_id));

        let notice = self
            .entities
            .repository()
            .find(&statements, notice_id, restriction.clone())
            .await?
            .ok_or_else(not_found)?;
        if notice.get("processed") == Some(&Value::Boolean(true)) {
            return Err(AppError::failed_precondition(format!(
                "Notice {} already processed",
                notice_id
            )));
        }

        let mut assignments = vec![setters.stamp("processed", &Value::Boolean(true))?
            .ok_or_else(|| AppError::internal("ad_note has no processed column"))?];
        assignments.extend(update_stamps(&setters, ctx)?);

        // 并发确认时只有一方能命中 processed = 'N'
        let unprocessed = translate(
            schema,
            &Criteria::new().with(Condition::equal("processed", false)),
        )?;
        let record = self
            .entities
            .repository()
            .update(
                &statements,
                notice_id,
                &assignments,
                restriction.and(unprocessed),
            )
            .await?
            .ok_or_else(|| {
                AppError::failed_precondition(format!("Notice {} already processed", notice_id))
            })?;
        info!(notice_id, user = ctx.user_id, "Notice acknowledged");
        Ok(record)
    }
}
