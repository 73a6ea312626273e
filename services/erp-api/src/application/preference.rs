//! 用户偏好
//!
//! 作用域为调用方的租户、组织与用户；窗口为空表示全局偏好。
//! 偏好归属用户本人：读写都用作用域条件加只读限制，
//! 登录在系统组织 0 时写入的行也能被再次命中。

use std::sync::Arc;

use bridge_common::RequestContext;
use bridge_errors::{AppError, AppResult};
use bridge_ports::RecordSource;
use bridge_query::validate::require_text;
use bridge_query::{
    AccessMode, Condition, Criteria, EntityStatements, ListingStatement, PageRequest, Record,
    SetterTable, SqlFragment, Value, translate,
};
use tracing::info;

use super::entity::{EntityHandler, creation_stamps, update_stamps};

pub const PREFERENCE_TABLE: &str = "ad_preference";

/// 偏好项
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreferenceEntry {
    pub id: i64,
    pub attribute: String,
    pub value: String,
    pub window_id: Option<i64>,
}

impl PreferenceEntry {
    fn from_record(record: &Record) -> AppResult<Self> {
        let id = record
            .id
            .ok_or_else(|| AppError::internal("Preference row without key"))?;
        let text = |column: &str| match record.get(column) {
            Some(Value::String(s)) => s.clone(),
            _ => String::new(),
        };
        let window_id = match record.get("ad_window_id") {
            Some(Value::Reference(id)) | Some(Value::Integer(id)) => Some(*id),
            _ => None,
        };
        Ok(Self {
            id,
            attribute: text("attribute"),
            value: text("value"),
            window_id,
        })
    }
}

fn scope_criteria(ctx: &RequestContext, attribute: &str, window_id: Option<i64>) -> Criteria {
    let window = match window_id {
        Some(id) => Condition::equal("ad_window_id", id),
        None => Condition::is_null("ad_window_id"),
    };
    Criteria::new()
        .with(Condition::equal("ad_client_id", ctx.client_id))
        .with(Condition::equal("ad_org_id", ctx.org_id))
        .with(Condition::equal("ad_user_id", ctx.user_id))
        .with(Condition::equal("attribute", attribute))
        .with(window)
}

fn not_found(attribute: &str) -> AppError {
    AppError::not_found(format!("Preference {} not found", attribute))
}

pub struct PreferenceHandler {
    entities: Arc<EntityHandler>,
    source: Arc<dyn RecordSource>,
}

impl PreferenceHandler {
    pub fn new(entities: Arc<EntityHandler>, source: Arc<dyn RecordSource>) -> Self {
        Self { entities, source }
    }

    /// 作用域条件与访问限制的组合，get、set、delete 共用
    async fn matching(
        &self,
        ctx: &RequestContext,
        setters: &SetterTable,
        attribute: &str,
        window_id: Option<i64>,
    ) -> AppResult<SqlFragment> {
        let schema = setters.schema();
        let scope = translate(schema, &scope_criteria(ctx, attribute, window_id))?;
        self.entities
            .injector()
            .inject(ctx, schema.name(), scope, AccessMode::ReadOnly)
            .await
    }

    async fn find(
        &self,
        setters: &SetterTable,
        matching: SqlFragment,
    ) -> AppResult<Option<PreferenceEntry>> {
        let statement = ListingStatement::new(setters.schema().clone(), matching, &[])?;
        let first = PageRequest { number: 1, size: 1 };

        match self.source.fetch(&statement, &first).await?.first() {
            Some(record) => PreferenceEntry::from_record(record).map(Some),
            None => Ok(None),
        }
    }

    pub async fn get(
        &self,
        ctx: &RequestContext,
        attribute: &str,
        window_id: Option<i64>,
    ) -> AppResult<PreferenceEntry> {
        let attribute = require_text("attribute", attribute)?;
        let setters = self.entities.setter_table(PREFERENCE_TABLE).await?;
        let matching = self.matching(ctx, &setters, attribute, window_id).await?;
        self.find(&setters, matching)
            .await?
            .ok_or_else(|| not_found(attribute))
    }

    /// 已有则更新值，否则插入
    pub async fn set(
        &self,
        ctx: &RequestContext,
        attribute: &str,
        value: &str,
        window_id: Option<i64>,
    ) -> AppResult<PreferenceEntry> {
        let attribute = require_text("attribute", attribute)?;
        let setters = self.entities.setter_table(PREFERENCE_TABLE).await?;
        let matching = self.matching(ctx, &setters, attribute, window_id).await?;

        let mut updates = vec![setters.assign("value", &Value::from(value))?];
        updates.extend(update_stamps(&setters, ctx)?);

        let mut inserts = vec![
            setters.assign("attribute", &Value::from(attribute))?,
            setters.assign("ad_user_id", &Value::Integer(ctx.user_id))?,
        ];
        if let Some(window_id) = window_id {
            inserts.push(setters.assign("ad_window_id", &Value::Integer(window_id))?);
        }
        let stamps = creation_stamps(&setters, ctx, &inserts)?;
        inserts.extend(
            stamps
                .into_iter()
                .filter(|s| !updates.iter().any(|u| u.column == s.column)),
        );

        let statements = EntityStatements::new(setters.schema().clone());
        let record = self
            .entities
            .repository()
            .upsert(&statements, matching, &updates, &inserts)
            .await?;
        info!(attribute, user = ctx.user_id, "Preference saved");
        PreferenceEntry::from_record(&record)
    }

    pub async fn delete(
        &self,
        ctx: &RequestContext,
        attribute: &str,
        window_id: Option<i64>,
    ) -> AppResult<()> {
        let attribute = require_text("attribute", attribute)?;
        let setters = self.entities.setter_table(PREFERENCE_TABLE).await?;
        let matching = self.matching(ctx, &setters, attribute, window_id).await?;
        let entry = self
            .find(&setters, matching.clone())
            .await?
            .ok_or_else(|| not_found(attribute))?;

        let deleted = self
            .entities
            .repository()
            .delete(&EntityStatements::new(setters.schema().clone()), entry.id, matching)
            .await?;
        if !deleted {
            return Err(not_found(attribute));
        }
        info!(attribute, user = ctx.user_id, "Preference deleted");
        Ok(())
    }
}
