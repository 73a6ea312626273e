//! 通用实体读写
//!
//! 所有赋值经由表的 SetterTable；审计列由请求上下文戳记。

use std::sync::Arc;

use bridge_common::RequestContext;
use bridge_errors::{AppError, AppResult};
use bridge_ports::{EntityRepository, SchemaCatalog};
use bridge_query::validate::{require_id, require_table_name};
use bridge_query::{
    AccessMode, AccessRestrictionInjector, Assignment, EntityStatements, Record, SetterTable, Value,
};
use chrono::Utc;
use moka::future::Cache;
use tracing::info;

/// 创建时的审计戳记；`supplied` 中已有 ad_org_id 时不覆盖
pub fn creation_stamps(
    setters: &SetterTable,
    ctx: &RequestContext,
    supplied: &[Assignment],
) -> AppResult<Vec<Assignment>> {
    let now = Value::Timestamp(Utc::now().timestamp_millis());
    let user = Value::Integer(ctx.user_id);
    let mut stamps = vec![
        setters.stamp("ad_client_id", &Value::Integer(ctx.client_id))?,
        setters.stamp("created", &now)?,
        setters.stamp("createdby", &user)?,
        setters.stamp("updated", &now)?,
        setters.stamp("updatedby", &user)?,
    ];
    let org_supplied = supplied
        .iter()
        .any(|a| a.column.eq_ignore_ascii_case("ad_org_id"));
    if !org_supplied {
        stamps.push(setters.stamp("ad_org_id", &Value::Integer(ctx.org_id))?);
    }
    Ok(stamps.into_iter().flatten().collect())
}

/// 更新时的审计戳记
pub fn update_stamps(setters: &SetterTable, ctx: &RequestContext) -> AppResult<Vec<Assignment>> {
    let now = Value::Timestamp(Utc::now().timestamp_millis());
    let stamps = [
        setters.stamp("updated", &now)?,
        setters.stamp("updatedby", &Value::Integer(ctx.user_id))?,
    ];
    Ok(stamps.into_iter().flatten().collect())
}

fn not_found(table_name: &str, id: i64) -> AppError {
    AppError::not_found(format!("{} #{} not found", table_name, id))
}

pub struct EntityHandler {
    catalog: Arc<dyn SchemaCatalog>,
    repository: Arc<dyn EntityRepository>,
    injector: AccessRestrictionInjector,
    setters: Cache<String, Arc<SetterTable>>,
}

impl EntityHandler {
    pub fn new(
        catalog: Arc<dyn SchemaCatalog>,
        repository: Arc<dyn EntityRepository>,
        injector: AccessRestrictionInjector,
        setter_capacity: u64,
    ) -> Self {
        Self {
            catalog,
            repository,
            injector,
            setters: Cache::new(setter_capacity),
        }
    }

    pub fn repository(&self) -> &Arc<dyn EntityRepository> {
        &self.repository
    }

    pub fn injector(&self) -> &AccessRestrictionInjector {
        &self.injector
    }

    /// 表的赋值表，每个表结构只构建一次
    pub async fn setter_table(&self, table_name: &str) -> AppResult<Arc<SetterTable>> {
        let table_name = require_table_name(table_name)?;
        let key = table_name.to_lowercase();
        if let Some(setters) = self.setters.get(&key).await {
            return Ok(setters);
        }

        let schema = self.catalog.table_schema(table_name).await?;
        let setters = Arc::new(SetterTable::for_schema(schema));
        self.setters.insert(key, setters.clone()).await;
        Ok(setters)
    }

    /// 按主键读取（只读限制）
    pub async fn get(&self, ctx: &RequestContext, table_name: &str, id: i64) -> AppResult<Record> {
        self.find(ctx, table_name, id, AccessMode::ReadOnly).await
    }

    /// 按主键读取，要求调用方可写该行
    pub async fn get_writable(
        &self,
        ctx: &RequestContext,
        table_name: &str,
        id: i64,
    ) -> AppResult<Record> {
        self.find(ctx, table_name, id, AccessMode::ReadWrite).await
    }

    async fn find(
        &self,
        ctx: &RequestContext,
        table_name: &str,
        id: i64,
        mode: AccessMode,
    ) -> AppResult<Record> {
        let id = require_id("id", id)?;
        let setters = self.setter_table(table_name).await?;
        let schema = setters.schema();
        let restriction = self.injector.restriction_for(ctx, schema.name(), mode).await?;

        self.repository
            .find(&EntityStatements::new(schema.clone()), id, restriction)
            .await?
            .ok_or_else(|| not_found(schema.name(), id))
    }

    pub async fn create(
        &self,
        ctx: &RequestContext,
        table_name: &str,
        attributes: &[(String, Value)],
    ) -> AppResult<Record> {
        let setters = self.setter_table(table_name).await?;
        let mut assignments =
            setters.assign_all(attributes.iter().map(|(name, value)| (name.as_str(), value)))?;
        let stamps = creation_stamps(&setters, ctx, &assignments)?;
        assignments.extend(stamps);

        let schema = setters.schema();
        let restriction = self
            .injector
            .restriction_for(ctx, schema.name(), AccessMode::ReadWrite)
            .await?;
        let record = self
            .repository
            .insert(&EntityStatements::new(schema.clone()), &assignments, restriction)
            .await?;
        info!(table = %schema.name(), id = ?record.id, user = ctx.user_id, "Entity created");
        Ok(record)
    }

    pub async fn update(
        &self,
        ctx: &RequestContext,
        table_name: &str,
        id: i64,
        attributes: &[(String, Value)],
    ) -> AppResult<Record> {
        let id = require_id("id", id)?;
        if attributes.is_empty() {
            return Err(AppError::validation("attributes are required"));
        }
        let setters = self.setter_table(table_name).await?;
        let mut assignments =
            setters.assign_all(attributes.iter().map(|(name, value)| (name.as_str(), value)))?;
        assignments.extend(update_stamps(&setters, ctx)?);

        let schema = setters.schema();
        let restriction = self
            .injector
            .restriction_for(ctx, schema.name(), AccessMode::ReadWrite)
            .await?;
        let record = self
            .repository
            .update(&EntityStatements::new(schema.clone()), id, &assignments, restriction)
            .await?
            .ok_or_else(|| not_found(schema.name(), id))?;
        info!(table = %schema.name(), id, user = ctx.user_id, "Entity updated");
        Ok(record)
    }

    pub async fn delete(&self, ctx: &RequestContext, table_name: &str, id: i64) -> AppResult<()> {
        let id = require_id("id", id)?;
        let setters = self.setter_table(table_name).await?;
        let schema = setters.schema();
        let restriction = self
            .injector
            .restriction_for(ctx, schema.name(), AccessMode::ReadWrite)
            .await?;

        let deleted = self
            .repository
            .delete(&EntityStatements::new(schema.clone()), id, restriction)
            .await?;
        if !deleted {
            return Err(not_found(schema.name(), id));
        }
        info!(table = %schema.name(), id, user = ctx.user_id, "Entity deleted");
        Ok(())
    }
}
