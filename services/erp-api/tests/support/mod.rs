//! 测试用假实现：目录、记录源、仓储、附件存储与安全引擎

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bridge_common::RequestContext;
use bridge_errors::{AppError, AppResult};
use bridge_ports::{
    AttachmentStore, EntityRepository, NewAttachment, RecordSource, SchemaCatalog,
    StoredAttachment,
};
use bridge_query::{
    AccessMode, AccessRestrictionInjector, Assignment, ColumnSchema, EntityStatements,
    ListingStatement, PageRequest, Qualification, Record, SecurityEngine, SemanticType,
    SqlFragment, SqlParam, TableSchema, Value,
};
use erp_api::application::EntityHandler;
use erp_api::infrastructure::{OrgAccess, build_restriction};

pub fn ctx(session: &str) -> RequestContext {
    RequestContext::new(session, 11, 50000, 102, 100)
}

fn audit_columns() -> Vec<ColumnSchema> {
    vec![
        ColumnSchema::new("ad_client_id", SemanticType::Reference).not_null().read_only(),
        ColumnSchema::new("ad_org_id", SemanticType::Reference).not_null(),
        ColumnSchema::new("created", SemanticType::Timestamp).read_only(),
        ColumnSchema::new("createdby", SemanticType::Reference).read_only(),
        ColumnSchema::new("updated", SemanticType::Timestamp).read_only(),
        ColumnSchema::new("updatedby", SemanticType::Reference).read_only(),
    ]
}

fn table(name: &str, key: &str, mut columns: Vec<ColumnSchema>) -> Arc<TableSchema> {
    columns.insert(0, ColumnSchema::new(key, SemanticType::Integer).not_null());
    columns.extend(audit_columns());
    Arc::new(TableSchema::new(name, key, columns).unwrap())
}

pub fn schemas() -> Vec<Arc<TableSchema>> {
    vec![
        table(
            "c_bankstatement",
            "c_bankstatement_id",
            vec![
                ColumnSchema::new("c_bankaccount_id", SemanticType::Reference),
                ColumnSchema::new("name", SemanticType::String).not_null(),
                ColumnSchema::new("documentno", SemanticType::String),
                ColumnSchema::new("statementdifference", SemanticType::Decimal),
                ColumnSchema::new("statementdate", SemanticType::Timestamp),
                ColumnSchema::new("processed", SemanticType::YesNo),
            ],
        ),
        table(
            "c_bankstatementline",
            "c_bankstatementline_id",
            vec![
                ColumnSchema::new("c_bankstatement_id", SemanticType::Reference).not_null(),
                ColumnSchema::new("line", SemanticType::Integer),
                ColumnSchema::new("stmtamt", SemanticType::Decimal),
            ],
        ),
        table(
            "ad_note",
            "ad_note_id",
            vec![
                ColumnSchema::new("ad_user_id", SemanticType::Reference),
                ColumnSchema::new("processed", SemanticType::YesNo).not_null(),
                ColumnSchema::new("textmsg", SemanticType::String),
            ],
        ),
        table(
            "ad_preference",
            "ad_preference_id",
            vec![
                ColumnSchema::new("ad_user_id", SemanticType::Reference),
                ColumnSchema::new("ad_window_id", SemanticType::Reference),
                ColumnSchema::new("attribute", SemanticType::String).not_null(),
                ColumnSchema::new("value", SemanticType::String).not_null(),
            ],
        ),
    ]
}

/// 内存表结构目录
pub struct FakeCatalog {
    tables: HashMap<String, Arc<TableSchema>>,
}

impl FakeCatalog {
    pub fn new() -> Self {
        Self {
            tables: schemas()
                .into_iter()
                .map(|s| (s.name().to_string(), s))
                .collect(),
        }
    }
}

#[async_trait]
impl SchemaCatalog for FakeCatalog {
    async fn table_schema(&self, table_name: &str) -> AppResult<Arc<TableSchema>> {
        self.tables
            .get(&table_name.to_lowercase())
            .cloned()
            .ok_or_else(|| AppError::not_found(format!("Table {} not found", table_name)))
    }
}

/// 按租户与模式生成限制，并记录调用
#[derive(Default)]
pub struct RecordingEngine {
    pub calls: Mutex<Vec<(String, AccessMode)>>,
}

#[async_trait]
impl SecurityEngine for RecordingEngine {
    async fn restriction(
        &self,
        ctx: &RequestContext,
        table_name: &str,
        mode: AccessMode,
        qualification: Qualification,
    ) -> AppResult<SqlFragment> {
        assert_eq!(qualification, Qualification::FullyQualified);
        self.calls
            .lock()
            .unwrap()
            .push((table_name.to_string(), mode));
        let sql = match mode {
            AccessMode::ReadOnly => format!("{}.ad_client_id IN (0, ?)", table_name),
            AccessMode::ReadWrite => format!("{}.ad_client_id = ?", table_name),
        };
        Ok(SqlFragment::new(sql, vec![SqlParam::Integer(ctx.client_id)]))
    }
}

/// 按角色组织访问表生成限制，与线上引擎共用 `build_restriction`
pub struct RoleEngine {
    catalog: FakeCatalog,
    orgs: OrgAccess,
}

impl RoleEngine {
    pub fn new(orgs: OrgAccess) -> Self {
        Self {
            catalog: FakeCatalog::new(),
            orgs,
        }
    }
}

#[async_trait]
impl SecurityEngine for RoleEngine {
    async fn restriction(
        &self,
        ctx: &RequestContext,
        table_name: &str,
        mode: AccessMode,
        qualification: Qualification,
    ) -> AppResult<SqlFragment> {
        let schema = self.catalog.table_schema(table_name).await?;
        Ok(build_restriction(&schema, qualification, mode, ctx.client_id, &self.orgs))
    }
}

/// 固定行集的记录源，忽略过滤条件，只按分页切片
pub struct FakeSource {
    rows: Vec<Record>,
    pub counted: Mutex<Vec<SqlFragment>>,
    pub fetched: Mutex<Vec<(SqlFragment, PageRequest)>>,
}

impl FakeSource {
    pub fn with_rows(count: i64) -> Self {
        let rows = (1..=count)
            .map(|id| {
                let mut record = Record {
                    id: Some(id),
                    ..Default::default()
                };
                record
                    .values
                    .insert("name".to_string(), Value::String(format!("Statement {}", id)));
                record
            })
            .collect();
        Self::from_records(rows)
    }

    pub fn from_records(rows: Vec<Record>) -> Self {
        Self {
            rows,
            counted: Mutex::new(Vec::new()),
            fetched: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl RecordSource for FakeSource {
    async fn count(&self, statement: &ListingStatement) -> AppResult<u64> {
        self.counted.lock().unwrap().push(statement.count_query());
        Ok(self.rows.len() as u64)
    }

    async fn fetch(&self, statement: &ListingStatement, page: &PageRequest) -> AppResult<Vec<Record>> {
        self.fetched
            .lock()
            .unwrap()
            .push((statement.page_query(page), *page));
        Ok(self
            .rows
            .iter()
            .skip(page.offset() as usize)
            .take(page.limit() as usize)
            .cloned()
            .collect())
    }
}

/// 仓储调用记录
#[derive(Debug, Clone, PartialEq)]
pub enum RepoCall {
    Find { id: i64, restriction: SqlFragment },
    Insert { assignments: Vec<Assignment>, restriction: SqlFragment },
    Update { id: i64, assignments: Vec<Assignment>, restriction: SqlFragment },
    Delete { id: i64, restriction: SqlFragment },
    Upsert { matching: SqlFragment, updates: Vec<Assignment>, inserts: Vec<Assignment> },
}

fn param_value(param: &SqlParam) -> Value {
    match param {
        SqlParam::Null(_) => Value::Null,
        SqlParam::Text(s) => Value::String(s.clone()),
        SqlParam::Integer(i) => Value::Integer(*i),
        SqlParam::Decimal(d) => Value::Decimal(*d),
        SqlParam::Boolean(b) => Value::Boolean(*b),
        SqlParam::Timestamp(ts) => Value::Timestamp(ts.and_utc().timestamp_millis()),
    }
}

fn apply(record: &mut Record, assignments: &[Assignment]) {
    for a in assignments {
        record.values.insert(a.column.clone(), param_value(&a.param));
    }
}

/// 内存仓储，限制条件不参与匹配
#[derive(Default)]
pub struct FakeRepository {
    pub rows: Mutex<HashMap<i64, Record>>,
    pub calls: Mutex<Vec<RepoCall>>,
    /// 为 true 时 update 视为未命中（模拟并发修改）
    pub reject_updates: Mutex<bool>,
    /// 为 true 时新行视为落在写限制之外
    pub reject_inserts: Mutex<bool>,
}

impl FakeRepository {
    pub fn with_row(self, id: i64, values: &[(&str, Value)]) -> Self {
        let mut record = Record {
            id: Some(id),
            ..Default::default()
        };
        for (column, value) in values {
            record.values.insert(column.to_string(), value.clone());
        }
        self.rows.lock().unwrap().insert(id, record);
        self
    }

    pub fn calls(&self) -> Vec<RepoCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl EntityRepository for FakeRepository {
    async fn find(
        &self,
        _statements: &EntityStatements,
        id: i64,
        restriction: SqlFragment,
    ) -> AppResult<Option<Record>> {
        self.calls.lock().unwrap().push(RepoCall::Find { id, restriction });
        Ok(self.rows.lock().unwrap().get(&id).cloned())
    }

    async fn insert(
        &self,
        _statements: &EntityStatements,
        assignments: &[Assignment],
        restriction: SqlFragment,
    ) -> AppResult<Record> {
        self.calls.lock().unwrap().push(RepoCall::Insert {
            assignments: assignments.to_vec(),
            restriction,
        });
        if *self.reject_inserts.lock().unwrap() {
            return Err(AppError::forbidden("New row is outside the writable scope"));
        }
        let mut rows = self.rows.lock().unwrap();
        let id = rows.keys().max().copied().unwrap_or(1000) + 1;
        let mut record = Record {
            id: Some(id),
            ..Default::default()
        };
        apply(&mut record, assignments);
        rows.insert(id, record.clone());
        Ok(record)
    }

    async fn update(
        &self,
        _statements: &EntityStatements,
        id: i64,
        assignments: &[Assignment],
        restriction: SqlFragment,
    ) -> AppResult<Option<Record>> {
        self.calls.lock().unwrap().push(RepoCall::Update {
            id,
            assignments: assignments.to_vec(),
            restriction,
        });
        if *self.reject_updates.lock().unwrap() {
            return Ok(None);
        }
        let mut rows = self.rows.lock().unwrap();
        Ok(rows.get_mut(&id).map(|record| {
            apply(record, assignments);
            record.clone()
        }))
    }

    async fn delete(
        &self,
        _statements: &EntityStatements,
        id: i64,
        restriction: SqlFragment,
    ) -> AppResult<bool> {
        self.calls.lock().unwrap().push(RepoCall::Delete { id, restriction });
        Ok(self.rows.lock().unwrap().remove(&id).is_some())
    }

    async fn upsert(
        &self,
        _statements: &EntityStatements,
        matching: SqlFragment,
        updates: &[Assignment],
        inserts: &[Assignment],
    ) -> AppResult<Record> {
        self.calls.lock().unwrap().push(RepoCall::Upsert {
            matching,
            updates: updates.to_vec(),
            inserts: inserts.to_vec(),
        });
        let mut record = Record {
            id: Some(2000),
            ..Default::default()
        };
        apply(&mut record, updates);
        apply(&mut record, inserts);
        Ok(record)
    }
}

/// 记录写入内容的附件存储
#[derive(Default)]
pub struct FakeStore {
    pub stored: Mutex<Vec<NewAttachment>>,
}

#[async_trait]
impl AttachmentStore for FakeStore {
    async fn store(&self, _ctx: &RequestContext, attachment: NewAttachment) -> AppResult<StoredAttachment> {
        let stored = StoredAttachment {
            attachment_id: 77,
            target: attachment.target.clone(),
            file_name: attachment.file_name.clone(),
            size: attachment.data.len() as u64,
        };
        self.stored.lock().unwrap().push(attachment);
        Ok(stored)
    }
}

pub struct Fixture {
    pub engine: Arc<RecordingEngine>,
    pub repository: Arc<FakeRepository>,
    pub entities: Arc<EntityHandler>,
}

pub fn fixture(repository: FakeRepository) -> Fixture {
    let engine = Arc::new(RecordingEngine::default());
    let repository = Arc::new(repository);
    let entities = Arc::new(EntityHandler::new(
        Arc::new(FakeCatalog::new()),
        repository.clone(),
        AccessRestrictionInjector::new(engine.clone()),
        16,
    ));
    Fixture {
        engine,
        repository,
        entities,
    }
}

/// 使用角色组织访问规则的实体处理器
pub fn role_entities(repository: Arc<FakeRepository>, orgs: OrgAccess) -> Arc<EntityHandler> {
    Arc::new(EntityHandler::new(
        Arc::new(FakeCatalog::new()),
        repository,
        AccessRestrictionInjector::new(Arc::new(RoleEngine::new(orgs))),
        16,
    ))
}
