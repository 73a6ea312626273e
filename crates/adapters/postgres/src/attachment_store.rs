//! 附件存储（ad_attachment）

use async_trait::async_trait;
use bridge_common::RequestContext;
use bridge_common::utils::is_sql_identifier;
use bridge_errors::{AppError, AppResult};
use bridge_ports::{AttachmentStore, NewAttachment, StoredAttachment};
use sqlx::{PgConnection, PgPool};
use tracing::info;

use crate::error_mapper::map_sqlx_error;
use crate::transaction::TransactionManager;

/// 目标表的 ad_table_id 与规范表名
async fn target_table(conn: &mut PgConnection, table_name: &str) -> AppResult<(i64, String)> {
    sqlx::query_as::<_, (i64, String)>(
        "SELECT ad_table_id::int8, LOWER(tablename) FROM ad_table WHERE LOWER(tablename) = LOWER($1)",
    )
    .bind(table_name)
    .fetch_optional(&mut *conn)
    .await
    .map_err(map_sqlx_error)?
    .ok_or_else(|| AppError::not_found(format!("Table {} not found", table_name)))
}

/// 读取目标记录组织的语句；主键列按 `<表名>_id` 约定，并锁住该行
fn target_org_sql(table_name: &str) -> AppResult<String> {
    if !is_sql_identifier(table_name) {
        return Err(AppError::internal(format!("Invalid table name {}", table_name)));
    }
    Ok(format!(
        "SELECT ad_org_id::int8 FROM {0} WHERE {0}_id = $1 FOR SHARE",
        table_name
    ))
}

async fn target_org(conn: &mut PgConnection, table_name: &str, record_id: i64) -> AppResult<i64> {
    sqlx::query_scalar::<_, i64>(&target_org_sql(table_name)?)
        .bind(record_id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(map_sqlx_error)?
        .ok_or_else(|| AppError::not_found(format!("{} #{} not found", table_name, record_id)))
}

async fn store_in(
    conn: &mut PgConnection,
    ctx: &RequestContext,
    attachment: &NewAttachment,
) -> AppResult<i64> {
    let (ad_table_id, table_name) = target_table(conn, &attachment.target.table_name).await?;
    // 附件随目标记录归属组织
    let ad_org_id = target_org(conn, &table_name, attachment.target.id).await?;
    sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO ad_attachment
            (ad_client_id, ad_org_id, ad_table_id, record_id, title, textmsg, binarydata,
             isactive, created, createdby, updated, updatedby)
        VALUES ($1, $2, $3, $4, $5, $6, $7, 'Y', now(), $8, now(), $8)
        RETURNING ad_attachment_id::int8
        "#,
    )
    .bind(ctx.client_id)
    .bind(ad_org_id)
    .bind(ad_table_id)
    .bind(attachment.target.id)
    .bind(&attachment.file_name)
    .bind(&attachment.content_type)
    .bind(&attachment.data)
    .bind(ctx.user_id)
    .fetch_one(&mut *conn)
    .await
    .map_err(map_sqlx_error)
}

#[derive(Clone)]
pub struct PgAttachmentStore {
    transactions: TransactionManager,
}

impl PgAttachmentStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            transactions: TransactionManager::new(pool),
        }
    }
}

#[async_trait]
impl AttachmentStore for PgAttachmentStore {
    async fn store(&self, ctx: &RequestContext, attachment: NewAttachment) -> AppResult<StoredAttachment> {
        let mut tx = self.transactions.begin().await?;
        let result = store_in(&mut tx, ctx, &attachment).await;
        let attachment_id = TransactionManager::finish(tx, result).await?;

        info!(
            attachment_id,
            target = %attachment.target,
            size = attachment.data.len(),
            "Attachment stored"
        );
        Ok(StoredAttachment {
            attachment_id,
            size: attachment.data.len() as u64,
            target: attachment.target,
            file_name: attachment.file_name,
        })
    }
}
