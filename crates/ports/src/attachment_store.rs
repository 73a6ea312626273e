//! 附件存储

use async_trait::async_trait;
use bridge_common::{EntityRef, RequestContext};
use bridge_errors::AppResult;

/// 待写入的附件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAttachment {
    pub target: EntityRef,
    pub file_name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

/// 已写入的附件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredAttachment {
    pub attachment_id: i64,
    pub target: EntityRef,
    pub file_name: String,
    pub size: u64,
}

#[async_trait]
pub trait AttachmentStore: Send + Sync {
    /// 写入附件，目标表不存在时返回 NotFound
    async fn store(&self, ctx: &RequestContext, attachment: NewAttachment) -> AppResult<StoredAttachment>;
}
