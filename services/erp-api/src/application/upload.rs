//! 附件流式上传
//!
//! 首条消息携带元数据与声明大小，其后为数据块；流结束时整体写入附件存储。

use std::sync::Arc;

use bridge_common::{EntityRef, RequestContext};
use bridge_errors::{AppError, AppResult};
use bridge_ports::{AttachmentStore, NewAttachment, StoredAttachment};
use bridge_query::validate::{require_id, require_table_name, require_text};
use futures::{Stream, StreamExt};
use tracing::{debug, info};

use super::entity::EntityHandler;

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// 上传元数据
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadMetadata {
    pub table_name: String,
    pub record_id: i64,
    pub file_name: String,
    pub content_type: String,
    pub total_size: i64,
}

/// 上传流中的一条消息
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadPart {
    Metadata(UploadMetadata),
    Chunk(Vec<u8>),
}

/// 数据块累积缓冲
#[derive(Debug)]
pub struct UploadBuffer {
    target: EntityRef,
    file_name: String,
    content_type: String,
    declared: usize,
    data: Vec<u8>,
}

impl UploadBuffer {
    /// 校验元数据，按声明大小预分配
    pub fn begin(metadata: UploadMetadata, max_size: usize) -> AppResult<Self> {
        let table_name = require_table_name(&metadata.table_name)?.to_string();
        let record_id = require_id("record_id", metadata.record_id)?;
        let file_name = require_text("file_name", &metadata.file_name)?.to_string();

        let declared = usize::try_from(metadata.total_size)
            .ok()
            .filter(|&size| size > 0)
            .ok_or_else(|| {
                AppError::validation(format!(
                    "total_size must be positive, got {}",
                    metadata.total_size
                ))
            })?;
        if declared > max_size {
            return Err(AppError::validation(format!(
                "File size {} exceeds maximum of {} bytes",
                declared, max_size
            )));
        }

        let content_type = match metadata.content_type.trim() {
            "" => DEFAULT_CONTENT_TYPE.to_string(),
            content_type => content_type.to_string(),
        };

        Ok(Self {
            target: EntityRef::new(table_name, record_id),
            file_name,
            content_type,
            declared,
            data: Vec::with_capacity(declared),
        })
    }

    pub fn target(&self) -> &EntityRef {
        &self.target
    }

    pub fn received(&self) -> usize {
        self.data.len()
    }

    pub fn push(&mut self, chunk: &[u8]) -> AppResult<()> {
        let received = self.data.len().saturating_add(chunk.len());
        if received > self.declared {
            return Err(AppError::validation(format!(
                "Received more than the declared {} bytes",
                self.declared
            )));
        }
        self.data.extend_from_slice(chunk);
        Ok(())
    }

    /// 流结束：大小必须与声明一致
    pub fn finish(self) -> AppResult<NewAttachment> {
        if self.data.len() != self.declared {
            return Err(AppError::validation(format!(
                "Received {} of {} declared bytes",
                self.data.len(),
                self.declared
            )));
        }
        Ok(NewAttachment {
            target: self.target,
            file_name: self.file_name,
            content_type: self.content_type,
            data: self.data,
        })
    }
}

pub struct UploadHandler {
    entities: Arc<EntityHandler>,
    store: Arc<dyn AttachmentStore>,
    max_file_size: usize,
}

impl UploadHandler {
    pub fn new(
        entities: Arc<EntityHandler>,
        store: Arc<dyn AttachmentStore>,
        max_file_size: usize,
    ) -> Self {
        Self {
            entities,
            store,
            max_file_size,
        }
    }

    pub async fn upload<S>(&self, ctx: &RequestContext, mut parts: S) -> AppResult<StoredAttachment>
    where
        S: Stream<Item = AppResult<UploadPart>> + Unpin + Send,
    {
        let metadata = match parts.next().await {
            Some(Ok(UploadPart::Metadata(metadata))) => metadata,
            Some(Ok(UploadPart::Chunk(_))) => {
                return Err(AppError::validation("First message must carry metadata"));
            }
            Some(Err(e)) => return Err(e),
            None => return Err(AppError::validation("Upload stream is empty")),
        };

        let mut buffer = UploadBuffer::begin(metadata, self.max_file_size)?;
        let target = buffer.target().clone();
        // 目标记录须对调用方可写
        self.entities
            .get_writable(ctx, &target.table_name, target.id)
            .await?;

        while let Some(part) = parts.next().await {
            match part? {
                UploadPart::Chunk(chunk) => buffer.push(&chunk)?,
                UploadPart::Metadata(_) => {
                    return Err(AppError::validation("Metadata may only be sent once"));
                }
            }
        }
        debug!(%target, received = buffer.received(), "Upload stream completed");

        let stored = self.store.store(ctx, buffer.finish()?).await?;
        info!(
            %target,
            attachment_id = stored.attachment_id,
            size = stored.size,
            "Attachment stored"
        );
        Ok(stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata(total_size: i64) -> UploadMetadata {
        UploadMetadata {
            table_name: "c_invoice".to_string(),
            record_id: 1000,
            file_name: "scan.pdf".to_string(),
            content_type: String::new(),
            total_size,
        }
    }

    #[test]
    fn test_exact_size_accepted() {
        let mut buffer = UploadBuffer::begin(metadata(6), 1024).unwrap();
        buffer.push(b"abc").unwrap();
        buffer.push(b"def").unwrap();
        let attachment = buffer.finish().unwrap();
        assert_eq!(attachment.data, b"abcdef");
        assert_eq!(attachment.content_type, DEFAULT_CONTENT_TYPE);
        assert_eq!(attachment.target, EntityRef::new("c_invoice", 1000));
    }

    #[test]
    fn test_overflow_rejected() {
        let mut buffer = UploadBuffer::begin(metadata(4), 1024).unwrap();
        buffer.push(b"abc").unwrap();
        let err = buffer.push(b"de").unwrap_err();
        assert!(err.to_string().contains("declared 4 bytes"));
    }

    #[test]
    fn test_short_stream_rejected() {
        let mut buffer = UploadBuffer::begin(metadata(10), 1024).unwrap();
        buffer.push(b"abc").unwrap();
        let err = buffer.finish().unwrap_err();
        assert!(err.to_string().contains("Received 3 of 10"));
    }

    #[test]
    fn test_metadata_limits() {
        assert!(UploadBuffer::begin(metadata(2048), 1024).is_err());
        assert!(UploadBuffer::begin(metadata(0), 1024).is_err());
        assert!(UploadBuffer::begin(metadata(-5), 1024).is_err());

        let mut bad = metadata(10);
        bad.file_name = "  ".to_string();
        assert!(UploadBuffer::begin(bad, 1024).is_err());
    }
}
