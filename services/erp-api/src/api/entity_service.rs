//! EntityService：任意表的通用读写

use std::sync::Arc;

use bridge_bootstrap::{GrpcTimer, request_context};
use bridge_errors::AppError;
use futures::StreamExt;
use tonic::{Request, Response, Status, Streaming};

use crate::application::{
    EntityHandler, ListQuery, ListingHandler, UploadHandler, UploadMetadata, UploadPart,
};
use crate::common::v1::{Entity, ListEntitiesResponse};
use crate::erp::v1::entity_service_server::EntityService;
use crate::erp::v1::upload_attachment_request::Payload;
use crate::erp::v1::*;

use super::conversions::*;

const SERVICE: &str = "erp.v1.EntityService";

fn upload_part(message: Result<UploadAttachmentRequest, Status>) -> Result<UploadPart, AppError> {
    match message {
        Ok(UploadAttachmentRequest {
            payload: Some(Payload::Metadata(m)),
        }) => Ok(UploadPart::Metadata(UploadMetadata {
            table_name: m.table_name,
            record_id: m.record_id,
            file_name: m.file_name,
            content_type: m.content_type,
            total_size: m.total_size,
        })),
        Ok(UploadAttachmentRequest {
            payload: Some(Payload::Chunk(chunk)),
        }) => Ok(UploadPart::Chunk(chunk)),
        Ok(UploadAttachmentRequest { payload: None }) => {
            Err(AppError::validation("Upload message without payload"))
        }
        Err(status) => Err(AppError::internal(format!(
            "Upload stream failed: {}",
            status.message()
        ))),
    }
}

pub struct EntityServiceImpl {
    listing: Arc<ListingHandler>,
    entities: Arc<EntityHandler>,
    uploads: Arc<UploadHandler>,
}

impl EntityServiceImpl {
    pub fn new(
        listing: Arc<ListingHandler>,
        entities: Arc<EntityHandler>,
        uploads: Arc<UploadHandler>,
    ) -> Self {
        Self {
            listing,
            entities,
            uploads,
        }
    }
}

#[tonic::async_trait]
impl EntityService for EntityServiceImpl {
    async fn list_entities(
        &self,
        request: Request<ListEntitiesRequest>,
    ) -> Result<Response<ListEntitiesResponse>, Status> {
        let timer = GrpcTimer::start(SERVICE, "ListEntities");
        let result = async {
            let ctx = request_context(&request)?;
            let req = request.into_inner();
            let table_name = req.table_name.trim().to_string();
            let query = ListQuery::new(table_name.clone(), list_params(req.list)?);
            let page = self.listing.list(&ctx, query).await?;
            Ok::<_, Status>(Response::new(list_response(&table_name, page)))
        }
        .await;
        timer.finish(result)
    }

    async fn get_entity(
        &self,
        request: Request<GetEntityRequest>,
    ) -> Result<Response<Entity>, Status> {
        let timer = GrpcTimer::start(SERVICE, "GetEntity");
        let result = async {
            let ctx = request_context(&request)?;
            let req = request.into_inner();
            let record = self.entities.get(&ctx, &req.table_name, req.id).await?;
            Ok::<_, Status>(Response::new(entity_to_proto(req.table_name.trim(), &record)))
        }
        .await;
        timer.finish(result)
    }

    async fn create_entity(
        &self,
        request: Request<CreateEntityRequest>,
    ) -> Result<Response<Entity>, Status> {
        let timer = GrpcTimer::start(SERVICE, "CreateEntity");
        let result = async {
            let ctx = request_context(&request)?;
            let req = request.into_inner();
            let attributes = attributes_from_proto(req.attributes)?;
            let record = self
                .entities
                .create(&ctx, &req.table_name, &attributes)
                .await?;
            Ok::<_, Status>(Response::new(entity_to_proto(req.table_name.trim(), &record)))
        }
        .await;
        timer.finish(result)
    }

    async fn update_entity(
        &self,
        request: Request<UpdateEntityRequest>,
    ) -> Result<Response<Entity>, Status> {
        let timer = GrpcTimer::start(SERVICE, "UpdateEntity");
        let result = async {
            let ctx = request_context(&request)?;
            let req = request.into_inner();
            let attributes = attributes_from_proto(req.attributes)?;
            let record = self
                .entities
                .update(&ctx, &req.table_name, req.id, &attributes)
                .await?;
            Ok::<_, Status>(Response::new(entity_to_proto(req.table_name.trim(), &record)))
        }
        .await;
        timer.finish(result)
    }

    async fn delete_entity(
        &self,
        request: Request<DeleteEntityRequest>,
    ) -> Result<Response<()>, Status> {
        let timer = GrpcTimer::start(SERVICE, "DeleteEntity");
        let result = async {
            let ctx = request_context(&request)?;
            let req = request.into_inner();
            self.entities.delete(&ctx, &req.table_name, req.id).await?;
            Ok::<_, Status>(Response::new(()))
        }
        .await;
        timer.finish(result)
    }

    async fn upload_attachment(
        &self,
        request: Request<Streaming<UploadAttachmentRequest>>,
    ) -> Result<Response<Attachment>, Status> {
        let timer = GrpcTimer::start(SERVICE, "UploadAttachment");
        let result = async {
            let ctx = request_context(&request)?;
            let parts = Box::pin(request.into_inner().map(upload_part));
            let stored = self.uploads.upload(&ctx, parts).await?;
            Ok::<_, Status>(Response::new(Attachment {
                attachment_id: stored.attachment_id,
                table_name: stored.target.table_name,
                record_id: stored.target.id,
                file_name: stored.file_name,
                size: i64::try_from(stored.size).unwrap_or(i64::MAX),
            }))
        }
        .await;
        timer.finish(result)
    }
}
