//! NoticeService：通知列表与确认

use std::sync::Arc;

use bridge_bootstrap::{GrpcTimer, request_context};
use tonic::{Request, Response, Status};

use crate::application::notice::NOTICE_TABLE;
use crate::application::{ListingHandler, NoticeHandler, views};
use crate::common::v1::{Entity, ListEntitiesResponse};
use crate::erp::v1::notice_service_server::NoticeService;
use crate::erp::v1::*;

use super::conversions::{entity_to_proto, list_params, list_response};

const SERVICE: &str = "erp.v1.NoticeService";

pub struct NoticeServiceImpl {
    listing: Arc<ListingHandler>,
    notices: Arc<NoticeHandler>,
}

impl NoticeServiceImpl {
    pub fn new(listing: Arc<ListingHandler>, notices: Arc<NoticeHandler>) -> Self {
        Self { listing, notices }
    }
}

#[tonic::async_trait]
impl NoticeService for NoticeServiceImpl {
    async fn list_notices(
        &self,
        request: Request<ListNoticesRequest>,
    ) -> Result<Response<ListEntitiesResponse>, Status> {
        let timer = GrpcTimer::start(SERVICE, "ListNotices");
        let result = async {
            let ctx = request_context(&request)?;
            let req = request.into_inner();
            let query = views::notices(&ctx, list_params(req.list)?, req.include_processed);
            let page = self.listing.list(&ctx, query).await?;
            Ok::<_, Status>(Response::new(list_response(NOTICE_TABLE, page)))
        }
        .await;
        timer.finish(result)
    }

    async fn acknowledge_notice(
        &self,
        request: Request<AcknowledgeNoticeRequest>,
    ) -> Result<Response<Entity>, Status> {
        let timer = GrpcTimer::start(SERVICE, "AcknowledgeNotice");
        let result = async {
            let ctx = request_context(&request)?;
            let req = request.into_inner();
            let record = self.notices.acknowledge(&ctx, req.notice_id).await?;
            Ok::<_, Status>(Response::new(entity_to_proto(NOTICE_TABLE, &record)))
        }
        .await;
        timer.finish(result)
    }
}
