//! erp-api - ERP gRPC 桥接服务
//!
//! 通用实体读写与业务列表视图，统一经过列表查询层与访问限制。

pub mod api;
pub mod application;
pub mod infrastructure;

// 生成的 proto 代码
pub mod common {
    pub mod v1 {
        tonic::include_proto!("common.v1");
    }
}

pub mod erp {
    pub mod v1 {
        tonic::include_proto!("erp.v1");
    }
}

use std::sync::Arc;

use bridge_adapter_postgres::{
    PgAttachmentStore, PgEntityRepository, PgRecordSource, PgSchemaCatalog,
};
use bridge_bootstrap::{Infrastructure, context_interceptor};
use bridge_errors::AppResult;
use bridge_ports::SchemaCatalog;
use bridge_query::{AccessRestrictionInjector, PageLimits};
use tonic::transport::Server;
use tonic::transport::server::Router;
use tonic::service::interceptor::InterceptedService;
use tracing::info;

use api::{EntityServiceImpl, ListingServices, NoticeServiceImpl, PreferenceServiceImpl};
use application::{EntityHandler, ListingHandler, NoticeHandler, PreferenceHandler, UploadHandler};
use erp::v1::entity_service_server::EntityServiceServer;
use erp::v1::finance_service_server::FinanceServiceServer;
use erp::v1::inventory_service_server::InventoryServiceServer;
use erp::v1::log_service_server::LogServiceServer;
use erp::v1::notice_service_server::NoticeServiceServer;
use erp::v1::payroll_service_server::PayrollServiceServer;
use erp::v1::preference_service_server::PreferenceServiceServer;
use erp::v1::workflow_service_server::WorkflowServiceServer;
use infrastructure::RoleSecurityEngine;

pub const FILE_DESCRIPTOR_SET: &[u8] = tonic::include_file_descriptor_set!("erp_descriptor");

/// 组装处理器并注册全部 gRPC 服务
pub async fn build_services(infra: Infrastructure, mut server: Server) -> AppResult<Router> {
    let config = infra.config();
    let pool = infra.postgres_pool();

    let catalog: Arc<dyn SchemaCatalog> = Arc::new(PgSchemaCatalog::new(
        pool.clone(),
        config.query.schema_cache_capacity,
    ));
    let security = Arc::new(RoleSecurityEngine::new(
        pool.clone(),
        catalog.clone(),
        config.query.access_cache_capacity,
    ));
    let injector = AccessRestrictionInjector::new(security);
    let source = Arc::new(PgRecordSource::new(pool.clone()));
    let limits = PageLimits::new(config.query.default_page_size, config.query.max_page_size);

    let listing = Arc::new(ListingHandler::new(
        catalog.clone(),
        source.clone(),
        injector.clone(),
        limits,
    ));
    let entities = Arc::new(EntityHandler::new(
        catalog,
        Arc::new(PgEntityRepository::new(pool.clone())),
        injector,
        config.query.schema_cache_capacity,
    ));
    let uploads = Arc::new(UploadHandler::new(
        entities.clone(),
        Arc::new(PgAttachmentStore::new(pool)),
        usize::try_from(config.upload.max_file_size).unwrap_or(usize::MAX),
    ));
    let notices = Arc::new(NoticeHandler::new(entities.clone()));
    let preferences = Arc::new(PreferenceHandler::new(entities.clone(), source));
    info!(
        default_page_size = limits.default_size,
        max_page_size = limits.max_size,
        "Handlers initialized"
    );

    let listing_services = ListingServices::new(listing.clone());
    Ok(server
        .add_service(InterceptedService::new(
            EntityServiceServer::new(EntityServiceImpl::new(listing.clone(), entities, uploads)),
            context_interceptor,
        ))
        .add_service(InterceptedService::new(
            FinanceServiceServer::new(listing_services.clone()),
            context_interceptor,
        ))
        .add_service(InterceptedService::new(
            InventoryServiceServer::new(listing_services.clone()),
            context_interceptor,
        ))
        .add_service(InterceptedService::new(
            WorkflowServiceServer::new(listing_services.clone()),
            context_interceptor,
        ))
        .add_service(InterceptedService::new(
            LogServiceServer::new(listing_services.clone()),
            context_interceptor,
        ))
        .add_service(InterceptedService::new(
            PayrollServiceServer::new(listing_services),
            context_interceptor,
        ))
        .add_service(InterceptedService::new(
            NoticeServiceServer::new(NoticeServiceImpl::new(listing, notices)),
            context_interceptor,
        ))
        .add_service(InterceptedService::new(
            PreferenceServiceServer::new(PreferenceServiceImpl::new(preferences)),
            context_interceptor,
        )))
}
