//! 业务列表服务：财务、库存、工作流、变更日志、薪资

use std::sync::Arc;

use bridge_bootstrap::{GrpcTimer, request_context};
use bridge_common::RequestContext;
use tonic::{Request, Response, Status};

use crate::application::{ListQuery, ListingHandler, views};
use crate::common::v1::ListEntitiesResponse;
use crate::erp::v1::finance_service_server::FinanceService;
use crate::erp::v1::inventory_service_server::InventoryService;
use crate::erp::v1::log_service_server::LogService;
use crate::erp::v1::payroll_service_server::PayrollService;
use crate::erp::v1::workflow_service_server::WorkflowService;
use crate::erp::v1::*;

use super::conversions::{list_params, list_response};

/// 执行视图查询，响应中的表名取视图的表
async fn run(
    listing: &ListingHandler,
    ctx: &RequestContext,
    query: ListQuery,
) -> Result<Response<ListEntitiesResponse>, Status> {
    let table_name = query.table_name.clone();
    let page = listing.list(ctx, query).await?;
    Ok(Response::new(list_response(&table_name, page)))
}

/// 所有列表服务共享同一个列表处理器
#[derive(Clone)]
pub struct ListingServices {
    listing: Arc<ListingHandler>,
}

impl ListingServices {
    pub fn new(listing: Arc<ListingHandler>) -> Self {
        Self { listing }
    }
}

#[tonic::async_trait]
impl FinanceService for ListingServices {
    async fn list_accounting_facts(
        &self,
        request: Request<ListAccountingFactsRequest>,
    ) -> Result<Response<ListEntitiesResponse>, Status> {
        let timer = GrpcTimer::start("erp.v1.FinanceService", "ListAccountingFacts");
        let result = async {
            let ctx = request_context(&request)?;
            let req = request.into_inner();
            let query = views::accounting_facts(
                list_params(req.list)?,
                req.ad_table_id,
                req.record_id,
                req.c_acctschema_id,
            )?;
            run(&self.listing, &ctx, query).await
        }
        .await;
        timer.finish(result)
    }

    async fn list_bank_statements(
        &self,
        request: Request<ListBankStatementsRequest>,
    ) -> Result<Response<ListEntitiesResponse>, Status> {
        let timer = GrpcTimer::start("erp.v1.FinanceService", "ListBankStatements");
        let result = async {
            let ctx = request_context(&request)?;
            let req = request.into_inner();
            let query = views::bank_statements(
                list_params(req.list)?,
                req.c_bankaccount_id,
            )?;
            run(&self.listing, &ctx, query).await
        }
        .await;
        timer.finish(result)
    }

    async fn list_bank_statement_lines(
        &self,
        request: Request<ListBankStatementLinesRequest>,
    ) -> Result<Response<ListEntitiesResponse>, Status> {
        let timer = GrpcTimer::start("erp.v1.FinanceService", "ListBankStatementLines");
        let result = async {
            let ctx = request_context(&request)?;
            let req = request.into_inner();
            let query = views::bank_statement_lines(
                list_params(req.list)?,
                req.c_bankstatement_id,
            )?;
            run(&self.listing, &ctx, query).await
        }
        .await;
        timer.finish(result)
    }
}

#[tonic::async_trait]
impl InventoryService for ListingServices {
    async fn list_movements(
        &self,
        request: Request<ListInventoryMovementsRequest>,
    ) -> Result<Response<ListEntitiesResponse>, Status> {
        let timer = GrpcTimer::start("erp.v1.InventoryService", "ListMovements");
        let result = async {
            let ctx = request_context(&request)?;
            let req = request.into_inner();
            let query = views::movements(
                list_params(req.list)?,
                &req.doc_status,
            );
            run(&self.listing, &ctx, query).await
        }
        .await;
        timer.finish(result)
    }

    async fn list_movement_lines(
        &self,
        request: Request<ListMovementLinesRequest>,
    ) -> Result<Response<ListEntitiesResponse>, Status> {
        let timer = GrpcTimer::start("erp.v1.InventoryService", "ListMovementLines");
        let result = async {
            let ctx = request_context(&request)?;
            let req = request.into_inner();
            let query = views::movement_lines(
                list_params(req.list)?,
                req.m_movement_id,
            )?;
            run(&self.listing, &ctx, query).await
        }
        .await;
        timer.finish(result)
    }
}

#[tonic::async_trait]
impl WorkflowService for ListingServices {
    async fn list_activities(
        &self,
        request: Request<ListActivitiesRequest>,
    ) -> Result<Response<ListEntitiesResponse>, Status> {
        let timer = GrpcTimer::start("erp.v1.WorkflowService", "ListActivities");
        let result = async {
            let ctx = request_context(&request)?;
            let req = request.into_inner();
            let query = views::activities(&ctx, list_params(req.list)?);
            run(&self.listing, &ctx, query).await
        }
        .await;
        timer.finish(result)
    }
}

#[tonic::async_trait]
impl LogService for ListingServices {
    async fn list_change_logs(
        &self,
        request: Request<ListChangeLogsRequest>,
    ) -> Result<Response<ListEntitiesResponse>, Status> {
        let timer = GrpcTimer::start("erp.v1.LogService", "ListChangeLogs");
        let result = async {
            let ctx = request_context(&request)?;
            let req = request.into_inner();
            let query = views::change_logs(
                list_params(req.list)?,
                req.ad_table_id,
                req.record_id,
            )?;
            run(&self.listing, &ctx, query).await
        }
        .await;
        timer.finish(result)
    }
}

#[tonic::async_trait]
impl PayrollService for ListingServices {
    async fn list_movements(
        &self,
        request: Request<ListPayrollMovementsRequest>,
    ) -> Result<Response<ListEntitiesResponse>, Status> {
        let timer = GrpcTimer::start("erp.v1.PayrollService", "ListMovements");
        let result = async {
            let ctx = request_context(&request)?;
            let req = request.into_inner();
            let query = views::payroll_movements(
                list_params(req.list)?,
                req.c_bpartner_id,
                req.hr_process_id,
            )?;
            run(&self.listing, &ctx, query).await
        }
        .await;
        timer.finish(result)
    }
}
