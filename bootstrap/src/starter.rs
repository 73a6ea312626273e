//! 服务启动器

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use bridge_config::AppConfig;
use bridge_errors::{AppError, AppResult};
use tonic::transport::Server;
use tonic::transport::server::Router;
use tracing::{error, info};

use crate::grpc_metrics::MetricsRecorder;
use crate::health::{HealthChecker, HealthServer};
use crate::infrastructure::Infrastructure;
use crate::reflection::build_reflection;
use crate::runtime::{init_runtime, shutdown_signal};

/// 健康检查端口：gRPC 端口 + 1000
pub fn health_port(grpc_port: u16) -> AppResult<u16> {
    grpc_port
        .checked_add(1000)
        .ok_or_else(|| AppError::validation(format!("gRPC port {} leaves no room for the health port", grpc_port)))
}

/// 运行 gRPC 服务
///
/// 1. 加载配置并初始化日志
/// 2. 安装 Prometheus 记录器，创建数据库连接池
/// 3. 启动健康检查 HTTP 服务器
/// 4. 由闭包注册业务服务，再追加反射服务
/// 5. 收到关闭信号后优雅退出
///
/// ```ignore
/// bridge_bootstrap::run_server("config", &[FILE_DESCRIPTOR_SET], |infra, mut server| async move {
///     Ok(server.add_service(EntityServiceServer::new(EntityServiceImpl::new(infra))))
/// })
/// .await
/// ```
pub async fn run_server<F, Fut>(
    config_dir: &str,
    file_descriptor_sets: &[&'static [u8]],
    service_builder: F,
) -> Result<(), Box<dyn std::error::Error>>
where
    F: FnOnce(Infrastructure, Server) -> Fut,
    Fut: Future<Output = AppResult<Router>>,
{
    let config = AppConfig::load(config_dir)?;
    init_runtime(&config);
    info!("Starting {} service", config.app_name);

    let metrics = Arc::new(MetricsRecorder::install()?);
    let infra = Infrastructure::from_config(config.clone()).await?;

    let health_server = HealthServer::new(
        Arc::new(HealthChecker::new(infra.postgres_pool())),
        metrics,
        health_port(config.server.port)?,
    );
    let health_handle = tokio::spawn(async move {
        if let Err(e) = health_server.serve().await {
            error!(error = %e, "Health server error");
        }
    });

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let reflection = build_reflection(file_descriptor_sets)?;
    let router = service_builder(infra, Server::builder()).await?;

    info!(%addr, "gRPC server starting");
    router
        .add_service(reflection)
        .serve_with_shutdown(addr, shutdown_signal())
        .await?;

    health_handle.abort();
    info!("Service stopped");
    Ok(())
}
