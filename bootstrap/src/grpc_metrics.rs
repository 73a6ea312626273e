//! Metrics 模块
//!
//! Prometheus 导出与 gRPC 请求指标

use std::time::Instant;

use bridge_errors::{AppError, AppResult};
use metrics::{counter, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Metrics 记录器
pub struct MetricsRecorder {
    handle: PrometheusHandle,
}

impl MetricsRecorder {
    /// 安装全局 Prometheus 记录器
    pub fn install() -> AppResult<Self> {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .map_err(|e| AppError::internal(format!("Failed to install Prometheus recorder: {}", e)))?;
        Ok(Self { handle })
    }

    /// Prometheus 文本格式
    pub fn render(&self) -> String {
        self.handle.render()
    }
}

/// 记录 gRPC 请求
pub fn record_grpc_request(service: &str, method: &str, status: &str, duration_ms: f64) {
    let labels = [
        ("service", service.to_string()),
        ("method", method.to_string()),
        ("status", status.to_string()),
    ];

    counter!("grpc_requests_total", &labels).increment(1);
    histogram!("grpc_request_duration_ms", &labels).record(duration_ms);
}

/// 单次 gRPC 调用计时
pub struct GrpcTimer {
    service: &'static str,
    method: &'static str,
    started: Instant,
}

impl GrpcTimer {
    pub fn start(service: &'static str, method: &'static str) -> Self {
        Self {
            service,
            method,
            started: Instant::now(),
        }
    }

    /// 按调用结果记录并原样返回
    pub fn finish<T>(self, result: Result<T, tonic::Status>) -> Result<T, tonic::Status> {
        let status = match &result {
            Ok(_) => "OK".to_string(),
            Err(status) => format!("{:?}", status.code()),
        };
        record_grpc_request(
            self.service,
            self.method,
            &status,
            self.started.elapsed().as_secs_f64() * 1000.0,
        );
        result
    }
}
