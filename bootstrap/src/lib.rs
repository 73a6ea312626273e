//! bridge-bootstrap - 统一服务启动骨架
//!
//! 配置加载、日志初始化、数据库连接、请求上下文拦截、
//! 健康检查与 metrics 端点

mod grpc_metrics;
mod health;
mod infrastructure;
mod interceptor;
mod reflection;
mod runtime;
mod starter;

pub use grpc_metrics::*;
pub use health::*;
pub use infrastructure::*;
pub use interceptor::*;
pub use reflection::*;
pub use runtime::*;
pub use starter::*;
