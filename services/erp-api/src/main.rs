//! erp-api 服务入口

use bridge_bootstrap::run_server;
use erp_api::{FILE_DESCRIPTOR_SET, build_services};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    run_server("config", &[FILE_DESCRIPTOR_SET], build_services).await
}
