//! 基础设施资源
//!
//! 配置与 PostgreSQL 连接池，启动时创建一次，各服务共享

use bridge_adapter_postgres::{PostgresConfig, check_connection, create_pool};
use bridge_config::AppConfig;
use bridge_errors::AppResult;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use tracing::info;

/// 基础设施资源容器
#[derive(Clone)]
pub struct Infrastructure {
    config: AppConfig,
    postgres_pool: PgPool,
}

impl Infrastructure {
    /// 从配置创建；连接失败直接返回错误，不重试
    pub async fn from_config(config: AppConfig) -> AppResult<Self> {
        let pg_config = PostgresConfig::new(config.database.url.expose_secret())
            .with_application_name(config.app_name.clone())
            .with_max_connections(config.database.max_connections);
        let postgres_pool = create_pool(&pg_config).await?;
        check_connection(&postgres_pool).await?;
        info!(
            max_connections = config.database.max_connections,
            "Infrastructure ready"
        );

        Ok(Self {
            config,
            postgres_pool,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// 连接池句柄（内部是 Arc，克隆代价低）
    pub fn postgres_pool(&self) -> PgPool {
        self.postgres_pool.clone()
    }
}
