//! 基础设施：存储后端和日志

#[cfg(feature = "database")]
pub mod database;
pub mod logger;
pub mod memory;

use std::sync::Arc;
use tracing::info;

use crate::app::users::store::SharedUserStore;
use crate::config::{DatabaseConfig, StoreBackend};

/// 按配置构造存储后端，进程启动时调用一次
pub async fn build_store(config: &DatabaseConfig) -> anyhow::Result<SharedUserStore> {
    match config.backend {
        StoreBackend::Memory => {
            info!("Using in-memory user store");
            Ok(Arc::new(memory::MemoryUserStore::new()))
        }
        #[cfg(feature = "database")]
        StoreBackend::Postgres => {
            let manager = database::DatabaseManager::new(config).await?;
            manager.ensure_schema().await?;
            Ok(Arc::new(manager.into_store()))
        }
        #[cfg(not(feature = "database"))]
        StoreBackend::Postgres => {
            anyhow::bail!("postgres backend requires the `database` feature")
        }
    }
}
