use anyhow::Context;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::info;

use user_service::config::load_config;
use user_service::infrastructure::{build_store, logger::Logger};
use user_service::{create_router, AppState, UserService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = load_config().context("failed to load configuration")?;
    let _log_guard = Logger::init(&config.logging)?;

    info!("Starting user service...");

    // 存储句柄在启动时构造一次，由所有请求共享
    let store = build_store(&config.database)
        .await
        .context("failed to initialize user store")?;
    let state = AppState {
        user_service: UserService::new(store, config.pagination.clone()),
    };

    let app = create_router(
        state,
        Duration::from_secs(config.server.request_timeout_secs),
    );

    let addr = format!("{}:{}", config.server.bind_address, config.server.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    info!("🚀 User service running on http://{}", listener.local_addr()?);
    info!("   GET    /health");
    info!("   GET    /api/users?page=&limit=&name=");
    info!("   POST   /api/users");
    info!("   GET    /api/users/:id");
    info!("   PUT    /api/users/:id");
    info!("   DELETE /api/users/:id");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
