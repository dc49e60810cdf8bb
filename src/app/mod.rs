//! 应用路由装配

pub mod users;

use axum::{
    error_handling::HandleErrorLayer, extract::OriginalUri, middleware, response::Json,
    routing::get, BoxError, Router,
};
use std::time::Duration;
use tower::{timeout::TimeoutLayer, ServiceBuilder};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::common::error::AppError;
use crate::common::middleware::request_logging_middleware;
use users::handler::AppState;

/// 健康检查，不检查任何依赖
async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "success": true,
        "message": "Server is running",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

/// 未匹配的路径和不支持的方法都返回 404
pub(crate) async fn route_not_found(OriginalUri(uri): OriginalUri) -> AppError {
    AppError::NotFound(format!("Route {} not found", uri.path()))
}

async fn handle_middleware_error(err: BoxError) -> AppError {
    if err.is::<tower::timeout::error::Elapsed>() {
        AppError::Timeout
    } else {
        AppError::Internal(format!("unhandled middleware error: {}", err))
    }
}

/// 创建完整的应用路由
pub fn create_router(state: AppState, request_timeout: Duration) -> Router {
    let router = Router::new()
        .route("/health", get(health_check))
        .method_not_allowed_fallback(route_not_found)
        .nest("/api/users", users::routes())
        .fallback(route_not_found)
        .with_state(state);

    with_middleware(router, request_timeout)
}

/// 外层中间件，按自外向内的顺序排列
fn with_middleware(router: Router, request_timeout: Duration) -> Router {
    router.layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            )
            .layer(HandleErrorLayer::new(handle_middleware_error))
            .layer(TimeoutLayer::new(request_timeout))
            .layer(middleware::from_fn(request_logging_middleware)),
    )
}
