//! 用户资源：校验、唯一性检查、持久化适配和服务层

pub mod handler;
pub mod model;
pub mod repository;
pub mod service;
pub mod store;
pub mod uniqueness;
pub mod validation;

use axum::{routing::get, Router};

use super::route_not_found;
use handler::AppState;

/// `/api/users` 下的路由
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handler::list_users).post(handler::create_user))
        .route(
            "/:id",
            get(handler::get_user)
                .put(handler::update_user)
                .delete(handler::delete_user),
        )
        .method_not_allowed_fallback(route_not_found)
}
