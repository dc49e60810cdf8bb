//! # 用户管理 REST 服务
//!
//! 基于 Axum 的用户 CRUD 服务：
//! - 输入校验与规范化
//! - 邮箱唯一性检查（应用层检查 + 存储层唯一索引）
//! - 分页与名称过滤
//! - 内存和 PostgreSQL 两种存储后端
//!
//! `inventory` 模块提供库存应用使用的本地偏好存储、物品存储和定时笑话任务。

pub mod app;
pub mod config;
pub mod common;
pub mod infrastructure;
pub mod inventory;

pub use app::create_router;
pub use app::users::handler::AppState;
pub use app::users::service::UserService;
pub use config::Config;
pub use common::error::AppError;
