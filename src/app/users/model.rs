//! 用户数据模型

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// 已持久化的用户记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "database", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 创建用户请求（原始输入）
#[derive(Debug, Default, Deserialize)]
pub struct CreateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub age: Option<f64>,
}

/// 更新用户请求（原始输入），所有字段可选
#[derive(Debug, Default, Deserialize)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub age: Option<f64>,
}

/// 校验并规范化后的新用户
#[derive(Debug, Clone, PartialEq, Validate)]
pub struct NewUser {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[validate(length(min = 1, message = "Email is required"))]
    pub email: String,
    pub age: Option<f64>,
}

/// 校验并规范化后的部分更新
#[derive(Debug, Clone, Default, PartialEq, Validate)]
pub struct UserPatch {
    #[validate(length(min = 1, message = "Name cannot be empty"))]
    pub name: Option<String>,
    #[validate(length(min = 1, message = "Email cannot be empty"))]
    pub email: Option<String>,
    pub age: Option<f64>,
}

/// 列表查询过滤条件
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserFilter {
    /// 名称子串，大小写不敏感
    pub name: Option<String>,
}

impl UserFilter {
    pub fn matches(&self, user: &User) -> bool {
        match &self.name {
            Some(needle) => user.name.to_lowercase().contains(&needle.to_lowercase()),
            None => true,
        }
    }
}

/// 列表查询参数
#[derive(Debug, Default, Deserialize)]
pub struct ListUsersQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub name: Option<String>,
}
