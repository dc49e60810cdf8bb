//! 核心响应处理模块

use serde::Serialize;

use super::pagination::Pagination;

/// API 响应结构
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data,
            pagination: None,
        }
    }

    /// 带分页信息的列表响应
    pub fn paginated(data: T, pagination: Pagination, message: impl Into<String>) -> Self {
        Self {
            pagination: Some(pagination),
            ..Self::success(data, message)
        }
    }
}
