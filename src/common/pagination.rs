//! 分页计算

use serde::Serialize;

use crate::config::PaginationConfig;

/// 规范化后的分页请求，`page` 和 `limit` 都不小于 1
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub limit: u64,
}

impl PageRequest {
    /// 根据原始查询参数构造分页请求
    ///
    /// 缺失、无法解析或小于 1 的 `page` 视为 1，`limit` 同理回退到默认值，
    /// 并且不会超过配置的上限。
    pub fn from_query(page: Option<&str>, limit: Option<&str>, config: &PaginationConfig) -> Self {
        let page = parse_positive(page).unwrap_or(1);
        let limit = parse_positive(limit)
            .unwrap_or(config.default_limit)
            .min(config.max_limit)
            .max(1);

        Self { page, limit }
    }

    pub fn skip(&self) -> u64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

fn parse_positive(raw: Option<&str>) -> Option<u64> {
    raw.and_then(|s| s.trim().parse::<u64>().ok())
        .filter(|n| *n > 0)
}

/// 分页元数据
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: u64,
    pub total_pages: u64,
    #[serde(rename = "totalUsers")]
    pub total: u64,
    pub has_more: bool,
}

impl Pagination {
    /// `returned` 是本页实际返回的记录数，`total` 是忽略分页的匹配总数
    pub fn compute(request: PageRequest, returned: usize, total: u64) -> Self {
        Self {
            current_page: request.page,
            total_pages: total.div_ceil(request.limit),
            total,
            has_more: request.skip().saturating_add(returned as u64) < total,
        }
    }
}
