//! 通用模块：错误、响应、分页、提取器和中间件

pub mod error;
pub mod extract;
pub mod middleware;
pub mod pagination;
pub mod response;
