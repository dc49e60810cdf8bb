//! 请求提取器

use axum::extract::{FromRequest, FromRequestParts};

use super::error::AppError;

/// JSON 请求体提取器，解析失败时返回统一的 400 错误响应
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

/// 查询字符串提取器，解析失败时同样返回统一的错误响应
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct AppQuery<T>(pub T);
