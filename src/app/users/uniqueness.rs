//! 邮箱唯一性检查
//!
//! 这只是应用层的快速检查，检查与写入之间不是原子的；
//! 真正的约束由存储层唯一索引保证，见 `repository` 中的重复键映射。

use uuid::Uuid;

use super::repository::{UserRepository, DUPLICATE_EMAIL_MESSAGE};
use crate::common::error::AppError;

pub const EMAIL_IN_USE_MESSAGE: &str = "Email already in use by another user";

/// 创建路径：任何同邮箱记录都算冲突
pub async fn ensure_email_free(repo: &UserRepository, email: &str) -> Result<(), AppError> {
    match repo.find_by_email(email, None).await? {
        Some(_) => Err(AppError::Conflict(DUPLICATE_EMAIL_MESSAGE.to_string())),
        None => Ok(()),
    }
}

/// 更新路径：只有其他记录使用该邮箱才算冲突
pub async fn ensure_email_free_for(
    repo: &UserRepository,
    email: &str,
    id: Uuid,
) -> Result<(), AppError> {
    match repo.find_by_email(email, Some(id)).await? {
        Some(_) => Err(AppError::Conflict(EMAIL_IN_USE_MESSAGE.to_string())),
        None => Ok(()),
    }
}
