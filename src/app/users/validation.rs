//! 输入校验与规范化

use validator::Validate;

use super::model::{CreateUserRequest, NewUser, UpdateUserRequest, UserPatch};
use crate::common::error::AppError;

/// 校验消息按请求体字段的声明顺序输出
const FIELD_ORDER: &[&str] = &["name", "email", "age"];

fn trimmed(value: Option<String>) -> Option<String> {
    value.map(|s| s.trim().to_string())
}

/// 创建模式：`name` 与 `email` 必填，去除首尾空白后不能为空
pub fn validate_create(raw: CreateUserRequest) -> Result<NewUser, AppError> {
    let user = NewUser {
        name: trimmed(raw.name).unwrap_or_default(),
        email: trimmed(raw.email).unwrap_or_default(),
        age: raw.age,
    };
    user
        .validate()
        .map_err(|err| AppError::from_validation(&err, FIELD_ORDER))?;
    Ok(user)
}

/// 更新模式：所有字段可选，出现的字段按创建时的规则校验
pub fn validate_update(raw: UpdateUserRequest) -> Result<UserPatch, AppError> {
    let patch = UserPatch {
        name: trimmed(raw.name),
        email: trimmed(raw.email),
        age: raw.age,
    };
    patch
        .validate()
        .map_err(|err| AppError::from_validation(&err, FIELD_ORDER))?;
    Ok(patch)
}
