//! 用户存储接口
//!
//! 具体后端位于 `infrastructure`，启动时构造并注入服务层。

use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use super::model::{NewUser, User, UserFilter, UserPatch};

/// 存储层错误
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// 违反存储层唯一索引
    #[error("duplicate value for unique field `{field}`")]
    Duplicate { field: &'static str },
    #[error("store backend error: {0}")]
    Backend(String),
}

/// 一页查询结果
#[derive(Debug, Clone, PartialEq)]
pub struct UserPage {
    pub users: Vec<User>,
    /// 忽略分页的匹配总数
    pub total: u64,
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    /// 查找邮箱相同的记录，`exclude` 指定的 id 不参与匹配
    async fn find_by_email(
        &self,
        email: &str,
        exclude: Option<Uuid>,
    ) -> Result<Option<User>, StoreError>;

    async fn insert(&self, user: NewUser) -> Result<User, StoreError>;

    /// 部分更新，记录不存在时返回 `None`
    async fn update(&self, id: Uuid, patch: UserPatch) -> Result<Option<User>, StoreError>;

    /// 删除并返回被删除的记录
    async fn delete(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    /// 按创建时间倒序返回匹配记录中的一页
    async fn list(&self, filter: &UserFilter, skip: u64, limit: u64)
        -> Result<UserPage, StoreError>;
}

pub type SharedUserStore = Arc<dyn UserStore>;
