//! 内存存储后端
//!
//! 用于开发和测试。与数据库后端一样在存储层强制邮箱唯一。

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::app::users::model::{NewUser, User, UserFilter, UserPatch};
use crate::app::users::store::{StoreError, UserPage, UserStore};

struct Row {
    user: User,
    /// 插入序号，创建时间相同时用于稳定排序
    seq: u64,
}

#[derive(Default)]
struct Table {
    rows: HashMap<Uuid, Row>,
    next_seq: u64,
}

impl Table {
    fn email_taken(&self, email: &str, exclude: Option<Uuid>) -> Option<&User> {
        self.rows
            .values()
            .map(|row| &row.user)
            .find(|u| u.email == email && Some(u.id) != exclude)
    }
}

#[derive(Default)]
pub struct MemoryUserStore {
    table: RwLock<Table>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let table = self.table.read().await;
        Ok(table.rows.get(&id).map(|row| row.user.clone()))
    }

    async fn find_by_email(
        &self,
        email: &str,
        exclude: Option<Uuid>,
    ) -> Result<Option<User>, StoreError> {
        let table = self.table.read().await;
        Ok(table.email_taken(email, exclude).cloned())
    }

    async fn insert(&self, new_user: NewUser) -> Result<User, StoreError> {
        let mut table = self.table.write().await;
        if table.email_taken(&new_user.email, None).is_some() {
            return Err(StoreError::Duplicate { field: "email" });
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            name: new_user.name,
            email: new_user.email,
            age: new_user.age,
            created_at: now,
            updated_at: now,
        };

        let seq = table.next_seq;
        table.next_seq += 1;
        table.rows.insert(
            user.id,
            Row {
                user: user.clone(),
                seq,
            },
        );
        Ok(user)
    }

    async fn update(&self, id: Uuid, patch: UserPatch) -> Result<Option<User>, StoreError> {
        let mut table = self.table.write().await;
        if let Some(email) = &patch.email {
            if table.rows.contains_key(&id) && table.email_taken(email, Some(id)).is_some() {
                return Err(StoreError::Duplicate { field: "email" });
            }
        }

        let Some(row) = table.rows.get_mut(&id) else {
            return Ok(None);
        };

        let user = &mut row.user;
        if let Some(name) = patch.name {
            user.name = name;
        }
        if let Some(email) = patch.email {
            user.email = email;
        }
        if let Some(age) = patch.age {
            user.age = Some(age);
        }
        user.updated_at = Utc::now();

        Ok(Some(user.clone()))
    }

    async fn delete(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let mut table = self.table.write().await;
        Ok(table.rows.remove(&id).map(|row| row.user))
    }

    async fn list(
        &self,
        filter: &UserFilter,
        skip: u64,
        limit: u64,
    ) -> Result<UserPage, StoreError> {
        let table = self.table.read().await;
        let mut matching: Vec<&Row> = table
            .rows
            .values()
            .filter(|row| filter.matches(&row.user))
            .collect();

        // 按创建时间倒序
        matching.sort_by(|a, b| {
            b.user
                .created_at
                .cmp(&a.user.created_at)
                .then(b.seq.cmp(&a.seq))
        });

        let total = matching.len() as u64;
        let users = matching
            .into_iter()
            .skip(usize::try_from(skip).unwrap_or(usize::MAX))
            .take(usize::try_from(limit).unwrap_or(usize::MAX))
            .map(|row| row.user.clone())
            .collect();

        Ok(UserPage { users, total })
    }
}
