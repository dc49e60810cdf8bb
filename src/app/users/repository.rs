//! 持久化适配层：负责不存在和重复键的语义转换

use tracing::{debug, warn};
use uuid::Uuid;

use super::model::{NewUser, User, UserFilter, UserPatch};
use super::store::{SharedUserStore, StoreError, UserPage};
use crate::common::error::AppError;

pub const DUPLICATE_EMAIL_MESSAGE: &str = "User with this email already exists";

fn not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("User with ID {} not found", id))
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate { field } => {
                warn!(field, "unique index rejected write");
                AppError::Conflict(DUPLICATE_EMAIL_MESSAGE.to_string())
            }
            StoreError::Backend(msg) => AppError::Internal(msg),
        }
    }
}

#[derive(Clone)]
pub struct UserRepository {
    store: SharedUserStore,
}

impl UserRepository {
    pub fn new(store: SharedUserStore) -> Self {
        Self { store }
    }

    pub async fn fetch_by_id(&self, id: Uuid) -> Result<User, AppError> {
        self.store.find_by_id(id).await?.ok_or_else(|| not_found(id))
    }

    pub async fn find_by_email(
        &self,
        email: &str,
        exclude: Option<Uuid>,
    ) -> Result<Option<User>, AppError> {
        Ok(self.store.find_by_email(email, exclude).await?)
    }

    pub async fn create(&self, user: NewUser) -> Result<User, AppError> {
        let user = self.store.insert(user).await?;
        debug!(id = %user.id, "user inserted");
        Ok(user)
    }

    pub async fn update_by_id(&self, id: Uuid, patch: UserPatch) -> Result<User, AppError> {
        self.store.update(id, patch).await?.ok_or_else(|| not_found(id))
    }

    pub async fn delete_by_id(&self, id: Uuid) -> Result<User, AppError> {
        self.store.delete(id).await?.ok_or_else(|| not_found(id))
    }

    pub async fn list(
        &self,
        filter: &UserFilter,
        skip: u64,
        limit: u64,
    ) -> Result<UserPage, AppError> {
        Ok(self.store.list(filter, skip, limit).await?)
    }
}
