//! 用户业务服务
//!
//! 组合校验、唯一性检查、持久化和分页，是其他层调用的唯一入口。
//! 每个操作最多发起一次写操作，错误原样返回给调用方。

use tracing::info;
use uuid::Uuid;

use super::model::{CreateUserRequest, UpdateUserRequest, User, UserFilter};
use super::repository::UserRepository;
use super::store::SharedUserStore;
use super::{uniqueness, validation};
use crate::config::PaginationConfig;
use crate::common::error::AppError;
use crate::common::pagination::{PageRequest, Pagination};

/// 一页用户及分页信息
#[derive(Debug)]
pub struct UserListing {
    pub users: Vec<User>,
    pub pagination: Pagination,
}

#[derive(Clone)]
pub struct UserService {
    repo: UserRepository,
    pagination: PaginationConfig,
}

impl UserService {
    pub fn new(store: SharedUserStore, pagination: PaginationConfig) -> Self {
        Self {
            repo: UserRepository::new(store),
            pagination,
        }
    }

    pub fn pagination_config(&self) -> &PaginationConfig {
        &self.pagination
    }

    pub async fn create_user(&self, raw: CreateUserRequest) -> Result<User, AppError> {
        let new_user = validation::validate_create(raw)?;
        uniqueness::ensure_email_free(&self.repo, &new_user.email).await?;

        let user = self.repo.create(new_user).await?;
        info!(id = %user.id, "created user");
        Ok(user)
    }

    pub async fn list_users(
        &self,
        page: PageRequest,
        filter: UserFilter,
    ) -> Result<UserListing, AppError> {
        // 空白的名称过滤视为未指定
        let filter = UserFilter {
            name: filter.name.filter(|n| !n.trim().is_empty()),
        };

        let result = self.repo.list(&filter, page.skip(), page.limit).await?;
        let pagination = Pagination::compute(page, result.users.len(), result.total);

        Ok(UserListing {
            users: result.users,
            pagination,
        })
    }

    pub async fn get_user_by_id(&self, id: Uuid) -> Result<User, AppError> {
        self.repo.fetch_by_id(id).await
    }

    pub async fn update_user(&self, id: Uuid, raw: UpdateUserRequest) -> Result<User, AppError> {
        let patch = validation::validate_update(raw)?;
        if let Some(email) = &patch.email {
            uniqueness::ensure_email_free_for(&self.repo, email, id).await?;
        }

        let user = self.repo.update_by_id(id, patch).await?;
        info!(id = %user.id, "updated user");
        Ok(user)
    }

    pub async fn delete_user(&self, id: Uuid) -> Result<User, AppError> {
        let user = self.repo.delete_by_id(id).await?;
        info!(id = %user.id, "deleted user");
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::users::model::{NewUser, UserPatch};
    use crate::app::users::store::{StoreError, UserPage, UserStore};
    use crate::infrastructure::memory::MemoryUserStore;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// 统计邮箱查询次数的存储包装
    struct CountingStore {
        inner: MemoryUserStore,
        email_lookups: AtomicUsize,
    }

    #[async_trait]
    impl UserStore for CountingStore {
        async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
            self.inner.find_by_id(id).await
        }

        async fn find_by_email(
            &self,
            email: &str,
            exclude: Option<Uuid>,
        ) -> Result<Option<User>, StoreError> {
            self.email_lookups.fetch_add(1, Ordering::SeqCst);
            self.inner.find_by_email(email, exclude).await
        }

        async fn insert(&self, user: NewUser) -> Result<User, StoreError> {
            self.inner.insert(user).await
        }

        async fn update(&self, id: Uuid, patch: UserPatch) -> Result<Option<User>, StoreError> {
            self.inner.update(id, patch).await
        }

        async fn delete(&self, id: Uuid) -> Result<Option<User>, StoreError> {
            self.inner.delete(id).await
        }

        async fn list(
            &self,
            filter: &UserFilter,
            skip: u64,
            limit: u64,
        ) -> Result<UserPage, StoreError> {
            self.inner.list(filter, skip, limit).await
        }
    }

    fn service() -> UserService {
        UserService::new(Arc::new(MemoryUserStore::new()), PaginationConfig::default())
    }

    fn create_request(name: &str, email: &str) -> CreateUserRequest {
        CreateUserRequest {
            name: Some(name.to_string()),
            email: Some(email.to_string()),
            age: None,
        }
    }

    #[tokio::test]
    async fn create_returns_trimmed_email_and_id() {
        let service = service();
        let user = service
            .create_user(create_request("Ann", "  a@x.com  "))
            .await
            .unwrap();
        assert_eq!(user.email, "a@x.com");
        assert!(!user.id.is_nil());
    }

    #[tokio::test]
    async fn duplicate_email_yields_one_conflict() {
        let service = service();
        let first = service.create_user(create_request("Ann", "a@x.com")).await;
        let second = service.create_user(create_request("Bob", "a@x.com")).await;

        assert!(first.is_ok());
        let err = second.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(err.to_string(), "User with this email already exists");
    }

    #[tokio::test]
    async fn concurrent_duplicate_creates_leave_one_record() {
        let service = service();
        let (a, b) = tokio::join!(
            service.create_user(create_request("Ann", "a@x.com")),
            service.create_user(create_request("Bob", "a@x.com")),
        );
        assert_eq!([a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count(), 1);

        let listing = service
            .list_users(PageRequest { page: 1, limit: 10 }, UserFilter::default())
            .await
            .unwrap();
        assert_eq!(listing.pagination.total, 1);
    }

    #[tokio::test]
    async fn update_without_email_skips_uniqueness_check() {
        let store = Arc::new(CountingStore {
            inner: MemoryUserStore::new(),
            email_lookups: AtomicUsize::new(0),
        });
        let service = UserService::new(store.clone(), PaginationConfig::default());

        let user = service
            .create_user(create_request("Ann", "a@x.com"))
            .await
            .unwrap();
        let lookups_after_create = store.email_lookups.load(Ordering::SeqCst);

        service
            .update_user(
                user.id,
                UpdateUserRequest {
                    name: Some("Annie".to_string()),
                    age: Some(31.0),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(store.email_lookups.load(Ordering::SeqCst), lookups_after_create);

        service
            .update_user(
                user.id,
                UpdateUserRequest {
                    email: Some("new@x.com".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(
            store.email_lookups.load(Ordering::SeqCst),
            lookups_after_create + 1
        );
    }

    #[tokio::test]
    async fn age_only_update_keeps_other_fields() {
        let service = service();
        let user = service
            .create_user(create_request("Ann", "a@x.com"))
            .await
            .unwrap();

        let updated = service
            .update_user(
                user.id,
                UpdateUserRequest {
                    age: Some(31.0),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.id, user.id);
        assert_eq!(updated.name, "Ann");
        assert_eq!(updated.email, "a@x.com");
        assert_eq!(updated.age, Some(31.0));
        assert_eq!(updated.created_at, user.created_at);
        assert!(updated.updated_at >= user.updated_at);
    }

    #[tokio::test]
    async fn update_to_own_email_is_allowed_but_others_conflict() {
        let service = service();
        let ann = service
            .create_user(create_request("Ann", "a@x.com"))
            .await
            .unwrap();
        service
            .create_user(create_request("Bob", "b@x.com"))
            .await
            .unwrap();

        let same = service
            .update_user(
                ann.id,
                UpdateUserRequest {
                    email: Some("a@x.com".to_string()),
                    ..Default::default()
                },
            )
            .await;
        assert!(same.is_ok());

        let err = service
            .update_user(
                ann.id,
                UpdateUserRequest {
                    email: Some("b@x.com".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Email already in use by another user");
    }

    #[tokio::test]
    async fn update_missing_user_is_not_found() {
        let service = service();
        let err = service
            .update_user(
                Uuid::new_v4(),
                UpdateUserRequest {
                    age: Some(3.0),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn get_after_delete_is_not_found() {
        let service = service();
        let user = service
            .create_user(create_request("Ann", "a@x.com"))
            .await
            .unwrap();

        let deleted = service.delete_user(user.id).await.unwrap();
        assert_eq!(deleted.id, user.id);

        let err = service.get_user_by_id(user.id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn create_then_fetch_round_trip() {
        let service = service();
        let created = service
            .create_user(CreateUserRequest {
                age: Some(40.0),
                ..create_request("Ann", "a@x.com")
            })
            .await
            .unwrap();

        let fetched = service.get_user_by_id(created.id).await.unwrap();
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn second_page_of_twelve_records() {
        let service = service();
        for i in 1..=12 {
            service
                .create_user(create_request(&format!("User {i}"), &format!("u{i}@x.com")))
                .await
                .unwrap();
        }

        let listing = service
            .list_users(PageRequest { page: 2, limit: 5 }, UserFilter::default())
            .await
            .unwrap();

        // 倒序：第 6-10 条对应 User 7 到 User 3
        let names: Vec<_> = listing.users.iter().map(|u| u.name.as_str()).collect();
        assert_eq!(names, ["User 7", "User 6", "User 5", "User 4", "User 3"]);
        assert_eq!(listing.pagination.current_page, 2);
        assert_eq!(listing.pagination.total_pages, 3);
        assert_eq!(listing.pagination.total, 12);
        assert!(listing.pagination.has_more);
    }

    #[tokio::test]
    async fn name_filter_is_case_insensitive_substring() {
        let service = service();
        for (name, email) in [("Alice", "a@x.com"), ("alicia", "b@x.com"), ("Bob", "c@x.com")] {
            service
                .create_user(create_request(name, email))
                .await
                .unwrap();
        }

        let listing = service
            .list_users(
                PageRequest { page: 1, limit: 10 },
                UserFilter {
                    name: Some("ALI".to_string()),
                },
            )
            .await
            .unwrap();
        assert_eq!(listing.pagination.total, 2);

        let blank = service
            .list_users(
                PageRequest { page: 1, limit: 10 },
                UserFilter {
                    name: Some("  ".to_string()),
                },
            )
            .await
            .unwrap();
        assert_eq!(blank.pagination.total, 3);
    }
}
