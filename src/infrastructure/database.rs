//! 数据库基础设施（PostgreSQL）

use async_trait::async_trait;
use sqlx::{
    postgres::{PgPool, PgPoolOptions},
    Error,
};
use std::time::Duration;
use tracing::info;
use uuid::Uuid;

use crate::app::users::model::{NewUser, User, UserFilter, UserPatch};
use crate::app::users::store::{StoreError, UserPage, UserStore};
use crate::config::DatabaseConfig;

pub struct DatabaseManager {
    pool: PgPool,
}

impl DatabaseManager {
    pub async fn new(config: &DatabaseConfig) -> Result<Self, Error> {
        info!("Connecting to database: {}", redact_url(&config.url));

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
            .connect(&config.url)
            .await?;

        Ok(Self { pool })
    }

    /// 创建用户表和邮箱唯一索引（幂等）
    pub async fn ensure_schema(&self) -> Result<(), Error> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id UUID PRIMARY KEY,
                name TEXT NOT NULL,
                email TEXT NOT NULL,
                age DOUBLE PRECISION,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE UNIQUE INDEX IF NOT EXISTS users_email_key ON users (email)")
            .execute(&self.pool)
            .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS users_created_at_idx ON users (created_at DESC)")
            .execute(&self.pool)
            .await?;

        info!("Database schema ready");
        Ok(())
    }

    pub fn into_store(self) -> PgUserStore {
        PgUserStore { pool: self.pool }
    }
}

/// 日志中隐藏连接串里的密码
fn redact_url(url: &str) -> String {
    match (url.find("://"), url.rfind('@')) {
        (Some(scheme_end), Some(at)) if at > scheme_end => {
            let credentials = &url[scheme_end + 3..at];
            match credentials.find(':') {
                Some(colon) => format!(
                    "{}{}:***{}",
                    &url[..scheme_end + 3],
                    &credentials[..colon],
                    &url[at..]
                ),
                None => url.to_string(),
            }
        }
        _ => url.to_string(),
    }
}

/// 转义 LIKE 模式中的通配符
fn like_pattern(needle: &str) -> String {
    let escaped = needle
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

fn map_err(err: Error) -> StoreError {
    if let Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return StoreError::Duplicate { field: "email" };
        }
    }
    StoreError::Backend(err.to_string())
}

pub struct PgUserStore {
    pool: PgPool,
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_err)
    }

    async fn find_by_email(
        &self,
        email: &str,
        exclude: Option<Uuid>,
    ) -> Result<Option<User>, StoreError> {
        sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE email = $1 AND ($2::uuid IS NULL OR id <> $2) LIMIT 1",
        )
        .bind(email)
        .bind(exclude)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_err)
    }

    async fn insert(&self, user: NewUser) -> Result<User, StoreError> {
        sqlx::query_as::<_, User>(
            "INSERT INTO users (id, name, email, age) VALUES ($1, $2, $3, $4) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(&user.name)
        .bind(&user.email)
        .bind(user.age)
        .fetch_one(&self.pool)
        .await
        .map_err(map_err)
    }

    async fn update(&self, id: Uuid, patch: UserPatch) -> Result<Option<User>, StoreError> {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users SET
                name = COALESCE($2, name),
                email = COALESCE($3, email),
                age = COALESCE($4, age),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(patch.name)
        .bind(patch.email)
        .bind(patch.age)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_err)
    }

    async fn delete(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        sqlx::query_as::<_, User>("DELETE FROM users WHERE id = $1 RETURNING *")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_err)
    }

    async fn list(
        &self,
        filter: &UserFilter,
        skip: u64,
        limit: u64,
    ) -> Result<UserPage, StoreError> {
        let pattern = filter.name.as_deref().map(like_pattern);
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let offset = i64::try_from(skip).unwrap_or(i64::MAX);

        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT * FROM users
            WHERE ($1::text IS NULL OR name ILIKE $1)
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(&pattern)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(map_err)?;

        let total: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM users WHERE ($1::text IS NULL OR name ILIKE $1)")
                .bind(&pattern)
                .fetch_one(&self.pool)
                .await
                .map_err(map_err)?;

        Ok(UserPage {
            users,
            total: u64::try_from(total.0).unwrap_or(0),
        })
    }
}
