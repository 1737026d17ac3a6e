use async_trait::async_trait;
use sqlx::PgPool;

use crate::auth::repo_types::{NewUser, PublicUser};
use crate::error::AppError;

const PUBLIC_COLUMNS: &str = "id, email, full_name, phone, is_admin";

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn email_exists(&self, email: &str) -> Result<bool, AppError>;
    /// Fails with `Conflict` when the email is already taken.
    async fn create(&self, user: NewUser) -> Result<PublicUser, AppError>;
    async fn find_by_credentials(
        &self,
        email: &str,
        password_hash: &str,
    ) -> Result<Option<PublicUser>, AppError>;
}

#[derive(Clone)]
pub struct PgUserRepository {
    db: PgPool,
}

impl PgUserRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn email_exists(&self, email: &str) -> Result<bool, AppError> {
        let row: Option<(i32,)> = sqlx::query_as("SELECT id FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.db)
            .await?;
        Ok(row.is_some())
    }

    async fn create(&self, user: NewUser) -> Result<PublicUser, AppError> {
        let sql = format!(
            r#"
            INSERT INTO users (email, password_hash, full_name, phone)
            VALUES ($1, $2, $3, $4)
            RETURNING {PUBLIC_COLUMNS}
            "#
        );
        sqlx::query_as::<_, PublicUser>(&sql)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(&user.full_name)
            .bind(&user.phone)
            .fetch_one(&self.db)
            .await
            .map_err(|e| match &e {
                sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                    AppError::Conflict("User already exists")
                }
                _ => AppError::Database(e),
            })
    }

    async fn find_by_credentials(
        &self,
        email: &str,
        password_hash: &str,
    ) -> Result<Option<PublicUser>, AppError> {
        let sql = format!(
            r#"
            SELECT {PUBLIC_COLUMNS}
            FROM users
            WHERE email = $1 AND password_hash = $2
            "#
        );
        let user = sqlx::query_as::<_, PublicUser>(&sql)
            .bind(email)
            .bind(password_hash)
            .fetch_optional(&self.db)
            .await?;
        Ok(user)
    }
}
