//! PostgreSQL implementation of UserRepository

use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgRow};
use tracing::{info, instrument};

use super::{RepoResult, RepositoryError, UserRepository, map_db_error};
use crate::credentials::PasswordHash;
use crate::models::{NewUser, Role, User, UserId};

const USER_COLUMNS: &str = "id, first_name, last_name, dob, phone_no, email, password_hash, role";

/// User repository
#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    /// Create a new user repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn find_one(&self, column: &str, value: &str) -> RepoResult<Option<User>> {
        let row = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE {column} = $1"
        ))
        .bind(value)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        row.as_ref().map(user_from_row).transpose()
    }
}

fn user_from_row(row: &PgRow) -> RepoResult<User> {
    let role: String = row.try_get("role")?;
    let role = role
        .parse::<Role>()
        .map_err(|e| RepositoryError::Corrupt(e.to_string()))?;

    Ok(User {
        id: UserId(row.try_get("id")?),
        first_name: row.try_get("first_name")?,
        last_name: row.try_get("last_name")?,
        dob: row.try_get("dob")?,
        phone_no: row.try_get("phone_no")?,
        email: row.try_get("email")?,
        password_hash: PasswordHash::from_stored(row.try_get::<String, _>("password_hash")?),
        role,
    })
}

#[async_trait]
impl UserRepository for PgUserRepository {
    #[instrument(skip(self, user), fields(email = %user.email))]
    async fn insert(&self, user: NewUser) -> RepoResult<User> {
        info!("Creating new user: {}", user.email);

        let row = sqlx::query(&format!(
            r#"
            INSERT INTO users (first_name, last_name, dob, phone_no, email, password_hash, role)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(user.dob)
        .bind(&user.phone_no)
        .bind(&user.email)
        .bind(user.password_hash.as_str())
        .bind(user.role.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)?;

        user_from_row(&row)
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, id: UserId) -> RepoResult<Option<User>> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_error)?;

        row.as_ref().map(user_from_row).transpose()
    }

    #[instrument(skip(self))]
    async fn find_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        self.find_one("email", email).await
    }

    #[instrument(skip(self))]
    async fn find_by_phone(&self, phone_no: &str) -> RepoResult<Option<User>> {
        self.find_one("phone_no", phone_no).await
    }

    async fn list(&self) -> RepoResult<Vec<User>> {
        let rows = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY id"))
            .fetch_all(&self.pool)
            .await
            .map_err(map_db_error)?;

        rows.iter().map(user_from_row).collect()
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: UserId) -> RepoResult<bool> {
        // items.assigned_to_id is ON DELETE SET NULL
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id.0)
            .execute(&self.pool)
            .await
            .map_err(map_db_error)?;

        Ok(result.rows_affected() > 0)
    }
}
