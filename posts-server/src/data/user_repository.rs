use crate::data::is_unique_violation;
use crate::domain::user::NewUser;
use crate::domain::{DomainError, User};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use std::collections::BTreeMap;
use tokio::sync::RwLock;

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Stores a new user. A duplicate email is rejected atomically with an
    /// `email` validation error.
    async fn create(&self, user: NewUser, password_hash: String) -> Result<User, DomainError>;
    async fn find_by_email(&self, email: &str) -> Result<User, DomainError>;
    async fn find_by_id(&self, id: i64) -> Result<User, DomainError>;
}

fn email_taken_error() -> DomainError {
    DomainError::validation("email", "The email has already been taken.")
}

pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn row_to_user(row: PgRow) -> Result<User, DomainError> {
    Ok(User {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        password_hash: row.try_get("password_hash")?,
        created_at: row.try_get("created_at")?,
    })
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn create(&self, user: NewUser, password_hash: String) -> Result<User, DomainError> {
        let row = sqlx::query(
            r#"
            INSERT INTO users (name, email, password_hash, created_at)
            VALUES ($1, $2, $3, NOW())
            RETURNING id, name, email, password_hash, created_at
            "#,
        )
        .bind(&user.name)
        .bind(&user.email)
        .bind(&password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                tracing::debug!("Rejected duplicate email: {}", e);
                email_taken_error()
            } else {
                tracing::error!("Failed to create user: {}", e);
                DomainError::DatabaseError(e.to_string())
            }
        })?;

        row_to_user(row)
    }

    async fn find_by_email(&self, email: &str) -> Result<User, DomainError> {
        let row = sqlx::query(
            r#"
            SELECT id, name, email, password_hash, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => row_to_user(row),
            None => Err(DomainError::UserNotFound),
        }
    }

    async fn find_by_id(&self, id: i64) -> Result<User, DomainError> {
        let row = sqlx::query(
            r#"
            SELECT id, name, email, password_hash, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => row_to_user(row),
            None => Err(DomainError::UserNotFound),
        }
    }
}

#[derive(Default)]
struct UserTable {
    last_id: i64,
    users: BTreeMap<i64, User>,
}

#[derive(Default)]
pub struct InMemoryUserRepository {
    table: RwLock<UserTable>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, user: NewUser, password_hash: String) -> Result<User, DomainError> {
        let mut table = self.table.write().await;
        if table.users.values().any(|u| u.email == user.email) {
            return Err(email_taken_error());
        }

        table.last_id += 1;
        let user = User {
            id: table.last_id,
            name: user.name,
            email: user.email,
            password_hash,
            created_at: Utc::now(),
        };
        table.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<User, DomainError> {
        self.table
            .read()
            .await
            .users
            .values()
            .find(|u| u.email == email)
            .cloned()
            .ok_or(DomainError::UserNotFound)
    }

    async fn find_by_id(&self, id: i64) -> Result<User, DomainError> {
        self.table
            .read()
            .await
            .users
            .get(&id)
            .cloned()
            .ok_or(DomainError::UserNotFound)
    }
}
