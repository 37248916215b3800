use crate::domain::DomainError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Revoked token ids. An entry only has to outlive the token it names, so
/// implementations may drop entries whose `expires_at` has passed.
#[async_trait]
pub trait TokenDenylist: Send + Sync {
    async fn revoke(&self, jti: &str, expires_at: DateTime<Utc>) -> Result<(), DomainError>;
    async fn is_revoked(&self, jti: &str) -> Result<bool, DomainError>;
}

pub struct PostgresTokenDenylist {
    pool: PgPool,
}

impl PostgresTokenDenylist {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TokenDenylist for PostgresTokenDenylist {
    async fn revoke(&self, jti: &str, expires_at: DateTime<Utc>) -> Result<(), DomainError> {
        sqlx::query("DELETE FROM revoked_tokens WHERE expires_at < NOW()")
            .execute(&self.pool)
            .await?;

        sqlx::query(
            r#"
            INSERT INTO revoked_tokens (jti, expires_at)
            VALUES ($1, $2)
            ON CONFLICT (jti) DO NOTHING
            "#,
        )
        .bind(jti)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn is_revoked(&self, jti: &str) -> Result<bool, DomainError> {
        let row = sqlx::query(
            "SELECT EXISTS (SELECT 1 FROM revoked_tokens WHERE jti = $1) AS revoked",
        )
        .bind(jti)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.try_get("revoked")?)
    }
}

#[derive(Default)]
pub struct InMemoryTokenDenylist {
    entries: RwLock<HashMap<String, DateTime<Utc>>>,
}

impl InMemoryTokenDenylist {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}

#[async_trait]
impl TokenDenylist for InMemoryTokenDenylist {
    async fn revoke(&self, jti: &str, expires_at: DateTime<Utc>) -> Result<(), DomainError> {
        let now = Utc::now();
        let mut entries = self.entries.write().await;
        entries.retain(|_, exp| *exp >= now);
        entries.insert(jti.to_string(), expires_at);
        Ok(())
    }

    async fn is_revoked(&self, jti: &str) -> Result<bool, DomainError> {
        Ok(self.entries.read().await.contains_key(jti))
    }
}
