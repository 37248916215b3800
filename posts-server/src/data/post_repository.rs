use crate::data::is_unique_violation;
use crate::domain::post::PostFields;
use crate::domain::{DomainError, Post};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use std::collections::BTreeMap;
use tokio::sync::RwLock;

/// Storage for posts. Implementations must reject a duplicate title
/// atomically with the write itself, answering with a `title` validation
/// error.
#[async_trait]
pub trait PostRepository: Send + Sync {
    async fn create(&self, fields: PostFields) -> Result<Post, DomainError>;
    async fn find_by_id(&self, id: i64) -> Result<Post, DomainError>;
    async fn update(&self, id: i64, fields: PostFields) -> Result<Post, DomainError>;
    /// Removes the post and returns its last stored state.
    async fn delete(&self, id: i64) -> Result<Post, DomainError>;
    async fn list(&self) -> Result<Vec<Post>, DomainError>;
    async fn title_taken(&self, title: &str, except_id: Option<i64>) -> Result<bool, DomainError>;
}

fn title_taken_error() -> DomainError {
    DomainError::validation("title", "The title has already been taken.")
}

pub struct PostgresPostRepository {
    pool: PgPool,
}

impl PostgresPostRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn row_to_post(row: PgRow) -> Result<Post, DomainError> {
    Ok(Post {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn map_write_error(e: sqlx::Error) -> DomainError {
    if is_unique_violation(&e) {
        tracing::debug!("Rejected duplicate post title: {}", e);
        title_taken_error()
    } else {
        tracing::error!("Failed to write post: {}", e);
        DomainError::DatabaseError(e.to_string())
    }
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn create(&self, fields: PostFields) -> Result<Post, DomainError> {
        let row = sqlx::query(
            r#"
            INSERT INTO posts (title, description, created_at, updated_at)
            VALUES ($1, $2, NOW(), NOW())
            RETURNING id, title, description, created_at, updated_at
            "#,
        )
        .bind(&fields.title)
        .bind(&fields.description)
        .fetch_one(&self.pool)
        .await
        .map_err(map_write_error)?;

        row_to_post(row)
    }

    async fn find_by_id(&self, id: i64) -> Result<Post, DomainError> {
        let row = sqlx::query(
            r#"
            SELECT id, title, description, created_at, updated_at
            FROM posts
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => row_to_post(row),
            None => Err(DomainError::PostNotFound),
        }
    }

    async fn update(&self, id: i64, fields: PostFields) -> Result<Post, DomainError> {
        let row = sqlx::query(
            r#"
            UPDATE posts
            SET
                title = $1,
                description = $2,
                updated_at = NOW()
            WHERE id = $3
            RETURNING id, title, description, created_at, updated_at
            "#,
        )
        .bind(&fields.title)
        .bind(&fields.description)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_write_error)?;

        match row {
            Some(row) => row_to_post(row),
            None => Err(DomainError::PostNotFound),
        }
    }

    async fn delete(&self, id: i64) -> Result<Post, DomainError> {
        let row = sqlx::query(
            r#"
            DELETE FROM posts
            WHERE id = $1
            RETURNING id, title, description, created_at, updated_at
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => row_to_post(row),
            None => Err(DomainError::PostNotFound),
        }
    }

    async fn list(&self) -> Result<Vec<Post>, DomainError> {
        let rows = sqlx::query(
            r#"
            SELECT id, title, description, created_at, updated_at
            FROM posts
            ORDER BY id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(row_to_post).collect()
    }

    async fn title_taken(&self, title: &str, except_id: Option<i64>) -> Result<bool, DomainError> {
        let row = sqlx::query(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM posts
                WHERE title = $1 AND ($2::BIGINT IS NULL OR id <> $2)
            ) AS taken
            "#,
        )
        .bind(title)
        .bind(except_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.try_get("taken")?)
    }
}

#[derive(Default)]
struct PostTable {
    last_id: i64,
    posts: BTreeMap<i64, Post>,
}

impl PostTable {
    fn title_taken(&self, title: &str, except_id: Option<i64>) -> bool {
        self.posts
            .values()
            .any(|p| p.title == title && Some(p.id) != except_id)
    }
}

/// Process-local store used when no database is configured. Every write holds
/// the table's write lock across the uniqueness check and the mutation.
#[derive(Default)]
pub struct InMemoryPostRepository {
    table: RwLock<PostTable>,
}

impl InMemoryPostRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PostRepository for InMemoryPostRepository {
    async fn create(&self, fields: PostFields) -> Result<Post, DomainError> {
        let mut table = self.table.write().await;
        if table.title_taken(&fields.title, None) {
            return Err(title_taken_error());
        }

        table.last_id += 1;
        let now = Utc::now();
        let post = Post {
            id: table.last_id,
            title: fields.title,
            description: fields.description,
            created_at: now,
            updated_at: now,
        };
        table.posts.insert(post.id, post.clone());
        Ok(post)
    }

    async fn find_by_id(&self, id: i64) -> Result<Post, DomainError> {
        self.table
            .read()
            .await
            .posts
            .get(&id)
            .cloned()
            .ok_or(DomainError::PostNotFound)
    }

    async fn update(&self, id: i64, fields: PostFields) -> Result<Post, DomainError> {
        let mut table = self.table.write().await;
        if !table.posts.contains_key(&id) {
            return Err(DomainError::PostNotFound);
        }
        if table.title_taken(&fields.title, Some(id)) {
            return Err(title_taken_error());
        }

        let post = table
            .posts
            .get_mut(&id)
            .ok_or(DomainError::PostNotFound)?;
        post.title = fields.title;
        post.description = fields.description;
        post.updated_at = Utc::now();
        Ok(post.clone())
    }

    async fn delete(&self, id: i64) -> Result<Post, DomainError> {
        self.table
            .write()
            .await
            .posts
            .remove(&id)
            .ok_or(DomainError::PostNotFound)
    }

    async fn list(&self) -> Result<Vec<Post>, DomainError> {
        Ok(self.table.read().await.posts.values().cloned().collect())
    }

    async fn title_taken(&self, title: &str, except_id: Option<i64>) -> Result<bool, DomainError> {
        Ok(self.table.read().await.title_taken(title, except_id))
    }
}
