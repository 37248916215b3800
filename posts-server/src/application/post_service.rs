use crate::data::post_repository::PostRepository;
use crate::domain::post::{PostFields, PostInput, PostResource};
use crate::domain::{DomainError, Post};
use std::sync::Arc;

pub struct PostService {
    post_repo: Arc<dyn PostRepository + Send + Sync>,
}

impl PostService {
    pub fn new(post_repo: Arc<dyn PostRepository + Send + Sync>) -> Self {
        Self { post_repo }
    }

    /// Validation gate shared by create and update: presence and length of
    /// both fields, then title uniqueness among the other posts.
    async fn validate(
        &self,
        input: &PostInput,
        except_id: Option<i64>,
    ) -> Result<PostFields, DomainError> {
        let shape = input.validate();
        let mut errors = shape.as_ref().err().cloned().unwrap_or_default();

        let title = input.title.as_deref().map(str::trim).unwrap_or_default();
        if !title.is_empty()
            && !errors.has("title")
            && self.post_repo.title_taken(title, except_id).await?
        {
            errors.taken("title");
        }

        match shape {
            Ok(fields) if errors.is_empty() => Ok(fields),
            _ => Err(DomainError::Validation(errors)),
        }
    }

    pub async fn list_posts(&self) -> Result<Vec<PostResource>, DomainError> {
        let posts = self.post_repo.list().await?;
        Ok(posts.into_iter().map(PostResource::from).collect())
    }

    pub async fn get_post(&self, id: i64) -> Result<PostResource, DomainError> {
        let post = self.post_repo.find_by_id(id).await?;
        Ok(PostResource::from(post))
    }

    pub async fn create_post(&self, input: PostInput) -> Result<PostResource, DomainError> {
        let fields = self.validate(&input, None).await?;
        let post = self.post_repo.create(fields).await?;

        tracing::info!("Post created: id={}", post.id);

        Ok(PostResource::from(post))
    }

    /// Replaces both fields and returns the full stored record.
    pub async fn update_post(&self, id: i64, input: PostInput) -> Result<Post, DomainError> {
        let fields = self.validate(&input, Some(id)).await?;
        let post = self.post_repo.update(id, fields).await?;

        tracing::info!("Post updated: id={}", id);

        Ok(post)
    }

    /// Returns the record as it was just before removal.
    pub async fn delete_post(&self, id: i64) -> Result<Post, DomainError> {
        let post = self.post_repo.delete(id).await?;

        tracing::info!("Post deleted: id={}", id);

        Ok(post)
    }
}
