use crate::db::PostRepository;
use crate::error::{AppError, Result};
use crate::models::{CreatePostRequest, Post, UpdatePostRequest};
use uuid::Uuid;

/// Post CRUD
#[derive(Clone)]
pub struct PostService {
    repo: PostRepository,
}

impl PostService {
    pub fn new(repo: PostRepository) -> Self {
        Self { repo }
    }

    pub async fn create(&self, req: &CreatePostRequest) -> Result<Post> {
        let (author_id, content) = req.validate().map_err(AppError::Validation)?;
        let post = self.repo.create(&author_id, &content).await?;

        tracing::info!(post_id = %post.id, author_id = %post.author_id, "Post created");
        Ok(post)
    }

    pub async fn list(&self) -> Result<Vec<Post>> {
        Ok(self.repo.list().await?)
    }

    pub async fn get(&self, id: Uuid) -> Result<Post> {
        self.repo.find(id).await?.ok_or_else(AppError::post_not_found)
    }

    pub async fn update(&self, id: Uuid, req: &UpdatePostRequest) -> Result<Post> {
        let content = req.validate().map_err(AppError::Validation)?;
        self.repo
            .update_content(id, &content)
            .await?
            .ok_or_else(AppError::post_not_found)
    }

    pub async fn delete(&self, id: Uuid) -> Result<Post> {
        let post = self
            .repo
            .delete(id)
            .await?
            .ok_or_else(AppError::post_not_found)?;

        tracing::info!(post_id = %post.id, "Post deleted");
        Ok(post)
    }
}
