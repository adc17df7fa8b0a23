use std::sync::Arc;

use crate::domain::{NewPost, Post, PostPatch, PostQuery, UserId};
use crate::error::{DomainError, RepoError};
use crate::ports::PostRepository;

/// Post use cases on top of a [`PostRepository`].
///
/// Lookups return `Ok(None)` for a missing post; turning that into a 404 is
/// the caller's job.
#[derive(Clone)]
pub struct PostService {
    repo: Arc<dyn PostRepository>,
}

impl PostService {
    pub fn new(repo: Arc<dyn PostRepository>) -> Self {
        Self { repo }
    }

    /// Newest-first listing, optionally filtered by content search and author.
    pub async fn find_all(
        &self,
        limit: u64,
        offset: u64,
        search: Option<String>,
        author_id: Option<UserId>,
    ) -> Result<Vec<Post>, RepoError> {
        let query = PostQuery::new(limit, offset)
            .with_search(search)
            .with_author(author_id);

        self.repo.find_all(&query).await
    }

    pub async fn find_one(&self, id: &str) -> Result<Option<Post>, RepoError> {
        self.repo.find_by_id(id.to_string()).await
    }

    /// Create a post owned by `author_id`.
    pub async fn create(&self, new_post: NewPost, author_id: UserId) -> Result<Post, RepoError> {
        let post = Post::new(new_post, author_id);
        tracing::debug!(post_id = %post.id, author_id, "Creating post");

        self.repo.insert(post).await
    }

    /// Load, merge `patch`, persist. `None` when the post does not exist.
    pub async fn update(&self, id: &str, patch: PostPatch) -> Result<Option<Post>, RepoError> {
        let Some(mut post) = self.find_one(id).await? else {
            return Ok(None);
        };

        post.apply(patch);
        self.repo.update(post).await.map(Some)
    }

    /// Delete and return the last known state. `None` when the post does not exist.
    pub async fn remove(&self, id: &str) -> Result<Option<Post>, RepoError> {
        let Some(post) = self.find_one(id).await? else {
            return Ok(None);
        };

        match self.repo.delete(post.id.clone()).await {
            Ok(()) => Ok(Some(post)),
            // Deleted concurrently between the load and the delete.
            Err(RepoError::NotFound) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Ownership check: the post must exist and be authored by `principal`.
    pub async fn find_owned(&self, id: &str, principal: UserId) -> Result<Post, DomainError> {
        let post = self
            .find_one(id)
            .await?
            .ok_or_else(|| DomainError::NotFound {
                entity_type: "Post",
                id: id.to_string(),
            })?;

        if !post.is_owned_by(principal) {
            tracing::warn!(post_id = %id, principal, "Ownership check failed");
            return Err(DomainError::Forbidden {
                entity_type: "Post",
            });
        }

        Ok(post)
    }
}
