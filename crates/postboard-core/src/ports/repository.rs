use async_trait::async_trait;

use crate::domain::{NewUser, Post, PostQuery, User, UserId};
use crate::error::RepoError;

/// Generic repository trait shared by every entity.
#[async_trait]
pub trait BaseRepository<T, ID>: Send + Sync {
    /// Find an entity by its unique ID.
    async fn find_by_id(&self, id: ID) -> Result<Option<T>, RepoError>;

    /// Delete an entity by its ID. Fails with `RepoError::NotFound` when no row matched.
    async fn delete(&self, id: ID) -> Result<(), RepoError>;
}

/// User repository with domain-specific methods.
#[async_trait]
pub trait UserRepository: BaseRepository<User, UserId> {
    /// Find a user by their unique username.
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError>;

    /// Persist a new user, returning it with its store-assigned id.
    async fn create(&self, user: NewUser) -> Result<User, RepoError>;
}

/// Post repository.
#[async_trait]
pub trait PostRepository: BaseRepository<Post, String> {
    /// Filtered listing, ordered by timestamp descending, then sliced by
    /// `query.offset` / `query.limit`.
    async fn find_all(&self, query: &PostQuery) -> Result<Vec<Post>, RepoError>;

    /// Insert a freshly built post.
    async fn insert(&self, post: Post) -> Result<Post, RepoError>;

    /// Overwrite an existing post. Fails with `RepoError::NotFound` when it is gone.
    async fn update(&self, post: Post) -> Result<Post, RepoError>;
}
