use async_trait::async_trait;
use tokio::sync::RwLock;

use postboard_core::domain::{Post, PostQuery};
use postboard_core::error::RepoError;
use postboard_core::ports::{BaseRepository, PostRepository};

/// Post repository over a `Vec` guarded by an async `RwLock`.
///
/// Insertion order is kept so that posts sharing a timestamp list the same way
/// on every call.
#[derive(Default)]
pub struct InMemoryPostRepository {
    posts: RwLock<Vec<Post>>,
}

impl InMemoryPostRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BaseRepository<Post, String> for InMemoryPostRepository {
    async fn find_by_id(&self, id: String) -> Result<Option<Post>, RepoError> {
        let posts = self.posts.read().await;
        Ok(posts.iter().find(|p| p.id == id).cloned())
    }

    async fn delete(&self, id: String) -> Result<(), RepoError> {
        let mut posts = self.posts.write().await;
        let index = posts
            .iter()
            .position(|p| p.id == id)
            .ok_or(RepoError::NotFound)?;
        posts.remove(index);
        Ok(())
    }
}

#[async_trait]
impl PostRepository for InMemoryPostRepository {
    async fn find_all(&self, query: &PostQuery) -> Result<Vec<Post>, RepoError> {
        let posts = self.posts.read().await;

        let mut matching: Vec<&Post> = posts.iter().filter(|p| query.matches(p)).collect();
        // Stable sort: ordering first, slicing after
        matching.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

        Ok(matching
            .into_iter()
            .skip(usize::try_from(query.offset).unwrap_or(usize::MAX))
            .take(usize::try_from(query.limit).unwrap_or(usize::MAX))
            .cloned()
            .collect())
    }

    async fn insert(&self, post: Post) -> Result<Post, RepoError> {
        let mut posts = self.posts.write().await;
        if posts.iter().any(|p| p.id == post.id) {
            return Err(RepoError::Constraint(format!(
                "Post {} already exists",
                post.id
            )));
        }
        posts.push(post.clone());
        Ok(post)
    }

    async fn update(&self, post: Post) -> Result<Post, RepoError> {
        let mut posts = self.posts.write().await;
        let slot = posts
            .iter_mut()
            .find(|p| p.id == post.id)
            .ok_or(RepoError::NotFound)?;
        *slot = post.clone();
        Ok(post)
    }
}
