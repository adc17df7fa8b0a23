use async_trait::async_trait;
use tokio::sync::RwLock;

use postboard_core::domain::{NewUser, User, UserId};
use postboard_core::error::RepoError;
use postboard_core::ports::{BaseRepository, UserRepository};

#[derive(Default)]
struct Users {
    rows: Vec<User>,
    next_id: UserId,
}

/// User repository with serial ids, mirroring the `users` table.
#[derive(Default)]
pub struct InMemoryUserRepository {
    users: RwLock<Users>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BaseRepository<User, UserId> for InMemoryUserRepository {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepoError> {
        let users = self.users.read().await;
        Ok(users.rows.iter().find(|u| u.id == id).cloned())
    }

    async fn delete(&self, id: UserId) -> Result<(), RepoError> {
        let mut users = self.users.write().await;
        let before = users.rows.len();
        users.rows.retain(|u| u.id != id);
        if users.rows.len() == before {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        let users = self.users.read().await;
        Ok(users.rows.iter().find(|u| u.username == username).cloned())
    }

    async fn create(&self, user: NewUser) -> Result<User, RepoError> {
        let mut users = self.users.write().await;
        if users.rows.iter().any(|u| u.username == user.username) {
            return Err(RepoError::Constraint("Username already taken".to_string()));
        }

        users.next_id += 1;
        let created = User {
            id: users.next_id,
            username: user.username,
            password_hash: user.password_hash,
            created_at: user.created_at,
        };
        users.rows.push(created.clone());
        Ok(created)
    }
}
