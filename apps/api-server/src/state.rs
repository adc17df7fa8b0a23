//! Application state - shared across all handlers.

use std::io;
use std::sync::Arc;

use postboard_core::PostService;
use postboard_core::ports::{PasswordService, PostRepository, TokenService, UserRepository};
use postboard_infra::{
    Argon2PasswordService, InMemoryPostRepository, InMemoryUserRepository, JwtTokenService,
};

#[cfg(feature = "postgres")]
use postboard_infra::{PostgresPostRepository, PostgresUserRepository};

use crate::config::AppConfig;

/// Which persistence backend the state was wired with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Storage {
    Postgres,
    Memory,
}

impl Storage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Storage::Postgres => "postgres",
            Storage::Memory => "memory",
        }
    }
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub posts: PostService,
    pub users: Arc<dyn UserRepository>,
    pub tokens: Arc<dyn TokenService>,
    pub passwords: Arc<dyn PasswordService>,
    pub storage: Storage,
}

impl AppState {
    /// Assemble the state from already-built collaborators.
    pub fn from_parts(
        post_repo: Arc<dyn PostRepository>,
        users: Arc<dyn UserRepository>,
        tokens: Arc<dyn TokenService>,
        passwords: Arc<dyn PasswordService>,
        storage: Storage,
    ) -> Self {
        Self {
            posts: PostService::new(post_repo),
            users,
            tokens,
            passwords,
            storage,
        }
    }

    /// State backed by in-memory repositories.
    pub fn in_memory(tokens: Arc<dyn TokenService>) -> Self {
        Self::from_parts(
            Arc::new(InMemoryPostRepository::new()),
            Arc::new(InMemoryUserRepository::new()),
            tokens,
            Arc::new(Argon2PasswordService::new()),
            Storage::Memory,
        )
    }

    /// Build the application state with appropriate implementations.
    ///
    /// Without a configured database the state runs on in-memory
    /// repositories. A configured database that cannot be reached is an error.
    pub async fn new(config: &AppConfig) -> io::Result<Self> {
        let tokens: Arc<dyn TokenService> = Arc::new(JwtTokenService::new(config.jwt.clone()));

        #[cfg(feature = "postgres")]
        let state = match &config.database {
            Some(db_config) => {
                let conn = postboard_infra::database::connect(db_config)
                    .await
                    .map_err(|e| {
                        tracing::error!("Failed to connect to database: {}", e);
                        io::Error::other(format!("database connection failed: {e}"))
                    })?;
                let conn = Arc::new(conn);

                Self::from_parts(
                    Arc::new(PostgresPostRepository::shared(conn.clone())),
                    Arc::new(PostgresUserRepository::shared(conn)),
                    tokens,
                    Arc::new(Argon2PasswordService::new()),
                    Storage::Postgres,
                )
            }
            None => {
                tracing::warn!("DATABASE_URL not set. Running without database (in-memory mode).");
                Self::in_memory(tokens)
            }
        };

        #[cfg(not(feature = "postgres"))]
        let state = {
            tracing::info!("Running without postgres feature - using in-memory repositories");
            Self::in_memory(tokens)
        };

        tracing::info!(storage = state.storage.as_str(), "Application state initialized");

        Ok(state)
    }
}
