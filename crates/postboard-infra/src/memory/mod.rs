//! In-memory repositories - used when no database is configured, and by tests.
//!
//! Data is lost on process restart.

mod post;
mod user;

pub use post::InMemoryPostRepository;
pub use user::InMemoryUserRepository;
