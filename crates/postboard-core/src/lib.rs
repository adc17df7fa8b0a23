//! # Postboard Core
//!
//! The domain layer of Postboard.
//! This crate contains the post/user entities, the ports infrastructure must
//! implement, and the post service sitting between handlers and storage.

pub mod domain;
pub mod error;
pub mod ports;
pub mod services;

pub use error::DomainError;
pub use services::PostService;
