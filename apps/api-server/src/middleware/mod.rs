//! Middleware modules: error rendering and request guards.

pub mod auth;
pub mod error;
