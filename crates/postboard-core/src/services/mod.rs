//! Application services - orchestration over the ports.

mod post;

pub use post::PostService;
