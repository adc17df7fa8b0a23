//! # Postboard Shared
//!
//! Wire types of the HTTP API: request bodies, response documents and
//! RFC 7807 errors. Kept free of server dependencies so clients can reuse it.

pub mod dto;
pub mod response;

pub use response::{DeletedResponse, ErrorResponse, Paginated, Pagination};
