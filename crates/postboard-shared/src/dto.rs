//! Data Transfer Objects - request/response types for the API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Longest post body accepted, in characters.
pub const MAX_CONTENT_CHARS: usize = 5_000;

pub const USERNAME_MIN_CHARS: usize = 3;
pub const USERNAME_MAX_CHARS: usize = 32;
pub const PASSWORD_MIN_CHARS: usize = 8;

fn check_content(content: &str, errors: &mut Vec<String>) {
    if content.trim().is_empty() {
        errors.push("content must not be empty".to_string());
    } else if content.chars().count() > MAX_CONTENT_CHARS {
        errors.push(format!(
            "content must be at most {MAX_CONTENT_CHARS} characters"
        ));
    }
}

fn into_result(errors: Vec<String>) -> Result<(), Vec<String>> {
    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

/// Body of `POST /posts`.
///
/// Unknown fields (an author id in particular) are ignored; the author always
/// comes from the access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePostRequest {
    pub content: String,
}

impl CreatePostRequest {
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();
        check_content(&self.content, &mut errors);
        into_result(errors)
    }
}

/// Body of `PATCH /posts/{id}`. Omitted fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdatePostRequest {
    #[serde(default)]
    pub content: Option<String>,
}

impl UpdatePostRequest {
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();
        if let Some(content) = &self.content {
            check_content(content, &mut errors);
        }
        into_result(errors)
    }
}

fn default_limit() -> u64 {
    10
}

/// Query string of `GET /posts`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListPostsQuery {
    #[serde(default = "default_limit")]
    pub limit: u64,
    #[serde(default)]
    pub offset: u64,
    pub search: Option<String>,
    /// Restrict the listing to posts by this user.
    pub username: Option<String>,
}

impl ListPostsQuery {
    /// Largest `limit`/`offset` the database can represent (a BIGINT).
    pub const MAX_SLICE_BOUND: u64 = i64::MAX as u64;

    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();
        for (name, value) in [("limit", self.limit), ("offset", self.offset)] {
            if value > Self::MAX_SLICE_BOUND {
                errors.push(format!("{name} must be at most {}", Self::MAX_SLICE_BOUND));
            }
        }
        into_result(errors)
    }
}

/// Public representation of a post. Carries no author reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostResponse {
    pub id: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// Request to register a new user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterUserRequest {
    pub username: String,
    pub password: String,
}

impl RegisterUserRequest {
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        let len = self.username.chars().count();
        if !(USERNAME_MIN_CHARS..=USERNAME_MAX_CHARS).contains(&len) {
            errors.push(format!(
                "username must be between {USERNAME_MIN_CHARS} and {USERNAME_MAX_CHARS} characters"
            ));
        }
        if !self
            .username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            errors.push("username may only contain letters, digits and underscores".to_string());
        }
        if self.password.chars().count() < PASSWORD_MIN_CHARS {
            errors.push(format!(
                "password must be at least {PASSWORD_MIN_CHARS} characters"
            ));
        }

        into_result(errors)
    }
}

/// Request to login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Response containing a user's public information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: i32,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

/// Response containing authentication tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
}

impl AuthResponse {
    pub fn bearer(access_token: String, expires_in: u64) -> Self {
        Self {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in,
        }
    }
}
