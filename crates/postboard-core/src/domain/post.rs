use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::user::UserId;

/// Post entity - a short piece of content written by a single user.
///
/// `user_id` is the author reference. It is set once from the authenticated
/// principal and must never reach an API response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub content: String,
    pub user_id: UserId,
    pub timestamp: DateTime<Utc>,
}

impl Post {
    /// Create a new post authored by `user_id`.
    pub fn new(new_post: NewPost, user_id: UserId) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            content: new_post.content,
            user_id,
            timestamp: Utc::now(),
        }
    }

    /// Whether `user_id` is the author of this post.
    pub fn is_owned_by(&self, user_id: UserId) -> bool {
        self.user_id == user_id
    }

    /// Merge the fields present in `patch`, leaving the rest untouched.
    pub fn apply(&mut self, patch: PostPatch) {
        if let Some(content) = patch.content {
            self.content = content;
        }
    }
}

/// Fields accepted when creating a post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPost {
    pub content: String,
}

/// Partial update of a post. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostPatch {
    pub content: Option<String>,
}

/// Listing parameters: an optional search term and author filter, sliced by
/// `offset`/`limit` after ordering newest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostQuery {
    pub limit: u64,
    pub offset: u64,
    pub search: Option<String>,
    pub author_id: Option<UserId>,
}

impl PostQuery {
    pub const DEFAULT_LIMIT: u64 = 10;

    pub fn new(limit: u64, offset: u64) -> Self {
        Self {
            limit,
            offset,
            search: None,
            author_id: None,
        }
    }

    pub fn with_search(mut self, search: Option<String>) -> Self {
        self.search = search;
        self
    }

    pub fn with_author(mut self, author_id: Option<UserId>) -> Self {
        self.author_id = author_id;
        self
    }

    /// Evaluate the filter predicates against a single post.
    ///
    /// Search is a case-insensitive substring match on content; the author
    /// filter is an exact match. Both are conjoined.
    pub fn matches(&self, post: &Post) -> bool {
        let search_ok = self
            .search
            .as_deref()
            .map(|term| post.content.to_lowercase().contains(&term.to_lowercase()))
            .unwrap_or(true);
        let author_ok = self.author_id.map(|id| post.user_id == id).unwrap_or(true);

        search_ok && author_ok
    }

    /// `ILIKE` pattern for the search term, with wildcards escaped so the term
    /// is matched literally.
    pub fn search_pattern(&self) -> Option<String> {
        self.search.as_deref().map(|term| {
            let mut escaped = String::with_capacity(term.len() + 2);
            escaped.push('%');
            for c in term.chars() {
                if matches!(c, '\\' | '%' | '_') {
                    escaped.push('\\');
                }
                escaped.push(c);
            }
            escaped.push('%');
            escaped
        })
    }
}

impl Default for PostQuery {
    fn default() -> Self {
        Self::new(Self::DEFAULT_LIMIT, 0)
    }
}
