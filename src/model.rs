//! Wire models for the gateway's `articles` and `comments` tables and its
//! auth sub-API.

use serde::{Deserialize, Serialize};

/// A published article row as stored by the gateway.
///
/// ```json
/// {
///   "id": "4f2c...",
///   "slug": "hello-world",
///   "title": "Hello, World!",
///   "category": "随笔",
///   "date": "2024-01-01",
///   "read_time": "5 分钟阅读",
///   "description": "A short teaser.",
///   "content": "markdown source...",
///   "user_id": "a1b2...",
///   "created_at": "2024-01-01T10:00:00Z",
///   "updated_at": "2024-01-01T10:00:00Z"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Article {
    /// Row identifier, assigned by the gateway on insert.
    pub id: String,
    /// URL-safe lookup key derived from the title (user-overridable).
    pub slug: String,
    pub title: String,
    pub category: String,
    /// Free-text display date; the gateway does not validate it.
    pub date: String,
    /// Free-text reading-time label.
    pub read_time: String,
    pub description: String,
    /// Markdown source, opaque to this client.
    pub content: String,
    /// Owner reference into the auth sub-API's users.
    pub user_id: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

/// Editable article fields, before owner stamping and category defaulting.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArticleDraft {
    pub title: String,
    pub slug: String,
    pub category: String,
    pub date: String,
    pub read_time: String,
    pub description: String,
    pub content: String,
}

/// A comment row attached to an article.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Comment {
    pub id: String,
    /// Parent article, required.
    pub article_id: String,
    /// Author reference into the auth sub-API's users.
    pub user_id: String,
    /// Author email captured at post time; later email changes do not
    /// rewrite old comments.
    pub author_email: String,
    pub content: String,
    #[serde(default)]
    pub created_at: String,
}

/// The currently signed-in user as reported by the auth sub-API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Identity {
    pub id: String,
    pub email: String,
}

/// Bearer tokens persisted between CLI invocations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionTokens {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: String,
}
