//! Comment repository, scoped to a parent article.

use serde::Serialize;

use crate::{
    gateway::{Gateway, GatewayError, TableQuery},
    model::{Comment, Identity},
};

const TABLE: &str = "comments";

#[derive(Debug, Serialize)]
struct NewComment<'a> {
    article_id: &'a str,
    user_id: &'a str,
    author_email: &'a str,
    content: &'a str,
}

/// Typed access to the `comments` table.
#[derive(Clone)]
pub struct Comments {
    gateway: Gateway,
}

impl Comments {
    pub fn new(gateway: Gateway) -> Self {
        Comments { gateway }
    }

    /// Comments under `article_id`, oldest first.
    pub async fn list_for(
        &self,
        token: Option<&str>,
        article_id: &str,
    ) -> Result<Vec<Comment>, GatewayError> {
        let query = TableQuery::default()
            .eq("article_id", article_id)
            .order_asc("created_at");
        self.gateway.select(token, TABLE, &query).await
    }

    /// Post a comment as `author`, denormalizing their email into the row so
    /// later email changes don't rewrite history. Content is stored trimmed;
    /// callers validate non-emptiness before submitting.
    pub async fn create(
        &self,
        token: Option<&str>,
        article_id: &str,
        author: &Identity,
        content: &str,
    ) -> Result<Comment, GatewayError> {
        let payload = NewComment {
            article_id,
            user_id: &author.id,
            author_email: &author.email,
            content: content.trim(),
        };
        self.gateway.insert(token, TABLE, &payload).await
    }

    /// Issue exactly one delete call for `id`.
    pub async fn delete(&self, token: Option<&str>, id: &str) -> Result<(), GatewayError> {
        self.gateway.delete(token, TABLE, id).await
    }
}

/// Advisory UX check: whether the delete control should show for `viewer`.
/// The gateway's row rules are the actual authority; this never gates the
/// server side.
pub fn can_delete(comment: &Comment, viewer: Option<&Identity>, article_owner: &str) -> bool {
    match viewer {
        Some(user) => user.id == comment.user_id || user.id == article_owner,
        None => false,
    }
}
