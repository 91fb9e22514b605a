//! Article repository: maps page actions onto gateway table calls.

use serde::Serialize;

use crate::{
    gateway::{Gateway, GatewayError, TableQuery},
    model::{Article, ArticleDraft, Identity},
};

/// Table name on the gateway.
const TABLE: &str = "articles";

/// Category stored when the submitted one is empty after trimming.
pub const DEFAULT_CATEGORY: &str = "随笔";

/// A draft sealed for submission: trimmed/defaulted category plus the owner
/// stamp, exactly the shape the gateway expects for insert and update.
#[derive(Debug, Serialize)]
struct SealedDraft<'a> {
    title: &'a str,
    slug: &'a str,
    category: String,
    date: &'a str,
    read_time: &'a str,
    description: &'a str,
    content: &'a str,
    user_id: &'a str,
}

fn seal<'a>(draft: &'a ArticleDraft, owner: &'a Identity) -> SealedDraft<'a> {
    let trimmed = draft.category.trim();
    let category = if trimmed.is_empty() {
        DEFAULT_CATEGORY.to_string()
    } else {
        trimmed.to_string()
    };
    SealedDraft {
        title: &draft.title,
        slug: &draft.slug,
        category,
        date: &draft.date,
        read_time: &draft.read_time,
        description: &draft.description,
        content: &draft.content,
        user_id: &owner.id,
    }
}

/// Typed access to the `articles` table.
#[derive(Clone)]
pub struct Articles {
    gateway: Gateway,
}

impl Articles {
    pub fn new(gateway: Gateway) -> Self {
        Articles { gateway }
    }

    /// All articles, newest display date first. Order is taken verbatim from
    /// the gateway; no client-side re-sort happens.
    pub async fn list(&self, token: Option<&str>) -> Result<Vec<Article>, GatewayError> {
        let query = TableQuery::default().order_desc("date");
        self.gateway.select(token, TABLE, &query).await
    }

    /// All articles, most recently created first. The editor's history pane
    /// uses this instead of the display-date order.
    pub async fn list_recent(&self, token: Option<&str>) -> Result<Vec<Article>, GatewayError> {
        let query = TableQuery::default().order_desc("created_at");
        self.gateway.select(token, TABLE, &query).await
    }

    /// The given user's articles, most recently created first.
    pub async fn list_by_owner(
        &self,
        token: Option<&str>,
        user_id: &str,
    ) -> Result<Vec<Article>, GatewayError> {
        let query = TableQuery::default()
            .eq("user_id", user_id)
            .order_desc("created_at");
        self.gateway.select(token, TABLE, &query).await
    }

    /// Look an article up by slug. Zero rows is a navigation outcome for the
    /// caller (redirect to not-found), not an error.
    pub async fn get_by_slug(
        &self,
        token: Option<&str>,
        slug: &str,
    ) -> Result<Option<Article>, GatewayError> {
        let query = TableQuery::default().eq("slug", slug);
        let mut rows: Vec<Article> = self.gateway.select(token, TABLE, &query).await?;
        if rows.is_empty() {
            return Ok(None);
        }
        Ok(Some(rows.remove(0)))
    }

    /// Fetch an article by id for editing, but only when `user_id` owns it.
    /// Records owned by someone else are silently treated as absent.
    pub async fn get_owned(
        &self,
        token: Option<&str>,
        id: &str,
        user_id: &str,
    ) -> Result<Option<Article>, GatewayError> {
        let query = TableQuery::default().eq("id", id);
        let rows: Vec<Article> = self.gateway.select(token, TABLE, &query).await?;
        Ok(rows.into_iter().next().filter(|a| a.user_id == user_id))
    }

    /// Insert a new article owned by `owner`, returning the stored row.
    pub async fn create(
        &self,
        token: Option<&str>,
        draft: &ArticleDraft,
        owner: &Identity,
    ) -> Result<Article, GatewayError> {
        let payload = seal(draft, owner);
        self.gateway.insert(token, TABLE, &payload).await
    }

    /// Overwrite the article with `id`. The owner stamp is re-applied from
    /// the current session on every update, so an edit through a shared
    /// surface reassigns ownership; this matches the original behavior.
    pub async fn update(
        &self,
        token: Option<&str>,
        id: &str,
        draft: &ArticleDraft,
        owner: &Identity,
    ) -> Result<(), GatewayError> {
        let payload = seal(draft, owner);
        self.gateway.update(token, TABLE, id, &payload).await
    }

    /// Issue exactly one delete call for `id`.
    pub async fn delete(&self, token: Option<&str>, id: &str) -> Result<(), GatewayError> {
        self.gateway.delete(token, TABLE, id).await
    }
}
