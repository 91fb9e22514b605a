//! Page controllers: each data-bound page owns its local state machine
//! (`idle → loading → loaded/error`) and composes repository calls with
//! input handling. Every fetch is tagged with a generation counter so a
//! slow response arriving after the page has moved on is discarded instead
//! of clobbering newer state.

use anyhow::{bail, Result};
use chrono::Local;

use crate::{
    articles::Articles,
    comments::{self, Comments},
    gateway::{Gateway, GatewayError},
    model::{Article, ArticleDraft, Comment, Identity},
    routes::Route,
    session::SessionStore,
    slug,
};

/// Lifecycle of a page's fetched data.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadState<T> {
    Idle,
    Loading,
    Loaded(T),
    Error(String),
}

impl<T> LoadState<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, LoadState::Loading)
    }

    pub fn loaded(&self) -> Option<&T> {
        match self {
            LoadState::Loaded(value) => Some(value),
            _ => None,
        }
    }
}

/// Default reading-time label for new drafts.
const DEFAULT_READ_TIME: &str = "5 分钟阅读";

fn today() -> String {
    Local::now().format("%Y-%m-%d").to_string()
}

// ---------------------------------------------------------------------------
// Blog list

/// The public blog listing.
pub struct BlogPage {
    repo: Articles,
    state: LoadState<Vec<Article>>,
    notice: Option<String>,
    generation: u64,
}

impl BlogPage {
    pub fn new(repo: Articles) -> Self {
        BlogPage {
            repo,
            state: LoadState::Idle,
            notice: None,
            generation: 0,
        }
    }

    /// Enter `Loading` and return the generation tag for this fetch.
    pub fn begin_load(&mut self) -> u64 {
        self.generation += 1;
        self.state = LoadState::Loading;
        self.generation
    }

    /// Apply a fetch result. Results from a superseded generation are
    /// dropped. A gateway failure renders as an empty list with a message
    /// rather than an error state.
    pub fn apply(&mut self, generation: u64, result: Result<Vec<Article>, GatewayError>) {
        if generation != self.generation {
            return;
        }
        match result {
            Ok(list) => {
                self.notice = None;
                self.state = LoadState::Loaded(list);
            }
            Err(err) => {
                eprintln!("error fetching articles: {err}");
                self.notice = Some("文章加载失败，请稍后再试。".to_string());
                self.state = LoadState::Loaded(Vec::new());
            }
        }
    }

    pub async fn load(&mut self, token: Option<&str>) {
        let generation = self.begin_load();
        let result = self.repo.list(token).await;
        self.apply(generation, result);
    }

    pub fn state(&self) -> &LoadState<Vec<Article>> {
        &self.state
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    /// Terminal rendering of the listing, in the order the gateway gave.
    pub fn render(&self) -> String {
        let mut out = String::from("最新文章\n\n");
        match &self.state {
            LoadState::Loaded(list) if !list.is_empty() => {
                for article in list {
                    out.push_str(&format!(
                        "  {}  [{}]\n    {} · {} · /articles/{}\n",
                        article.title, article.category, article.date, article.read_time,
                        article.slug
                    ));
                }
            }
            LoadState::Loaded(_) => out.push_str("  暂无文章。\n"),
            LoadState::Loading => out.push_str("  Loading articles...\n"),
            _ => {}
        }
        if let Some(notice) = &self.notice {
            out.push_str(&format!("\n  {notice}\n"));
        }
        out
    }
}

// ---------------------------------------------------------------------------
// Article detail

/// A loaded article with its comment thread.
#[derive(Debug, Clone, PartialEq)]
pub struct ArticleView {
    pub article: Article,
    pub comments: Vec<Comment>,
}

/// What the caller should do after a detail-page load.
#[derive(Debug, Clone, PartialEq)]
pub enum ArticleOutcome {
    /// The page has content (or an inline error) to show.
    Rendered,
    /// The slug matched nothing; navigate instead of rendering an error.
    Redirect(Route),
}

/// The article detail page, including its comment thread.
pub struct ArticlePage {
    articles: Articles,
    comments: Comments,
    state: LoadState<ArticleView>,
    generation: u64,
}

impl ArticlePage {
    pub fn new(articles: Articles, comments: Comments) -> Self {
        ArticlePage {
            articles,
            comments,
            state: LoadState::Idle,
            generation: 0,
        }
    }

    /// Resolve `slug` and load the comment thread. A missing article is a
    /// redirect outcome; only a failed fetch becomes an inline error.
    pub async fn load(&mut self, token: Option<&str>, slug: &str) -> ArticleOutcome {
        self.generation += 1;
        let generation = self.generation;
        self.state = LoadState::Loading;

        let fetched = self.articles.get_by_slug(token, slug).await;
        if generation != self.generation {
            return ArticleOutcome::Rendered;
        }
        match fetched {
            Ok(Some(article)) => {
                // A failed comment fetch degrades to an empty thread.
                let comments = self
                    .comments
                    .list_for(token, &article.id)
                    .await
                    .unwrap_or_default();
                if generation != self.generation {
                    return ArticleOutcome::Rendered;
                }
                self.state = LoadState::Loaded(ArticleView { article, comments });
                ArticleOutcome::Rendered
            }
            Ok(None) => {
                self.state = LoadState::Idle;
                ArticleOutcome::Redirect(Route::NotFound)
            }
            Err(err) => {
                self.state = LoadState::Error(err.to_string());
                ArticleOutcome::Rendered
            }
        }
    }

    /// Post a comment on the loaded article. Requires non-empty content and
    /// a signed-in author; the stored row is appended to the local thread.
    pub async fn add_comment(
        &mut self,
        token: Option<&str>,
        author: &Identity,
        content: &str,
    ) -> Result<()> {
        let trimmed = content.trim();
        if trimmed.is_empty() {
            bail!("comment content cannot be empty");
        }
        let LoadState::Loaded(view) = &mut self.state else {
            bail!("no article loaded to comment on");
        };
        let stored = self
            .comments
            .create(token, &view.article.id, author, trimmed)
            .await?;
        view.comments.push(stored);
        Ok(())
    }

    /// Delete a comment from the loaded thread. The affordance check here is
    /// UX only; the gateway's row rules are the authority.
    pub async fn delete_comment(
        &mut self,
        token: Option<&str>,
        viewer: &Identity,
        comment_id: &str,
    ) -> Result<()> {
        let LoadState::Loaded(view) = &mut self.state else {
            bail!("no article loaded");
        };
        let Some(comment) = view.comments.iter().find(|c| c.id == comment_id) else {
            bail!("no comment with id {comment_id}");
        };
        if !comments::can_delete(comment, Some(viewer), &view.article.user_id) {
            bail!("only the comment author or the article owner can delete a comment");
        }
        self.comments.delete(token, comment_id).await?;
        view.comments.retain(|c| c.id != comment_id);
        Ok(())
    }

    pub fn state(&self) -> &LoadState<ArticleView> {
        &self.state
    }

    pub fn render(&self) -> String {
        match &self.state {
            LoadState::Loaded(view) => {
                let a = &view.article;
                let mut out = format!(
                    "{}\n{}\n{} · {} · {}\n\n{}\n",
                    a.title,
                    a.category.to_uppercase(),
                    a.date,
                    a.read_time,
                    a.slug,
                    a.content
                );
                out.push_str(&format!("\n评论 ({})\n", view.comments.len()));
                for comment in &view.comments {
                    out.push_str(&format!(
                        "  [{}] {}: {}\n",
                        comment.id, comment.author_email, comment.content
                    ));
                }
                out
            }
            LoadState::Error(message) => format!("加载失败: {message}\n"),
            _ => String::from("Loading...\n"),
        }
    }
}

// ---------------------------------------------------------------------------
// Editor

/// Form fields bound by the editor.
#[derive(Debug, Clone, PartialEq)]
pub struct EditorForm {
    pub title: String,
    pub slug: String,
    pub category: String,
    pub date: String,
    pub read_time: String,
    pub description: String,
    pub content: String,
}

impl Default for EditorForm {
    fn default() -> Self {
        EditorForm {
            title: String::new(),
            slug: String::new(),
            category: String::new(),
            date: today(),
            read_time: DEFAULT_READ_TIME.to_string(),
            description: String::new(),
            content: String::new(),
        }
    }
}

/// The article editor: a form bound to either a new draft or an existing
/// record, plus the recent-articles history pane.
pub struct EditorPage {
    repo: Articles,
    form: EditorForm,
    editing_id: Option<String>,
    submitting: bool,
    history: LoadState<Vec<Article>>,
    generation: u64,
}

impl EditorPage {
    pub fn new(repo: Articles) -> Self {
        EditorPage {
            repo,
            form: EditorForm::default(),
            editing_id: None,
            submitting: false,
            history: LoadState::Idle,
            generation: 0,
        }
    }

    pub fn form(&self) -> &EditorForm {
        &self.form
    }

    pub fn editing_id(&self) -> Option<&str> {
        self.editing_id.as_deref()
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    /// Label for the submit control, swapped while a submit is in flight.
    pub fn submit_label(&self) -> &'static str {
        if self.submitting {
            "Saving..."
        } else if self.editing_id.is_some() {
            "Update"
        } else {
            "Publish"
        }
    }

    /// Change the title. While the slug field is still tracking derivation
    /// (empty, or equal to the derivation of the previous title), it is
    /// re-derived from the new title; once the user has diverged it
    /// manually, title edits leave it alone.
    pub fn set_title(&mut self, title: &str) {
        let tracking =
            self.form.slug.is_empty() || self.form.slug == slug::derive(&self.form.title);
        self.form.title = title.to_string();
        if tracking {
            self.form.slug = slug::derive(title);
        }
    }

    /// Manually set the slug, ending derivation tracking for this session.
    pub fn set_slug(&mut self, slug: &str) {
        self.form.slug = slug.to_string();
    }

    pub fn set_category(&mut self, category: &str) {
        self.form.category = category.to_string();
    }

    pub fn set_date(&mut self, date: &str) {
        self.form.date = date.to_string();
    }

    pub fn set_read_time(&mut self, read_time: &str) {
        self.form.read_time = read_time.to_string();
    }

    pub fn set_description(&mut self, description: &str) {
        self.form.description = description.to_string();
    }

    pub fn set_content(&mut self, content: &str) {
        self.form.content = content.to_string();
    }

    /// Bind an existing record for editing.
    pub fn edit(&mut self, article: &Article) {
        self.editing_id = Some(article.id.clone());
        self.form = EditorForm {
            title: article.title.clone(),
            slug: article.slug.clone(),
            category: article.category.clone(),
            date: article.date.clone(),
            read_time: article.read_time.clone(),
            description: article.description.clone(),
            content: article.content.clone(),
        };
    }

    /// Clear the form back to a fresh draft.
    pub fn reset(&mut self) {
        self.editing_id = None;
        self.form = EditorForm::default();
    }

    /// Preload the record behind `?id=`. An article owned by someone else is
    /// silently treated as "nothing to edit" and `false` is returned.
    pub async fn load_existing(
        &mut self,
        token: Option<&str>,
        id: &str,
        user: &Identity,
    ) -> Result<bool, GatewayError> {
        match self.repo.get_owned(token, id, &user.id).await? {
            Some(article) => {
                self.edit(&article);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Refresh the history pane (all articles, newest created first).
    pub async fn refresh_history(&mut self, token: Option<&str>) {
        self.generation += 1;
        let generation = self.generation;
        self.history = LoadState::Loading;
        let result = self.repo.list_recent(token).await;
        if generation != self.generation {
            return;
        }
        match result {
            Ok(list) => self.history = LoadState::Loaded(list),
            Err(err) => {
                eprintln!("error fetching editor history: {err}");
                self.history = LoadState::Loaded(Vec::new());
            }
        }
    }

    /// Submit the form: insert when no record is bound, full overwrite when
    /// one is. On success the history refreshes and the form resets; on
    /// failure the form is preserved for a manual retry.
    pub async fn submit(
        &mut self,
        token: Option<&str>,
        user: &Identity,
    ) -> Result<(), GatewayError> {
        self.submitting = true;
        let draft = ArticleDraft {
            title: self.form.title.clone(),
            slug: self.form.slug.clone(),
            category: self.form.category.clone(),
            date: self.form.date.clone(),
            read_time: self.form.read_time.clone(),
            description: self.form.description.clone(),
            content: self.form.content.clone(),
        };
        let result = match &self.editing_id {
            Some(id) => self.repo.update(token, id, &draft, user).await,
            None => self.repo.create(token, &draft, user).await.map(|_| ()),
        };
        self.submitting = false;
        result?;
        self.refresh_history(token).await;
        self.reset();
        Ok(())
    }

    /// Delete an article from the editor's history pane. The confirmation
    /// prompt is the caller's job; exactly one delete call goes out and only
    /// that id leaves the local list.
    pub async fn delete(&mut self, token: Option<&str>, id: &str) -> Result<(), GatewayError> {
        self.repo.delete(token, id).await?;
        if let LoadState::Loaded(list) = &mut self.history {
            list.retain(|a| a.id != id);
        }
        if self.editing_id.as_deref() == Some(id) {
            self.reset();
        }
        Ok(())
    }

    pub fn history(&self) -> &LoadState<Vec<Article>> {
        &self.history
    }
}

// ---------------------------------------------------------------------------
// Dashboard

/// The signed-in user's dashboard: their articles plus account actions.
pub struct DashboardPage {
    repo: Articles,
    gateway: Gateway,
    state: LoadState<Vec<Article>>,
    notice: Option<String>,
    generation: u64,
}

impl DashboardPage {
    pub fn new(repo: Articles, gateway: Gateway) -> Self {
        DashboardPage {
            repo,
            gateway,
            state: LoadState::Idle,
            notice: None,
            generation: 0,
        }
    }

    pub fn begin_load(&mut self) -> u64 {
        self.generation += 1;
        self.state = LoadState::Loading;
        self.generation
    }

    pub fn apply(&mut self, generation: u64, result: Result<Vec<Article>, GatewayError>) {
        if generation != self.generation {
            return;
        }
        match result {
            Ok(list) => {
                self.notice = None;
                self.state = LoadState::Loaded(list);
            }
            Err(err) => {
                eprintln!("error fetching your articles: {err}");
                self.notice = Some("文章加载失败。".to_string());
                self.state = LoadState::Loaded(Vec::new());
            }
        }
    }

    pub async fn load(&mut self, token: Option<&str>, user: &Identity) {
        let generation = self.begin_load();
        let result = self.repo.list_by_owner(token, &user.id).await;
        self.apply(generation, result);
    }

    /// Delete one of the user's articles and drop exactly that id from the
    /// local list, without a re-fetch.
    pub async fn delete_article(
        &mut self,
        token: Option<&str>,
        id: &str,
    ) -> Result<(), GatewayError> {
        self.repo.delete(token, id).await?;
        if let LoadState::Loaded(list) = &mut self.state {
            list.retain(|a| a.id != id);
        }
        Ok(())
    }

    /// Inline validation applied before any gateway call.
    pub fn password_error(new_password: &str) -> Option<&'static str> {
        if new_password.chars().count() < 6 {
            Some("Password must be at least 6 characters")
        } else {
            None
        }
    }

    /// Change the account password, validating length first.
    pub async fn change_password(&self, token: &str, new_password: &str) -> Result<()> {
        if let Some(message) = Self::password_error(new_password) {
            bail!("{message}");
        }
        self.gateway.update_password(token, new_password).await?;
        Ok(())
    }

    pub fn state(&self) -> &LoadState<Vec<Article>> {
        &self.state
    }

    pub fn render(&self, user: &Identity) -> String {
        let mut out = format!("{}\n\n", user.email);
        match &self.state {
            LoadState::Loaded(list) => {
                out.push_str(&format!("我的文章 ({})\n", list.len()));
                for article in list {
                    out.push_str(&format!(
                        "  [{}] {}  {} · {}\n",
                        article.id, article.title, article.date, article.category
                    ));
                }
                if list.is_empty() {
                    out.push_str("  您还没有发布任何文章。\n");
                }
            }
            LoadState::Loading => out.push_str("Loading...\n"),
            _ => {}
        }
        if let Some(notice) = &self.notice {
            out.push_str(&format!("\n  {notice}\n"));
        }
        out
    }
}

// ---------------------------------------------------------------------------
// Login / Register

/// The admin login form.
pub struct LoginPage {
    gateway: Gateway,
    error: Option<String>,
    loading: bool,
}

impl LoginPage {
    pub fn new(gateway: Gateway) -> Self {
        LoginPage {
            gateway,
            error: None,
            loading: false,
        }
    }

    /// Try the credentials; on success the session store records the
    /// sign-in and the caller navigates to the editor. Failures land in the
    /// inline error, leaving the form for a retry.
    pub async fn submit(
        &mut self,
        session: &mut SessionStore,
        email: &str,
        password: &str,
    ) -> Option<Route> {
        self.loading = true;
        self.error = None;
        let result = self.gateway.sign_in(email, password).await;
        self.loading = false;
        match result {
            Ok((tokens, identity)) => match session.signed_in(tokens, identity) {
                Ok(()) => Some(Route::Editor { id: None }),
                Err(err) => {
                    self.error = Some(err.to_string());
                    None
                }
            },
            Err(err) => {
                self.error = Some(err.to_string());
                None
            }
        }
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }
}

/// The account registration form.
pub struct RegisterPage {
    gateway: Gateway,
    error: Option<String>,
    success: bool,
    loading: bool,
}

impl RegisterPage {
    pub fn new(gateway: Gateway) -> Self {
        RegisterPage {
            gateway,
            error: None,
            success: false,
            loading: false,
        }
    }

    /// Sign up with a trimmed email. Success flips the page into its
    /// check-your-email confirmation state.
    pub async fn submit(&mut self, email: &str, password: &str) -> bool {
        if let Some(message) = DashboardPage::password_error(password) {
            self.error = Some(message.to_string());
            return false;
        }
        self.loading = true;
        self.error = None;
        let result = self.gateway.sign_up(email.trim(), password).await;
        self.loading = false;
        match result {
            Ok(()) => {
                self.success = true;
                true
            }
            Err(err) => {
                self.error = Some(err.to_string());
                false
            }
        }
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn succeeded(&self) -> bool {
        self.success
    }
}

// ---------------------------------------------------------------------------
// Static pages

/// Render the static marketing pages and the catch-all.
pub fn render_static(route: &Route) -> String {
    match route {
        Route::Home => String::from(
            "inkpost\n\n记录思维的火花，分享技术的见解。\n\n  /blog      最新文章\n  /about     关于\n  /projects  项目\n",
        ),
        Route::About => String::from("关于\n\n一个写代码也写文字的人。\n"),
        Route::Projects => {
            String::from("项目\n\n  inkpost — 这个博客的命令行客户端。\n")
        }
        _ => String::from("404\n\n页面不存在。返回 / 重新开始。\n"),
    }
}
