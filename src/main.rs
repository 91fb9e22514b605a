//! Command line interface for the blog. Supports browsing the public pages,
//! account management, and the authenticated article editor, all backed by
//! the hosted gateway configured in the `.env` file.

mod articles;
mod comments;
mod config;
mod gateway;
mod model;
mod pages;
mod routes;
mod session;
mod slug;

use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use articles::Articles;
use comments::Comments;
use config::Settings;
use gateway::Gateway;
use model::Identity;
use pages::{ArticleOutcome, ArticlePage, BlogPage, DashboardPage, EditorPage, LoginPage, RegisterPage};
use routes::Route;
use session::SessionStore;

/// Command line interface entry point.
#[derive(Parser)]
#[command(name = "inkpost", author, version, about = "Command-line blog client")]
struct Cli {
    /// Path to the `.env` configuration file.
    #[arg(long, default_value = ".env")]
    env: String,
    /// Subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Supported CLI subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Write a default `.env` file if none exists.
    Init,
    /// Open a site path, e.g. `/blog` or `/articles/my-post`.
    Open { path: String },
    /// List all articles, newest display date first.
    Blog,
    /// Show one article with its comment thread.
    Article { slug: String },
    /// Create an account.
    Register { email: String, password: String },
    /// Sign in and persist the session.
    Login { email: String, password: String },
    /// Sign out and discard the session.
    Logout,
    /// Show the signed-in identity.
    Whoami,
    /// Change the account password.
    Passwd { new_password: String },
    /// Show your articles and account summary.
    Dashboard,
    /// Publish a new article.
    Publish {
        title: String,
        /// Override the slug derived from the title.
        #[arg(long)]
        slug: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        read_time: Option<String>,
        #[arg(long)]
        description: Option<String>,
        /// Markdown body as a literal argument.
        #[arg(long, conflicts_with = "content_file")]
        content: Option<String>,
        /// Markdown body read from a file.
        #[arg(long)]
        content_file: Option<PathBuf>,
    },
    /// Edit an existing article you own.
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        slug: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        read_time: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long, conflicts_with = "content_file")]
        content: Option<String>,
        #[arg(long)]
        content_file: Option<PathBuf>,
    },
    /// Delete an article by id.
    Delete {
        id: String,
        /// Skip the confirmation prompt.
        #[arg(long)]
        yes: bool,
    },
    /// Manage comments on an article.
    Comment {
        #[command(subcommand)]
        action: CommentAction,
    },
}

/// Operations available under `inkpost comment`.
#[derive(Subcommand)]
enum CommentAction {
    /// Post a comment on the article behind `slug`.
    Add { slug: String, content: String },
    /// Remove a comment you may delete (yours, or on your article).
    Remove {
        slug: String,
        id: String,
        /// Skip the confirmation prompt.
        #[arg(long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    run(cli).await
}

/// Execute the selected CLI subcommand.
async fn run(cli: Cli) -> Result<()> {
    if let Commands::Init = cli.command {
        return init_env(&cli.env);
    }
    ensure_env_file(&cli.env)?;
    let cfg = Settings::from_env(&cli.env);
    let gateway = Gateway::new(&cfg);
    let articles = Articles::new(gateway.clone());
    let comments = Comments::new(gateway.clone());
    // Restore the session up front, the way every page refreshes identity
    // on load; failures silently leave us anonymous.
    let mut session = SessionStore::new(cfg.session_file.clone());
    session.refresh(&gateway).await;

    match cli.command {
        Commands::Init => unreachable!(),
        Commands::Open { path } => {
            open_route(Route::parse(&path), &gateway, &articles, &comments, &session).await?;
        }
        Commands::Blog => {
            open_route(Route::Blog, &gateway, &articles, &comments, &session).await?;
        }
        Commands::Article { slug } => {
            show_article(&articles, &comments, &session, &slug).await?;
        }
        Commands::Register { email, password } => {
            let mut page = RegisterPage::new(gateway.clone());
            if page.submit(&email, &password).await {
                println!("Registration successful. Check your email to confirm the account.");
            } else {
                bail!("registration failed: {}", page.error().unwrap_or("unknown error"));
            }
        }
        Commands::Login { email, password } => {
            let mut page = LoginPage::new(gateway.clone());
            match page.submit(&mut session, &email, &password).await {
                Some(_) => println!("Signed in as {email}."),
                None => bail!("sign-in failed: {}", page.error().unwrap_or("unknown error")),
            }
        }
        Commands::Logout => {
            if let Some(token) = session.access_token().map(str::to_string) {
                if let Err(err) = gateway.sign_out(&token).await {
                    eprintln!("warning: remote sign-out failed: {err}");
                }
            }
            session.signed_out()?;
            println!("Signed out.");
        }
        Commands::Whoami => match session.current() {
            Some(user) => println!("{} ({})", user.email, user.id),
            None => println!("Not signed in."),
        },
        Commands::Passwd { new_password } => {
            let user = require_user(&session)?;
            let token = session
                .access_token()
                .map(str::to_string)
                .unwrap_or_default();
            let page = DashboardPage::new(articles.clone(), gateway.clone());
            page.change_password(&token, &new_password).await?;
            println!("Password updated for {}.", user.email);
        }
        Commands::Dashboard => {
            open_route(Route::Dashboard, &gateway, &articles, &comments, &session).await?;
        }
        Commands::Publish {
            title,
            slug,
            category,
            date,
            read_time,
            description,
            content,
            content_file,
        } => {
            let user = require_user(&session)?;
            let mut editor = EditorPage::new(articles.clone());
            editor.set_title(&title);
            fill_form(
                &mut editor,
                slug,
                category,
                date,
                read_time,
                description,
                content,
                content_file,
            )?;
            let form = editor.form().clone();
            editor
                .submit(session.access_token(), &user)
                .await
                .context("saving article")?;
            println!("Published \"{}\" at /articles/{}.", form.title, form.slug);
        }
        Commands::Edit {
            id,
            title,
            slug,
            category,
            date,
            read_time,
            description,
            content,
            content_file,
        } => {
            let user = require_user(&session)?;
            let mut editor = EditorPage::new(articles.clone());
            let found = editor
                .load_existing(session.access_token(), &id, &user)
                .await?;
            if !found {
                println!("No article to edit.");
                return Ok(());
            }
            if let Some(title) = title {
                editor.set_title(&title);
            }
            fill_form(
                &mut editor,
                slug,
                category,
                date,
                read_time,
                description,
                content,
                content_file,
            )?;
            let form = editor.form().clone();
            editor
                .submit(session.access_token(), &user)
                .await
                .context("saving article")?;
            println!("Updated \"{}\" at /articles/{}.", form.title, form.slug);
        }
        Commands::Delete { id, yes } => {
            require_user(&session)?;
            if !yes && !confirm("Are you sure you want to delete this article?")? {
                println!("Cancelled.");
                return Ok(());
            }
            articles.delete(session.access_token(), &id).await?;
            println!("Deleted article {id}.");
        }
        Commands::Comment { action } => match action {
            CommentAction::Add { slug, content } => {
                let user = require_user(&session)?;
                let mut page = ArticlePage::new(articles.clone(), comments.clone());
                load_or_not_found(&mut page, &session, &slug).await?;
                page.add_comment(session.access_token(), &user, &content)
                    .await?;
                println!("Comment posted on /articles/{slug}.");
            }
            CommentAction::Remove { slug, id, yes } => {
                let user = require_user(&session)?;
                if !yes && !confirm("Delete this comment?")? {
                    println!("Cancelled.");
                    return Ok(());
                }
                let mut page = ArticlePage::new(articles.clone(), comments.clone());
                load_or_not_found(&mut page, &session, &slug).await?;
                page.delete_comment(session.access_token(), &user, &id)
                    .await?;
                println!("Comment {id} deleted.");
            }
        },
    }
    Ok(())
}

/// Dispatch a parsed route the way the single-page app would.
async fn open_route(
    route: Route,
    gateway: &Gateway,
    articles: &Articles,
    comments: &Comments,
    session: &SessionStore,
) -> Result<()> {
    match route {
        Route::Blog => {
            let mut page = BlogPage::new(articles.clone());
            page.load(session.access_token()).await;
            print!("{}", page.render());
        }
        Route::Article { slug } => {
            show_article(articles, comments, session, &slug).await?;
        }
        Route::Dashboard => {
            let user = require_user(session)?;
            let mut page = DashboardPage::new(articles.clone(), gateway.clone());
            page.load(session.access_token(), &user).await;
            print!("{}", page.render(&user));
        }
        Route::Register => println!("Use `inkpost register <email> <password>`."),
        Route::AdminLogin => println!("Use `inkpost login <email> <password>`."),
        Route::Editor { id: Some(id) } => println!("Use `inkpost edit {id}`."),
        Route::Editor { id: None } => println!("Use `inkpost publish`."),
        route => print!("{}", pages::render_static(&route)),
    }
    Ok(())
}

/// Load an article detail page, printing the not-found page when the slug
/// resolves to nothing (a navigation outcome, not an error).
async fn show_article(
    articles: &Articles,
    comments: &Comments,
    session: &SessionStore,
    slug: &str,
) -> Result<()> {
    let mut page = ArticlePage::new(articles.clone(), comments.clone());
    match page.load(session.access_token(), slug).await {
        ArticleOutcome::Redirect(route) => print!("{}", pages::render_static(&route)),
        ArticleOutcome::Rendered => print!("{}", page.render()),
    }
    Ok(())
}

async fn load_or_not_found(
    page: &mut ArticlePage,
    session: &SessionStore,
    slug: &str,
) -> Result<()> {
    if let ArticleOutcome::Redirect(_) = page.load(session.access_token(), slug).await {
        bail!("no article at /articles/{slug}");
    }
    Ok(())
}

/// Apply the optional form flags shared by `publish` and `edit`.
#[allow(clippy::too_many_arguments)]
fn fill_form(
    editor: &mut EditorPage,
    slug: Option<String>,
    category: Option<String>,
    date: Option<String>,
    read_time: Option<String>,
    description: Option<String>,
    content: Option<String>,
    content_file: Option<PathBuf>,
) -> Result<()> {
    if let Some(slug) = slug {
        editor.set_slug(&slug);
    }
    if let Some(category) = category {
        editor.set_category(&category);
    }
    if let Some(date) = date {
        editor.set_date(&date);
    }
    if let Some(read_time) = read_time {
        editor.set_read_time(&read_time);
    }
    if let Some(description) = description {
        editor.set_description(&description);
    }
    if let Some(content) = content {
        editor.set_content(&content);
    }
    if let Some(path) = content_file {
        let body = fs::read_to_string(&path)
            .with_context(|| format!("reading content file {}", path.display()))?;
        editor.set_content(&body);
    }
    Ok(())
}

fn require_user(session: &SessionStore) -> Result<Identity> {
    match session.current() {
        Some(user) => Ok(user),
        None => bail!("not signed in; run `inkpost login <email> <password>` first"),
    }
}

/// Ask for a y/N confirmation on stdin.
fn confirm(prompt: &str) -> Result<bool> {
    print!("{prompt} [y/N] ");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(matches!(line.trim(), "y" | "Y" | "yes"))
}

/// Write a default `.env` file, reporting whether one already existed.
fn init_env(path: &str) -> Result<()> {
    if Path::new(path).exists() {
        println!("{path} already exists.");
        return Ok(());
    }
    ensure_env_file(path)?;
    println!("Wrote {path}; fill in GATEWAY_URL and GATEWAY_KEY.");
    Ok(())
}

/// Create a default `.env` file if one is not already present at `path`.
fn ensure_env_file(path: &str) -> Result<()> {
    let env_path = Path::new(path);
    if env_path.exists() {
        return Ok(());
    }
    if let Some(parent) = env_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let mut content = String::new();
    content.push_str("GATEWAY_URL=\n");
    content.push_str("GATEWAY_KEY=\n");
    content.push_str("SESSION_FILE=.inkpost-session.json\n");
    fs::write(env_path, content)?;
    Ok(())
}
