use assert_cmd::prelude::*;
use axum::{
    routing::{get, post},
    Json, Router,
};
use std::{fs, process::Command};
use tempfile::TempDir;

/// Bind a stub gateway on an ephemeral port and serve `app` in the
/// background for the lifetime of the test.
async fn serve(app: Router) -> std::net::SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app.into_make_service()).await.unwrap();
    });
    addr
}

fn write_env(dir: &TempDir, addr: std::net::SocketAddr) -> String {
    let env_path = dir.path().join("env");
    let content = format!(
        "GATEWAY_URL=http://{}\nGATEWAY_KEY=anon-key\nSESSION_FILE={}\n",
        addr,
        dir.path().join("session.json").display()
    );
    fs::write(&env_path, content).unwrap();
    env_path.to_str().unwrap().to_string()
}

fn article_json(id: &str, slug: &str, title: &str, date: &str) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "slug": slug,
        "title": title,
        "category": "随笔",
        "date": date,
        "read_time": "5 分钟阅读",
        "description": "teaser",
        "content": "body",
        "user_id": "u1",
        "created_at": "2024-01-01T00:00:00Z",
        "updated_at": "2024-01-01T00:00:00Z"
    })
}

fn auth_routes(app: Router) -> Router {
    app.route(
        "/auth/v1/token",
        post(|| async {
            Json(serde_json::json!({
                "access_token": "at",
                "refresh_token": "rt",
                "user": { "id": "u1", "email": "me@example.com" }
            }))
        }),
    )
    .route(
        "/auth/v1/user",
        get(|| async { Json(serde_json::json!({ "id": "u1", "email": "me@example.com" })) }),
    )
}

#[test]
fn init_writes_default_env_once() {
    let dir = TempDir::new().unwrap();
    let env_path = dir.path().join("env");
    let env_str = env_path.to_str().unwrap().to_string();

    Command::cargo_bin("inkpost")
        .unwrap()
        .args(["--env", &env_str, "init"])
        .assert()
        .success()
        .stdout(predicates::str::contains("Wrote"));

    let content = fs::read_to_string(&env_path).unwrap();
    assert!(content.contains("GATEWAY_URL="));
    assert!(content.contains("GATEWAY_KEY="));
    assert!(content.contains("SESSION_FILE="));

    Command::cargo_bin("inkpost")
        .unwrap()
        .args(["--env", &env_str, "init"])
        .assert()
        .success()
        .stdout(predicates::str::contains("already exists"));
}

#[tokio::test(flavor = "multi_thread")]
async fn blog_lists_articles_in_gateway_order() {
    let app = Router::new().route(
        "/rest/v1/articles",
        get(|| async {
            Json(vec![
                article_json("a2", "newer", "Newer Post", "2024-02-01"),
                article_json("a1", "older", "Older Post", "2024-01-01"),
            ])
        }),
    );
    let addr = serve(app).await;
    let dir = TempDir::new().unwrap();
    let env_path = write_env(&dir, addr);

    let output = Command::cargo_bin("inkpost")
        .unwrap()
        .args(["--env", &env_path, "blog"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let stdout = String::from_utf8(output).unwrap();
    let newer = stdout.find("Newer Post").unwrap();
    let older = stdout.find("Older Post").unwrap();
    assert!(newer < older, "gateway order must be preserved");
}

#[tokio::test(flavor = "multi_thread")]
async fn missing_article_renders_not_found_page() {
    let app = Router::new()
        .route(
            "/rest/v1/articles",
            get(|| async { Json(Vec::<serde_json::Value>::new()) }),
        )
        .route(
            "/rest/v1/comments",
            get(|| async { Json(Vec::<serde_json::Value>::new()) }),
        );
    let addr = serve(app).await;
    let dir = TempDir::new().unwrap();
    let env_path = write_env(&dir, addr);

    Command::cargo_bin("inkpost")
        .unwrap()
        .args(["--env", &env_path, "article", "no-such-post"])
        .assert()
        .success()
        .stdout(predicates::str::contains("404"));
}

#[tokio::test(flavor = "multi_thread")]
async fn article_detail_shows_comment_thread() {
    let app = Router::new()
        .route(
            "/rest/v1/articles",
            get(|| async { Json(vec![article_json("a1", "hello", "Hello", "2024-01-01")]) }),
        )
        .route(
            "/rest/v1/comments",
            get(|| async {
                Json(vec![serde_json::json!({
                    "id": "c1",
                    "article_id": "a1",
                    "user_id": "u2",
                    "author_email": "reader@example.com",
                    "content": "great read",
                    "created_at": "2024-01-02T00:00:00Z"
                })])
            }),
        );
    let addr = serve(app).await;
    let dir = TempDir::new().unwrap();
    let env_path = write_env(&dir, addr);

    Command::cargo_bin("inkpost")
        .unwrap()
        .args(["--env", &env_path, "article", "hello"])
        .assert()
        .success()
        .stdout(predicates::str::contains("great read"));
}

#[tokio::test(flavor = "multi_thread")]
async fn login_persists_session_for_later_commands() {
    let app = auth_routes(Router::new());
    let addr = serve(app).await;
    let dir = TempDir::new().unwrap();
    let env_path = write_env(&dir, addr);

    Command::cargo_bin("inkpost")
        .unwrap()
        .args(["--env", &env_path, "login", "me@example.com", "secret1"])
        .assert()
        .success()
        .stdout(predicates::str::contains("Signed in"));
    assert!(dir.path().join("session.json").exists());

    Command::cargo_bin("inkpost")
        .unwrap()
        .args(["--env", &env_path, "whoami"])
        .assert()
        .success()
        .stdout(predicates::str::contains("me@example.com"));

    Command::cargo_bin("inkpost")
        .unwrap()
        .args(["--env", &env_path, "logout"])
        .assert()
        .success();
    assert!(!dir.path().join("session.json").exists());

    Command::cargo_bin("inkpost")
        .unwrap()
        .args(["--env", &env_path, "whoami"])
        .assert()
        .success()
        .stdout(predicates::str::contains("Not signed in"));
}

#[tokio::test(flavor = "multi_thread")]
async fn publish_requires_a_session() {
    let app = Router::new();
    let addr = serve(app).await;
    let dir = TempDir::new().unwrap();
    let env_path = write_env(&dir, addr);

    Command::cargo_bin("inkpost")
        .unwrap()
        .args(["--env", &env_path, "publish", "My Post"])
        .assert()
        .failure()
        .stderr(predicates::str::contains("not signed in"));
}

#[tokio::test(flavor = "multi_thread")]
async fn publish_derives_slug_and_defaults_category() {
    let app = auth_routes(
        Router::new().route(
            "/rest/v1/articles",
            post(|Json(body): Json<serde_json::Value>| async move {
                assert_eq!(body["slug"], "my-post");
                assert_eq!(body["category"], "随笔");
                assert_eq!(body["user_id"], "u1");
                Json(vec![article_json("a1", "my-post", "My Post", "2024-01-01")])
            })
            .get(|| async { Json(vec![article_json("a1", "my-post", "My Post", "2024-01-01")]) }),
        ),
    );
    let addr = serve(app).await;
    let dir = TempDir::new().unwrap();
    let env_path = write_env(&dir, addr);

    Command::cargo_bin("inkpost")
        .unwrap()
        .args(["--env", &env_path, "login", "me@example.com", "secret1"])
        .assert()
        .success();

    Command::cargo_bin("inkpost")
        .unwrap()
        .args([
            "--env",
            &env_path,
            "publish",
            "My Post",
            "--description",
            "teaser",
            "--content",
            "body",
        ])
        .assert()
        .success()
        .stdout(predicates::str::contains("/articles/my-post"));
}

#[tokio::test(flavor = "multi_thread")]
async fn delete_with_yes_skips_the_prompt() {
    let app = auth_routes(Router::new().route(
        "/rest/v1/articles",
        axum::routing::delete(|| async { axum::http::StatusCode::NO_CONTENT }),
    ));
    let addr = serve(app).await;
    let dir = TempDir::new().unwrap();
    let env_path = write_env(&dir, addr);

    Command::cargo_bin("inkpost")
        .unwrap()
        .args(["--env", &env_path, "login", "me@example.com", "secret1"])
        .assert()
        .success();

    Command::cargo_bin("inkpost")
        .unwrap()
        .args(["--env", &env_path, "delete", "a1", "--yes"])
        .assert()
        .success()
        .stdout(predicates::str::contains("Deleted article a1"));
}

#[tokio::test(flavor = "multi_thread")]
async fn open_dispatches_routes_like_the_spa() {
    let app = Router::new().route(
        "/rest/v1/articles",
        get(|| async { Json(vec![article_json("a1", "hello", "Hello", "2024-01-01")]) }),
    );
    let addr = serve(app).await;
    let dir = TempDir::new().unwrap();
    let env_path = write_env(&dir, addr);

    Command::cargo_bin("inkpost")
        .unwrap()
        .args(["--env", &env_path, "open", "/"])
        .assert()
        .success()
        .stdout(predicates::str::contains("/blog"));

    Command::cargo_bin("inkpost")
        .unwrap()
        .args(["--env", &env_path, "open", "/blog"])
        .assert()
        .success()
        .stdout(predicates::str::contains("Hello"));

    Command::cargo_bin("inkpost")
        .unwrap()
        .args(["--env", &env_path, "open", "/no/such/page"])
        .assert()
        .success()
        .stdout(predicates::str::contains("404"));
}

#[tokio::test(flavor = "multi_thread")]
async fn unconfigured_gateway_degrades_with_a_warning() {
    let dir = TempDir::new().unwrap();
    let env_path = dir.path().join("env");
    fs::write(
        &env_path,
        format!(
            "GATEWAY_URL=\nGATEWAY_KEY=\nSESSION_FILE={}\n",
            dir.path().join("session.json").display()
        ),
    )
    .unwrap();

    // The listing still renders (empty, with a message) instead of crashing.
    Command::cargo_bin("inkpost")
        .unwrap()
        .args(["--env", env_path.to_str().unwrap(), "blog"])
        .assert()
        .success()
        .stderr(predicates::str::contains("warning"))
        .stdout(predicates::str::contains("文章加载失败"));
}
