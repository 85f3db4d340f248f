use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tower::ServiceExt;

use tradejournal::api::router::create_router;
use tradejournal::config::AppConfig;
use tradejournal::db::JournalStore;
use tradejournal::AppState;

/// Minimal config for tests: in-memory store, cheap bcrypt.
#[allow(dead_code)]
pub fn test_config() -> AppConfig {
    AppConfig {
        database_url: None,
        host: "127.0.0.1".into(),
        port: 0,
        jwt_secret: "test-secret".into(),
        token_ttl_hours: 1,
        bcrypt_cost: 4,
        rolling_window: 5,
        reconnect_interval_secs: 15,
    }
}

/// Router backed by a fresh in-memory journal.
#[allow(dead_code)]
pub fn build_test_app() -> Router {
    let state = AppState {
        store: JournalStore::in_memory(),
        config: test_config(),
        metrics_handle: tradejournal::metrics::init_metrics(),
    };
    create_router(state)
}

/// Send a request, optionally with a JSON body and bearer token.
#[allow(dead_code)]
pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }

    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    app.clone().oneshot(request).await.unwrap()
}

#[allow(dead_code)]
pub async fn body_json(resp: Response<Body>) -> Value {
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}

/// Register a user and return its bearer token.
#[allow(dead_code)]
pub async fn signup(app: &Router, email: &str) -> String {
    let resp = send(
        app,
        "POST",
        "/api/auth/signup",
        None,
        Some(serde_json::json!({ "name": "Trader", "email": email, "password": "secret123" })),
    )
    .await;
    assert_eq!(resp.status(), 201);

    let json = body_json(resp).await;
    json["token"].as_str().unwrap().to_string()
}

/// Connect to `TEST_DATABASE_URL` and run all migrations. Returns `None`
/// when the variable is unset so database tests skip on machines without
/// Postgres. Tests share the database, so they work on freshly generated
/// ids and emails instead of truncating tables.
#[allow(dead_code)]
pub async fn setup_test_db() -> Option<PgPool> {
    let Ok(url) = std::env::var("TEST_DATABASE_URL") else {
        eprintln!("TEST_DATABASE_URL not set; skipping database test");
        return None;
    };

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&url)
        .await
        .expect("Failed to connect to test database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    Some(pool)
}

/// An email no other test run has used.
#[allow(dead_code)]
pub fn unique_email(prefix: &str) -> String {
    format!("{prefix}-{}@example.com", uuid::Uuid::new_v4().simple())
}
