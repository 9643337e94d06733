/// Common test utilities for integration tests
///
/// This module provides shared infrastructure for integration tests:
/// - Test database setup (migrations applied on first connect)
/// - Test user creation with real password hashes
/// - JWT token generation
/// - Request/response helpers

use axum::body::Body;
use axum::http::Request;
use sqlx::PgPool;
use teamtrack_api::app::{build_router, AppState};
use teamtrack_api::config::Config;
use teamtrack_shared::auth::jwt::{create_token, Claims, TokenType};
use teamtrack_shared::auth::password::hash_password;
use teamtrack_shared::models::user::{CreateUser, User};
use uuid::Uuid;

/// Test context containing all necessary resources
pub struct TestContext {
    pub db: PgPool,
    pub app: axum::Router,
    pub config: Config,
    pub user: User,
    pub jwt_token: String,
}

impl TestContext {
    /// Creates a new test context against the configured database
    ///
    /// Requires `DATABASE_URL` and `JWT_SECRET` in the environment (or a
    /// `.env` file); tests that use this are `#[ignore]`d so the default
    /// suite passes without infrastructure.
    pub async fn new() -> anyhow::Result<Self> {
        let config = Config::from_env()?;

        let db = PgPool::connect(&config.database.url).await?;

        // Run migrations (path relative to Cargo.toml, not this file)
        sqlx::migrate!("../migrations").run(&db).await?;

        let (user, jwt_token) = create_test_user(&db, &config, "ctx").await?;

        let state = AppState::new(db.clone(), config.clone());
        let app = build_router(state);

        Ok(TestContext {
            db,
            app,
            config,
            user,
            jwt_token,
        })
    }

    /// Returns authorization header value for the context user
    pub fn auth_header(&self) -> String {
        format!("Bearer {}", self.jwt_token)
    }

    /// Creates an additional user and returns it with a valid access token
    pub async fn create_user(&self, tag: &str) -> anyhow::Result<(User, String)> {
        create_test_user(&self.db, &self.config, tag).await
    }

    /// Cleans up test users (memberships cascade with them)
    pub async fn cleanup(&self) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(self.user.id)
            .execute(&self.db)
            .await?;
        Ok(())
    }
}

/// Creates a user with a unique email and a real argon2id hash
async fn create_test_user(
    db: &PgPool,
    config: &Config,
    tag: &str,
) -> anyhow::Result<(User, String)> {
    let user = User::create(
        db,
        CreateUser {
            email: format!("test-{}-{}@example.com", tag, Uuid::new_v4()),
            password_hash: hash_password("Test-Passw0rd!")?,
            name: Some(format!("Test User {}", tag)),
        },
    )
    .await?;

    let claims = Claims::new(user.id, TokenType::Access);
    let token = create_token(&claims, &config.jwt.secret)?;

    Ok((user, token))
}

/// Builds a JSON request with the given bearer token
pub fn json_request(
    method: &str,
    uri: &str,
    auth: Option<&str>,
    body: serde_json::Value,
) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");

    if let Some(auth) = auth {
        builder = builder.header("authorization", auth);
    }

    builder.body(Body::from(body.to_string())).unwrap()
}

/// Builds a bodyless request with the given bearer token
pub fn bare_request(method: &str, uri: &str, auth: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);

    if let Some(auth) = auth {
        builder = builder.header("authorization", auth);
    }

    builder.body(Body::empty()).unwrap()
}

/// Reads a response body as JSON
pub async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}
