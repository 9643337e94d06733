/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use teamtrack_api::{app::AppState, config::Config};
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let state = AppState::new(pool, config);
/// let app = teamtrack_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::config::Config;
use axum::{
    http::{header, HeaderValue, Method},
    routing::{delete, get, patch, post},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use teamtrack_shared::auth::middleware::create_jwt_middleware;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned for each request handler via axum's `State` extractor.
/// Uses Arc internally for cheap cloning.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates new application state
    pub fn new(db: PgPool, config: Config) -> Self {
        Self {
            db,
            config: Arc::new(config),
        }
    }

    /// Gets JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── /health                                   # Health check (public)
/// └── /v1/                                      # API v1 (versioned)
///     ├── /auth/                                # Public
///     │   ├── POST /register
///     │   ├── POST /login
///     │   └── POST /refresh
///     ├── /teams/                               # Authenticated
///     │   ├── GET    /                          # My teams (nested members/projects)
///     │   ├── POST   /                          # Create team
///     │   ├── GET    /:team_id/members          # List members
///     │   ├── POST   /:team_id/members          # Add member
///     │   └── DELETE /:team_id/members/:user_id # Remove member
///     ├── /projects/                            # Authenticated
///     │   ├── GET    /?team_id=                 # Projects of team
///     │   ├── POST   /                          # Create project
///     │   ├── DELETE /:project_id               # Delete (cascades to tasks)
///     │   └── GET    /:project_id/tasks         # Tasks of project
///     ├── /tasks/                               # Authenticated
///     │   ├── POST   /                          # Create task
///     │   ├── GET    /me                        # My assigned tasks
///     │   ├── POST   /assign                    # Assign task
///     │   ├── PATCH  /:task_id                  # Partial update
///     │   └── DELETE /:task_id                  # Delete task
///     └── /users/                               # Authenticated
///         └── GET    /?search=&team_id=         # Search users
/// ```
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Request tracing (tower-http TraceLayer)
/// 2. CORS (tower-http CorsLayer)
/// 3. JWT authentication (on every route below /v1 except /v1/auth)
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    // Health check (public, no auth)
    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    // Auth routes (public, no auth required)
    let auth_routes = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login))
        .route("/refresh", post(routes::auth::refresh));

    // Team routes
    let team_routes = Router::new()
        .route(
            "/",
            get(routes::teams::list_teams).post(routes::teams::create_team),
        )
        .route(
            "/:team_id/members",
            get(routes::teams::list_members).post(routes::teams::add_member),
        )
        .route(
            "/:team_id/members/:user_id",
            delete(routes::teams::remove_member),
        );

    // Project routes
    let project_routes = Router::new()
        .route(
            "/",
            get(routes::projects::list_projects).post(routes::projects::create_project),
        )
        .route("/:project_id", delete(routes::projects::delete_project))
        .route("/:project_id/tasks", get(routes::tasks::tasks_by_project));

    // Task routes
    let task_routes = Router::new()
        .route("/", post(routes::tasks::create_task))
        .route("/me", get(routes::tasks::my_tasks))
        .route("/assign", post(routes::tasks::assign_task))
        .route(
            "/:task_id",
            patch(routes::tasks::update_task).delete(routes::tasks::delete_task),
        );

    // User search
    let user_routes = Router::new().route("/", get(routes::users::search_users));

    // Everything except /auth requires a valid access token
    let protected_routes = Router::new()
        .nest("/teams", team_routes)
        .nest("/projects", project_routes)
        .nest("/tasks", task_routes)
        .nest("/users", user_routes)
        .layer(axum::middleware::from_fn(create_jwt_middleware(
            state.jwt_secret().to_string(),
        )));

    let v1_routes = Router::new().nest("/auth", auth_routes).merge(protected_routes);

    // Configure CORS based on environment
    let cors = if state.config.api.cors_origins.contains(&"*".to_string()) {
        // Development mode: permissive CORS
        CorsLayer::permissive()
    } else {
        // Production mode: configure allowed origins
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .merge(health_routes)
        .nest("/v1", v1_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .with_state(state)
}
