//! # TeamTrack API Server
//!
//! HTTP API for the TeamTrack team/task tracker: registration and login,
//! teams and memberships, projects nested under teams, and tasks nested
//! under projects.
//!
//! ## Architecture
//!
//! Built with axum over a shared sqlx PostgreSQL pool. Every team-scoped
//! handler authenticates the caller via JWT middleware and authorizes
//! through the access-control gate in `teamtrack-shared`.
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p teamtrack-api
//! ```

use teamtrack_api::app::{build_router, AppState};
use teamtrack_api::config::Config;
use teamtrack_shared::db::migrations::run_migrations;
use teamtrack_shared::db::pool::{create_pool, DatabaseConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "teamtrack_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        "TeamTrack API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::from_env()?;

    let pool = create_pool(DatabaseConfig {
        url: config.database.url.clone(),
        max_connections: config.database.max_connections,
        ..Default::default()
    })
    .await?;

    run_migrations(&pool).await?;

    let bind_address = config.bind_address();
    let state = AppState::new(pool, config);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    tracing::info!("Server listening on http://{}", bind_address);

    axum::serve(listener, app).await?;

    Ok(())
}
