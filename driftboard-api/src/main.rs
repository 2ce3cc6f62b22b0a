//! # Driftboard API Server
//!
//! The store side of the Driftboard task board: an Axum server providing
//! authentication, owner-scoped task CRUD, and live board queries (SSE full
//! snapshots driven by Redis Stream change notifications).
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p driftboard-api
//! ```

use driftboard_api::app::{build_router, AppState};
use driftboard_api::config::Config;
use driftboard_shared::db::pool::{create_pool, DatabaseConfig};
use driftboard_shared::db::run_migrations;
use driftboard_shared::redis::{RedisClient, RedisConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "driftboard_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        "Driftboard API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    // Load configuration
    let config = Config::from_env()?;

    // Initialize database pool and run migrations
    let pool = create_pool(DatabaseConfig {
        url: config.database.url.clone(),
        max_connections: config.database.max_connections,
        ..Default::default()
    })
    .await?;
    run_migrations(&pool).await?;

    // Initialize Redis client
    let redis = RedisClient::new(RedisConfig {
        url: config.redis.url.clone(),
        connection_timeout_secs: 5,
        command_timeout_secs: 10,
    })
    .await?;

    // Build the application
    let bind_address = config.bind_address();
    let state = AppState::new(pool, redis, config);
    let app = build_router(state);

    // Start the server
    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    tracing::info!("Server listening on http://{}", bind_address);

    axum::serve(listener, app).await?;

    Ok(())
}
