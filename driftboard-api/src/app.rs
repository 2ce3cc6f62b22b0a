/// Application state and router builder
///
/// Defines the shared application state and builds the Axum router with all
/// routes and middleware.
///
/// # Example
///
/// ```no_run
/// use driftboard_api::{app::{build_router, AppState}, config::Config};
/// use driftboard_shared::redis::{RedisClient, RedisConfig};
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let redis = RedisClient::new(RedisConfig::from_env()?).await?;
/// let state = AppState::new(pool, redis, config);
///
/// let app = build_router(state);
///
/// let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
/// axum::serve(listener, app).await?;
/// # Ok(())
/// # }
/// ```

use crate::config::Config;
use crate::error::ApiError;
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
    routing::{delete, get, patch, post},
    Router,
};
use driftboard_shared::auth::authenticate;
use driftboard_shared::redis::{ChangeListener, ChangePublisher, RedisClient};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Shared application state
///
/// Cloned for each request handler via Axum's `State` extractor; the inner
/// handles are all cheap to clone.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Redis client (health checks)
    pub redis: RedisClient,

    /// Board change publisher (task mutations)
    pub publisher: ChangePublisher,

    /// Board change listener (SSE live queries)
    pub listener: ChangeListener,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates new application state
    pub fn new(db: PgPool, redis: RedisClient, config: Config) -> Self {
        Self {
            db,
            publisher: ChangePublisher::new(redis.clone()),
            listener: ChangeListener::new(redis.clone()),
            redis,
            config: Arc::new(config),
        }
    }

    /// Gets the JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── /health                  # Health check (public)
/// └── /v1/                     # API v1 (versioned)
///     ├── /auth/               # Authentication endpoints (public)
///     │   ├── POST /register
///     │   ├── POST /login
///     │   ├── POST /google
///     │   └── POST /refresh
///     ├── /tasks/              # Task CRUD (JWT, owner-scoped)
///     │   ├── GET    /
///     │   ├── POST   /
///     │   ├── PATCH  /:id
///     │   └── DELETE /:id
///     └── /board               # Board views (JWT, owner-scoped)
///         ├── GET /            # Current snapshot
///         └── GET /stream      # SSE live query (full snapshots)
/// ```
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    // Health check (public, no auth)
    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    // Auth routes (public, no auth required)
    let auth_routes = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login))
        .route("/google", post(routes::auth::google))
        .route("/refresh", post(routes::auth::refresh));

    // Task routes (require JWT authentication)
    let task_routes = Router::new()
        .route("/", get(routes::tasks::list_tasks))
        .route("/", post(routes::tasks::create_task))
        .route("/:id", patch(routes::tasks::update_task))
        .route("/:id", delete(routes::tasks::delete_task))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    // Board routes (require JWT authentication)
    let board_routes = Router::new()
        .route("/", get(routes::board::get_board))
        .route("/stream", get(routes::board::stream_board))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    let v1_routes = Router::new()
        .nest("/auth", auth_routes)
        .nest("/tasks", task_routes)
        .nest("/board", board_routes);

    // Configure CORS based on environment
    let cors = if state.config.api.cors_origins.contains(&"*".to_string()) {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<axum::http::HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    };

    Router::new()
        .merge(health_routes)
        .nest("/v1", v1_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Authenticates a request and attaches the owner identity
///
/// Validates the bearer access token and inserts an `AuthContext` extension
/// that handlers read their owner scoping from.
async fn jwt_auth_layer(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let header_value = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    let context = authenticate(header_value, state.jwt_secret())?;
    request.extensions_mut().insert(context);

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ApiConfig, DatabaseConfig, GoogleConfig, JwtConfig, RedisConfig};

    #[test]
    fn test_config_wiring() {
        let config = Config {
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
                cors_origins: vec!["*".to_string()],
            },
            database: DatabaseConfig {
                url: "postgresql://localhost/driftboard".to_string(),
                max_connections: 10,
            },
            redis: RedisConfig {
                url: "redis://localhost:6379".to_string(),
            },
            jwt: JwtConfig {
                secret: "test-secret-key-with-enough-bytes!!!".to_string(),
            },
            google: GoogleConfig { client_id: None },
        };

        assert_eq!(config.bind_address(), "127.0.0.1:8080");
    }
}
