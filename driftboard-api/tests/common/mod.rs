/// Common test utilities for integration tests
///
/// Shared infrastructure for the API integration tests:
/// - Database and Redis setup (migrations included)
/// - A unique test user per context
/// - JWT token generation
/// - The assembled router, driven directly as a tower service

use driftboard_api::app::{build_router, AppState};
use driftboard_api::config::Config;
use driftboard_shared::auth::jwt::{create_token, Claims, TokenType};
use driftboard_shared::models::user::{AuthProvider, CreateUser, User};
use driftboard_shared::redis::{RedisClient, RedisConfig};
use sqlx::PgPool;
use uuid::Uuid;

/// Test context containing all necessary resources
pub struct TestContext {
    pub db: PgPool,
    pub redis: RedisClient,
    pub app: axum::Router,
    pub config: Config,
    pub user: User,
    pub jwt_token: String,
}

impl TestContext {
    /// Creates a new test context with a fresh user
    pub async fn new() -> anyhow::Result<Self> {
        // Load test configuration
        let config = Config::from_env()?;

        // Connect to database
        let db = PgPool::connect(&config.database.url).await?;

        // Run migrations (path relative to Cargo.toml, not this file)
        sqlx::migrate!("../migrations").run(&db).await?;

        // Connect to Redis
        let redis = RedisClient::new(RedisConfig {
            url: config.redis.url.clone(),
            connection_timeout_secs: 5,
            command_timeout_secs: 10,
        })
        .await?;

        // Create test user
        let user = User::create(
            &db,
            CreateUser {
                email: format!("test-{}@example.com", Uuid::new_v4()),
                password_hash: String::new(),
                provider: AuthProvider::Password,
                display_name: Some("Test User".to_string()),
                photo_url: None,
            },
        )
        .await?;

        // Issue an access token for the test user
        let claims = Claims::new(user.id, &user.email, TokenType::Access);
        let jwt_token = create_token(&claims, &config.jwt.secret)?;

        // Build the application
        let state = AppState::new(db.clone(), redis.clone(), config.clone());
        let app = build_router(state);

        Ok(Self {
            db,
            redis,
            app,
            config,
            user,
            jwt_token,
        })
    }

    /// Authorization header value for the test user
    pub fn auth_header(&self) -> String {
        format!("Bearer {}", self.jwt_token)
    }

    /// Removes the test user (cascades to their tasks)
    pub async fn cleanup(&self) -> anyhow::Result<()> {
        User::delete(&self.db, self.user.id).await?;
        Ok(())
    }
}
