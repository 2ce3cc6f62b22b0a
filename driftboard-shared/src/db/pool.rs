/// Database connection pool management
///
/// Production-grade PostgreSQL pool via sqlx: bounded connections, acquire
/// timeouts, idle/lifetime recycling, and a startup health check so a
/// misconfigured DATABASE_URL fails fast instead of at first query.
///
/// # Example
///
/// ```no_run
/// use driftboard_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), sqlx::Error> {
/// let config = DatabaseConfig {
///     url: std::env::var("DATABASE_URL").unwrap(),
///     ..Default::default()
/// };
///
/// let pool = create_pool(config).await?;
/// # Ok(())
/// # }
/// ```

use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::{debug, info};

/// Configuration for the database connection pool
///
/// All timeouts are in seconds for ease of configuration from environment
/// variables.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of idle connections to keep warm
    pub min_connections: u32,

    /// Timeout for acquiring a connection from the pool (seconds)
    pub connect_timeout_seconds: u64,

    /// How long a connection may sit idle before being closed (seconds)
    pub idle_timeout_seconds: Option<u64>,

    /// Maximum lifetime of a connection before recycling (seconds)
    pub max_lifetime_seconds: Option<u64>,

    /// Whether to test connections before handing them out
    pub test_before_acquire: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: 10,
            min_connections: 2,
            connect_timeout_seconds: 30,
            idle_timeout_seconds: Some(600),
            max_lifetime_seconds: Some(1800),
            test_before_acquire: true,
        }
    }
}

/// Creates and health-checks a PostgreSQL connection pool
///
/// # Errors
///
/// Returns an error if the URL is invalid, the database is unreachable, or
/// the health check fails.
pub async fn create_pool(config: DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    info!(
        max_connections = config.max_connections,
        min_connections = config.min_connections,
        "Creating database connection pool"
    );

    let mut pool_options = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.connect_timeout_seconds))
        .test_before_acquire(config.test_before_acquire);

    if let Some(idle_timeout) = config.idle_timeout_seconds {
        pool_options = pool_options.idle_timeout(Duration::from_secs(idle_timeout));
        debug!(idle_timeout_seconds = idle_timeout, "Set idle timeout");
    }

    if let Some(max_lifetime) = config.max_lifetime_seconds {
        pool_options = pool_options.max_lifetime(Duration::from_secs(max_lifetime));
        debug!(max_lifetime_seconds = max_lifetime, "Set max lifetime");
    }

    let pool = pool_options.connect(&config.url).await?;

    health_check(&pool).await?;

    info!("Database connection pool created successfully");
    Ok(pool)
}

/// Verifies database connectivity with a trivial query
pub async fn health_check(pool: &PgPool) -> Result<(), sqlx::Error> {
    let (one,): (i64,) = sqlx::query_as("SELECT 1").fetch_one(pool).await?;
    debug_assert_eq!(one, 1);
    debug!("Database health check passed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = DatabaseConfig::default();
        assert_eq!(config.max_connections, 10);
        assert_eq!(config.min_connections, 2);
        assert_eq!(config.connect_timeout_seconds, 30);
        assert!(config.test_before_acquire);
    }

    #[tokio::test]
    #[ignore] // Requires running PostgreSQL instance
    async fn test_create_pool() {
        let config = DatabaseConfig {
            url: std::env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            ..Default::default()
        };

        let pool = create_pool(config).await;
        assert!(pool.is_ok(), "Failed to create pool");
    }
}
