/// Database migration runner
///
/// Migrations live in the workspace `migrations/` directory as reversible
/// sqlx pairs (`{version}_{name}.up.sql` / `.down.sql`) and are embedded at
/// compile time, so the binary carries its own schema.
///
/// # Example
///
/// ```no_run
/// use driftboard_shared::db::pool::{create_pool, DatabaseConfig};
/// use driftboard_shared::db::migrations::run_migrations;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
/// run_migrations(&pool).await?;
/// # Ok(())
/// # }
/// ```

use sqlx::postgres::PgPool;
use tracing::{info, warn};

/// Runs all pending database migrations
///
/// # Errors
///
/// Returns an error if a migration file is malformed, a migration fails to
/// execute, or the connection is lost mid-run.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    info!("Starting database migrations");

    let migrations = sqlx::migrate!("../migrations");

    match migrations.run(pool).await {
        Ok(()) => {
            info!("All database migrations completed successfully");
            Ok(())
        }
        Err(e) => {
            warn!("Migration failed: {}", e);
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::pool::{create_pool, DatabaseConfig};

    #[tokio::test]
    #[ignore] // Requires running PostgreSQL instance
    async fn test_migrations_are_idempotent() {
        let config = DatabaseConfig {
            url: std::env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            ..Default::default()
        };
        let pool = create_pool(config).await.unwrap();

        run_migrations(&pool).await.unwrap();
        // A second run must be a no-op, not an error.
        run_migrations(&pool).await.unwrap();
    }
}
