/// Database layer
///
/// - `pool`: PostgreSQL connection pool factory with health checking
/// - `migrations`: sqlx migration runner for the workspace `migrations/`
///   directory

pub mod migrations;
pub mod pool;

pub use migrations::run_migrations;
pub use pool::{create_pool, DatabaseConfig};
