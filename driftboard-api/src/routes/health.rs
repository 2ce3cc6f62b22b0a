/// Health check endpoint
///
/// Verifies the server is running and reports connectivity of both backing
/// services (PostgreSQL and Redis).
///
/// # Endpoint
///
/// ```text
/// GET /health
/// ```
///
/// # Response
///
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0",
///   "database": "connected",
///   "redis": "connected"
/// }
/// ```

use crate::{app::AppState, error::ApiResult};
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status ("healthy" or "degraded")
    pub status: String,

    /// Application version
    pub version: String,

    /// Database status
    pub database: String,

    /// Redis status
    pub redis: String,
}

/// Health check handler
pub async fn health_check(State(state): State<AppState>) -> ApiResult<Json<HealthResponse>> {
    let database_status = match sqlx::query("SELECT 1").fetch_one(&state.db).await {
        Ok(_) => "connected",
        Err(_) => "disconnected",
    };

    let redis_status = match state.redis.ping().await {
        Ok(true) => "connected",
        _ => "disconnected",
    };

    let healthy = database_status == "connected" && redis_status == "connected";

    Ok(Json(HealthResponse {
        status: if healthy { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: database_status.to_string(),
        redis: redis_status.to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_response_serialization() {
        let response = HealthResponse {
            status: "healthy".to_string(),
            version: "0.1.0".to_string(),
            database: "connected".to_string(),
            redis: "connected".to_string(),
        };

        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"status\":\"healthy\""));
        assert!(json.contains("\"redis\":\"connected\""));
    }
}
