/// Service banner and health check
///
/// # Endpoints
///
/// - `GET /` - Service name and version
/// - `GET /api/health` - Liveness plus database connectivity

use crate::app::AppState;
use axum::{extract::State, http::StatusCode, Json};
use feedtrack_shared::db::pool;
use serde::{Deserialize, Serialize};

/// Root banner
#[derive(Debug, Serialize, Deserialize)]
pub struct RootResponse {
    pub message: String,
    pub version: String,
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// `healthy` or `degraded`
    pub status: String,

    pub version: String,

    /// `connected` or `disconnected`
    pub database: String,
}

pub async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        message: "Feedtrack API".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Returns 200 when the database answers, 503 otherwise
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let connected = match pool::health_check(&state.db).await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "Database health check failed");
            false
        }
    };

    let (status, label, database) = if connected {
        (StatusCode::OK, "healthy", "connected")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded", "disconnected")
    };

    (
        status,
        Json(HealthResponse {
            status: label.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            database: database.to_string(),
        }),
    )
}
