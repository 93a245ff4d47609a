//! Liveness and database reachability.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::AppState;

/// Body of `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
}

/// `GET /health`: 200 when the database answers, 503 otherwise.
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    if state.db.health_check().await {
        (
            StatusCode::OK,
            Json(HealthResponse {
                status: "OK".to_string(),
                message: "Server is running".to_string(),
            }),
        )
    } else {
        warn!("Health check failed: database unreachable");
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(HealthResponse {
                status: "unavailable".to_string(),
                message: "Database is unreachable".to_string(),
            }),
        )
    }
}
