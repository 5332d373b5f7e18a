//! Health HTTP Routes
//!
//! Process liveness and store readiness. Neither touches session data.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use serde::Serialize;
use tracing::warn;

use crate::store::StorePool;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Readiness check response
#[derive(Debug, Serialize)]
pub struct ReadinessResponse {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// `/health` and `/readiness`
pub fn health_routes(pool: Arc<dyn StorePool>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/readiness", get(readiness_handler))
        .with_state(pool)
}

/// Health check handler
async fn health_handler() -> impl IntoResponse {
    let response = HealthResponse {
        status: "ok".to_string(),
        version: crate::VERSION.to_string(),
    };

    (StatusCode::OK, Json(response))
}

/// Ready only while the store answers a liveness probe
async fn readiness_handler(State(pool): State<Arc<dyn StorePool>>) -> impl IntoResponse {
    match pool.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(ReadinessResponse {
                status: "ready".to_string(),
                error: None,
            }),
        ),
        Err(e) => {
            warn!(error = %e, "readiness probe failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ReadinessResponse {
                    status: "unavailable".to_string(),
                    error: Some(e.to_string()),
                }),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_readiness_response_serialization() {
        let ready = ReadinessResponse {
            status: "ready".to_string(),
            error: None,
        };
        assert_eq!(serde_json::to_string(&ready).unwrap(), r#"{"status":"ready"}"#);
    }
}
