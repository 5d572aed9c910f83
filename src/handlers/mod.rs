//! # API Handlers
//!
//! This module contains all the HTTP endpoint handlers for the Collecty API.

use axum::{extract::State, http::StatusCode, response::Json};

use crate::models::ServiceInfo;
use crate::server::AppState;

pub mod api_keys;
pub mod artifacts;
pub mod projects;
pub mod subscribe;
pub mod types;
pub mod widgets;

/// Root handler that returns basic service information
#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Service information", body = ServiceInfo)
    ),
    tag = "root"
)]
pub async fn root() -> Json<ServiceInfo> {
    Json(ServiceInfo::default())
}

/// Liveness and database health probe
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service healthy", body = serde_json::Value),
        (status = 503, description = "Database unreachable", body = serde_json::Value)
    ),
    tag = "root"
)]
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<serde_json::Value>) {
    match crate::db::health_check(&state.db).await {
        Ok(()) => (
            StatusCode::OK,
            Json(serde_json::json!({ "status": "ok" })),
        ),
        Err(err) => {
            tracing::error!(error = %err, "health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(serde_json::json!({ "status": "unavailable" })),
            )
        }
    }
}
