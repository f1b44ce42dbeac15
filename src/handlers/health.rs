use axum::{extract::State, response::Json};
use serde_json::json;

use crate::{errors::Result, handlers::AppState};

#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Process is up")),
    tag = "health"
)]
pub async fn liveness() -> Result<Json<serde_json::Value>> {
    Ok(Json(json!({
        "status": "ok",
        "timestamp": chrono::Utc::now().to_rfc3339()
    })))
}

pub async fn readiness(State(state): State<AppState>) -> Result<Json<serde_json::Value>> {
    let storage_status = match state.repo.list_project_types().await {
        Ok(_) => "healthy",
        Err(e) => {
            tracing::warn!("readiness probe failed: {}", e);
            "unhealthy"
        }
    };

    let overall_status = if storage_status == "healthy" {
        "ready"
    } else {
        "not_ready"
    };

    Ok(Json(json!({
        "status": overall_status,
        "checks": {
            "database": storage_status
        },
        "timestamp": chrono::Utc::now().to_rfc3339()
    })))
}
