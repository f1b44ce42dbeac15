use axum::{extract::State, response::Json};
use serde_json::json;

use crate::{errors::Result, handlers::AppState, middleware::auth::AuthenticatedUser};

/// Effective limits with their source layer, current usage and any breach warning.
#[utoipa::path(
    get,
    path = "/api/v1/me/quota",
    responses(
        (status = 200, description = "Quota status for the signed-in user"),
        (status = 401, description = "Authentication required")
    ),
    tag = "user"
)]
pub async fn get_quota(
    State(state): State<AppState>,
    AuthenticatedUser { user }: AuthenticatedUser,
) -> Result<Json<serde_json::Value>> {
    let status = state.quota.quota_status(&user).await?;

    Ok(Json(json!({
        "data": status
    })))
}
