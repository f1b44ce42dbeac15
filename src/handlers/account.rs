use axum::{extract::State, http::StatusCode, response::Json};
use serde_json::json;

use crate::{
    errors::Result,
    handlers::AppState,
    middleware::auth::AuthenticatedUser,
    models::{
        ChangeEmailRequest, ChangePasswordRequest, ConfirmEmailRequest, DeactivateAccountRequest,
        UserResponse,
    },
};

pub async fn me(AuthenticatedUser { user }: AuthenticatedUser) -> Json<serde_json::Value> {
    Json(json!({
        "data": {
            "user": UserResponse::from(user.clone()),
            "pending_email": user.pending_email,
        }
    }))
}

pub async fn change_password(
    State(state): State<AppState>,
    AuthenticatedUser { user }: AuthenticatedUser,
    Json(request): Json<ChangePasswordRequest>,
) -> Result<Json<serde_json::Value>> {
    state.accounts.change_password(&user, request).await?;

    Ok(Json(json!({
        "message": "Password changed successfully"
    })))
}

/// The confirmation token goes out through the notification queue only.
pub async fn request_email_change(
    State(state): State<AppState>,
    AuthenticatedUser { user }: AuthenticatedUser,
    Json(request): Json<ChangeEmailRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>)> {
    state.accounts.request_email_change(&user, request).await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(json!({
            "message": "A confirmation link has been sent to the new address"
        })),
    ))
}

pub async fn confirm_email_change(
    State(state): State<AppState>,
    AuthenticatedUser { user }: AuthenticatedUser,
    Json(request): Json<ConfirmEmailRequest>,
) -> Result<Json<serde_json::Value>> {
    let user = state.accounts.confirm_email_change(&user, &request.token).await?;

    Ok(Json(json!({
        "message": "Email changed successfully",
        "data": UserResponse::from(user)
    })))
}

pub async fn deactivate(
    State(state): State<AppState>,
    AuthenticatedUser { user }: AuthenticatedUser,
    Json(request): Json<DeactivateAccountRequest>,
) -> Result<Json<serde_json::Value>> {
    state.accounts.deactivate(&user, &request.password).await?;

    Ok(Json(json!({
        "message": "Account deactivated"
    })))
}
