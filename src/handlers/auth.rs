use axum::{extract::State, http::StatusCode, response::Json};
use serde_json::json;

use crate::{
    auth::TokenType,
    errors::{AppError, Result},
    handlers::AppState,
    models::{AuthResponse, CreateUserRequest, LoginRequest, RefreshRequest, User, UserResponse},
};

fn issue_tokens(state: &AppState, user: User) -> Result<AuthResponse> {
    Ok(AuthResponse {
        access_token: state.jwt.generate_access_token(&user)?,
        refresh_token: state.jwt.generate_refresh_token(&user)?,
        user: UserResponse::from(user),
    })
}

pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>)> {
    let user = state.accounts.register(request).await?;
    let response = issue_tokens(&state, user)?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "User registered successfully",
            "data": response
        })),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<serde_json::Value>> {
    let user = state
        .accounts
        .authenticate(&request.email, &request.password)
        .await?;
    let response = issue_tokens(&state, user)?;

    Ok(Json(json!({
        "message": "Login successful",
        "data": response
    })))
}

pub async fn refresh(
    State(state): State<AppState>,
    Json(request): Json<RefreshRequest>,
) -> Result<Json<serde_json::Value>> {
    let claims = state
        .jwt
        .verify_token(&request.refresh_token, TokenType::Refresh)?;

    let user = state
        .repo
        .find_user(claims.sub)
        .await?
        .filter(User::is_active)
        .ok_or_else(|| AppError::Auth("User not found".to_string()))?;

    let access_token = state.jwt.generate_access_token(&user)?;

    Ok(Json(json!({
        "message": "Token refreshed successfully",
        "data": {
            "access_token": access_token,
            "user": UserResponse::from(user)
        }
    })))
}
