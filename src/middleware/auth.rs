use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts},
};

use crate::{
    auth::TokenType,
    errors::AppError,
    handlers::AppState,
    models::User,
};

/// The caller behind a valid access token. The user row is re-read so role
/// changes and deactivation take effect immediately.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user: User,
}

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> std::result::Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|header| header.to_str().ok())
            .and_then(|header| header.strip_prefix("Bearer "))
            .ok_or_else(|| AppError::Auth("Authentication required".to_string()))?;

        let claims = state.jwt.verify_token(token, TokenType::Access)?;

        let user = state
            .repo
            .find_user(claims.sub)
            .await?
            .ok_or_else(|| AppError::Auth("User not found".to_string()))?;

        if !user.is_active() {
            return Err(AppError::Auth("Account is deactivated".to_string()));
        }

        Ok(AuthenticatedUser { user })
    }
}
