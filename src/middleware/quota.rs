use axum::{
    extract::{Request, State},
    http::HeaderValue,
    middleware::Next,
    response::Response,
};

use crate::{handlers::AppState, middleware::auth::AuthenticatedUser};

pub const QUOTA_WARNING_HEADER: &str = "x-quota-warning";

/// Adds an advisory `X-Quota-Warning` header for signed-in users who have hit
/// a limit. Never blocks the request.
pub async fn quota_warning_middleware(
    State(state): State<AppState>,
    user: Option<AuthenticatedUser>,
    request: Request,
    next: Next,
) -> Response {
    let mut response = next.run(request).await;

    let Some(AuthenticatedUser { user }) = user else {
        return response;
    };

    match state.quota.check_quota_breach(&user).await {
        Ok(Some(message)) => {
            if let Ok(value) = HeaderValue::from_str(&message) {
                response.headers_mut().insert(QUOTA_WARNING_HEADER, value);
            }
        }
        Ok(None) => {}
        Err(e) => tracing::warn!(user_id = %user.id, "quota breach check failed: {}", e),
    }

    response
}
