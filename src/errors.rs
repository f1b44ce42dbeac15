use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::models::ApprovalStatus;
use crate::services::approval::ApprovalAction;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Quota exceeded: {0}")]
    QuotaExceeded(String),

    #[error("Cannot {action} a project that is {from}")]
    InvalidStateTransition {
        from: ApprovalStatus,
        action: ApprovalAction,
    },

    #[error("Project cannot be edited while it is pending review")]
    ProjectLocked,

    #[error("Duplicate file name: {0}")]
    DuplicateFileName(String),

    #[error("A version cannot depend on its own project")]
    SelfDependency,

    #[error("Unresolved dependency reference: {0}")]
    UnresolvedDependency(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Not found")]
    NotFound,

    #[error("Forbidden")]
    Forbidden,

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Database(_)
            | AppError::Migration(_)
            | AppError::Redis(_)
            | AppError::Config(_)
            | AppError::Serialization(_)
            | AppError::Io(_)
            | AppError::Storage(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Auth(_) => StatusCode::UNAUTHORIZED,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::QuotaExceeded(_) => StatusCode::FORBIDDEN,
            AppError::InvalidStateTransition { .. } => StatusCode::CONFLICT,
            AppError::ProjectLocked => StatusCode::LOCKED,
            AppError::DuplicateFileName(_) => StatusCode::CONFLICT,
            AppError::SelfDependency | AppError::UnresolvedDependency(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Forbidden => StatusCode::FORBIDDEN,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let error_message = match self {
            AppError::Database(ref e) => {
                tracing::error!("Database error: {}", e);
                "Database error".to_string()
            }
            AppError::Migration(ref e) => {
                tracing::error!("Migration error: {}", e);
                "Database error".to_string()
            }
            AppError::Redis(ref e) => {
                tracing::error!("Redis error: {}", e);
                "Cache error".to_string()
            }
            AppError::Config(ref e) => {
                tracing::error!("Configuration error: {}", e);
                "Internal server error".to_string()
            }
            AppError::Serialization(ref e) => {
                tracing::error!("Serialization error: {}", e);
                "Internal server error".to_string()
            }
            AppError::Io(ref e) => {
                tracing::error!("IO error: {}", e);
                "Internal server error".to_string()
            }
            AppError::Storage(ref msg) => {
                tracing::error!("Storage error: {}", msg);
                "Storage error".to_string()
            }
            AppError::Internal(ref e) => {
                tracing::error!("Internal error: {}", e);
                "Internal server error".to_string()
            }
            AppError::Auth(msg)
            | AppError::Validation(msg)
            | AppError::QuotaExceeded(msg) => msg,
            AppError::NotFound => "Resource not found".to_string(),
            AppError::Forbidden => "Access forbidden".to_string(),
            other => other.to_string(),
        };

        let body = Json(json!({
            "error": error_message,
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_errors_map_to_client_statuses() {
        assert_eq!(
            AppError::QuotaExceeded("storage".into()).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(AppError::ProjectLocked.status_code(), StatusCode::LOCKED);
        assert_eq!(
            AppError::InvalidStateTransition {
                from: ApprovalStatus::Approved,
                action: ApprovalAction::Reject,
            }
            .status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::UnresolvedDependency("missing-mod".into()).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn test_invalid_transition_message_names_state_and_action() {
        let err = AppError::InvalidStateTransition {
            from: ApprovalStatus::Approved,
            action: ApprovalAction::Reject,
        };
        assert_eq!(err.to_string(), "Cannot reject a project that is approved");
    }
}
