use chrono::Utc;
use serde_json::json;
use std::sync::Arc;

use crate::{
    auth::{EmailTokenService, PasswordService},
    errors::{AppError, Result},
    models::{
        ChangeEmailRequest, ChangePasswordRequest, CreateUserRequest, NewUser, Notification,
        NotificationKind, User, UserRole,
    },
    repository::Repository,
    services::{approval::kind_label, metrics::MetricsService, notifications::NotificationSink},
};

/// Registration, credentials and the account lifecycle.
pub struct AccountService {
    repo: Arc<dyn Repository>,
    passwords: PasswordService,
    notifications: Arc<dyn NotificationSink>,
    metrics: Arc<MetricsService>,
}

impl AccountService {
    pub fn new(
        repo: Arc<dyn Repository>,
        passwords: PasswordService,
        notifications: Arc<dyn NotificationSink>,
        metrics: Arc<MetricsService>,
    ) -> Self {
        Self {
            repo,
            passwords,
            notifications,
            metrics,
        }
    }

    pub async fn register(&self, request: CreateUserRequest) -> Result<User> {
        self.register_with_role(request, UserRole::User).await
    }

    /// Used by the bootstrap path and tests to create administrators.
    pub async fn register_with_role(&self, request: CreateUserRequest, role: UserRole) -> Result<User> {
        validate_username(&request.username)?;
        let email = normalize_email(&request.email)?;
        PasswordService::validate_password_strength(&request.password)?;

        if self.repo.find_user_by_email(&email).await?.is_some() {
            return Err(AppError::Validation(
                "User with this email already exists".to_string(),
            ));
        }

        let user = self
            .repo
            .create_user(NewUser {
                username: request.username,
                email,
                password_hash: self.passwords.hash_password(&request.password)?,
                role,
            })
            .await?;

        tracing::info!(user_id = %user.id, "user registered");
        Ok(user)
    }

    pub async fn authenticate(&self, email: &str, password: &str) -> Result<User> {
        let invalid = || AppError::Auth("Invalid email or password".to_string());

        let user = self
            .repo
            .find_user_by_email(&email.trim().to_lowercase())
            .await?
            .ok_or_else(invalid)?;
        if !PasswordService::verify_password(password, &user.password_hash)? {
            return Err(invalid());
        }
        if !user.is_active() {
            return Err(AppError::Auth("Account is deactivated".to_string()));
        }
        Ok(user)
    }

    pub async fn change_password(&self, user: &User, request: ChangePasswordRequest) -> Result<User> {
        self.verify_current_password(user, &request.current_password)?;
        PasswordService::validate_password_strength(&request.new_password)?;

        let mut updated = user.clone();
        updated.password_hash = self.passwords.hash_password(&request.new_password)?;
        let updated = self.repo.update_user(&updated).await?;

        tracing::info!(user_id = %user.id, "password changed");
        Ok(updated)
    }

    /// Stores the new address as pending and queues a confirmation token for the
    /// account holder. Only the token's hash is persisted; the plain token is
    /// returned for in-process callers and never leaves the HTTP layer.
    pub async fn request_email_change(&self, user: &User, request: ChangeEmailRequest) -> Result<String> {
        self.verify_current_password(user, &request.password)?;
        let new_email = normalize_email(&request.new_email)?;

        if new_email.eq_ignore_ascii_case(&user.email) {
            return Err(AppError::Validation(
                "New email matches the current one".to_string(),
            ));
        }
        if self.repo.find_user_by_email(&new_email).await?.is_some() {
            return Err(AppError::Validation("Email is already in use".to_string()));
        }

        let token = EmailTokenService::generate_token();
        let mut updated = user.clone();
        updated.pending_email = Some(new_email.clone());
        updated.email_change_token = Some(EmailTokenService::hash_token(&token));
        self.repo.update_user(&updated).await?;

        let notification = Notification::new(
            user.id,
            NotificationKind::EmailChangeRequested,
            json!({ "new_email": new_email, "token": token }),
        );
        match self.notifications.enqueue(notification).await {
            Ok(()) => self
                .metrics
                .record_notification(kind_label(NotificationKind::EmailChangeRequested)),
            Err(e) => tracing::warn!(user_id = %user.id, "failed to enqueue email confirmation: {}", e),
        }

        Ok(token)
    }

    pub async fn confirm_email_change(&self, user: &User, token: &str) -> Result<User> {
        let (Some(pending), Some(stored_hash)) = (&user.pending_email, &user.email_change_token) else {
            return Err(AppError::Validation("No email change is pending".to_string()));
        };
        if !EmailTokenService::matches(token, stored_hash) {
            return Err(AppError::Validation("Invalid confirmation token".to_string()));
        }
        if self.repo.find_user_by_email(pending).await?.is_some() {
            return Err(AppError::Validation("Email is already in use".to_string()));
        }

        let mut updated = user.clone();
        updated.email = pending.clone();
        updated.pending_email = None;
        updated.email_change_token = None;
        let updated = self.repo.update_user(&updated).await?;

        tracing::info!(user_id = %user.id, "email changed");
        Ok(updated)
    }

    pub async fn deactivate(&self, user: &User, password: &str) -> Result<()> {
        self.verify_current_password(user, password)?;

        let mut updated = user.clone();
        updated.deactivated_at = Some(Utc::now());
        self.repo.update_user(&updated).await?;

        tracing::info!(user_id = %user.id, "account deactivated");
        Ok(())
    }

    fn verify_current_password(&self, user: &User, password: &str) -> Result<()> {
        if !PasswordService::verify_password(password, &user.password_hash)? {
            return Err(AppError::Auth("Current password is incorrect".to_string()));
        }
        Ok(())
    }
}

fn validate_username(username: &str) -> Result<()> {
    let valid_chars = username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if !(3..=32).contains(&username.len()) || !valid_chars {
        return Err(AppError::Validation(
            "Username must be 3-32 characters of letters, digits, '_' or '-'".to_string(),
        ));
    }
    Ok(())
}

fn normalize_email(email: &str) -> Result<String> {
    let email = email.trim().to_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(email),
        _ => Err(AppError::Validation("Invalid email address".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email(" Steve@Example.com ").unwrap(), "steve@example.com");
        assert!(normalize_email("steve").is_err());
        assert!(normalize_email("@example.com").is_err());
        assert!(normalize_email("steve@localhost").is_err());
    }

    #[test]
    fn test_validate_username() {
        assert!(validate_username("jellysquid_3").is_ok());
        assert!(validate_username("ab").is_err());
        assert!(validate_username("spaces are bad").is_err());
    }
}
