mod common;

use common::{TestContext, PASSWORD};
use project_hosting_server::{
    errors::AppError,
    models::{ChangeEmailRequest, ChangePasswordRequest, CreateUserRequest, NotificationKind},
    repository::UserRepository,
};

#[tokio::test]
async fn test_email_change_requires_the_mailed_token() {
    let ctx = TestContext::new().await;
    let user = ctx.user("jeb").await;

    ctx.state
        .accounts
        .request_email_change(
            &user,
            ChangeEmailRequest {
                new_email: "Jeb@Mojang.com".to_string(),
                password: PASSWORD.to_string(),
            },
        )
        .await
        .unwrap();

    let sent = ctx
        .notifications
        .sent_of_kind(NotificationKind::EmailChangeRequested)
        .await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].recipient_id, user.id);
    assert_eq!(sent[0].payload["new_email"], "jeb@mojang.com");
    let token = sent[0].payload["token"].as_str().unwrap().to_string();

    let pending = ctx.store.find_user(user.id).await.unwrap().unwrap();
    assert_eq!(pending.email, "jeb@example.com");
    assert_eq!(pending.pending_email.as_deref(), Some("jeb@mojang.com"));
    assert_ne!(pending.email_change_token.as_deref(), Some(token.as_str()));

    let wrong = ctx.state.accounts.confirm_email_change(&pending, "nope").await;
    assert!(matches!(wrong, Err(AppError::Validation(_))));

    let confirmed = ctx
        .state
        .accounts
        .confirm_email_change(&pending, &token)
        .await
        .unwrap();
    assert_eq!(confirmed.email, "jeb@mojang.com");
    assert!(confirmed.pending_email.is_none());
    assert!(ctx
        .state
        .accounts
        .authenticate("jeb@mojang.com", PASSWORD)
        .await
        .is_ok());
}

#[tokio::test]
async fn test_email_change_rejects_taken_address() {
    let ctx = TestContext::new().await;
    let user = ctx.user("jeb").await;
    ctx.user("dinnerbone").await;

    let result = ctx
        .state
        .accounts
        .request_email_change(
            &user,
            ChangeEmailRequest {
                new_email: "dinnerbone@example.com".to_string(),
                password: PASSWORD.to_string(),
            },
        )
        .await;
    assert!(matches!(result, Err(AppError::Validation(_))));
    assert!(ctx.notifications.sent().await.is_empty());
}

#[tokio::test]
async fn test_password_change_and_deactivation() {
    let ctx = TestContext::new().await;
    let user = ctx.user("jeb").await;

    let bad = ctx
        .state
        .accounts
        .change_password(
            &user,
            ChangePasswordRequest {
                current_password: "not-it".to_string(),
                new_password: "Redstone#1337".to_string(),
            },
        )
        .await;
    assert!(matches!(bad, Err(AppError::Auth(_))));

    let user = ctx
        .state
        .accounts
        .change_password(
            &user,
            ChangePasswordRequest {
                current_password: PASSWORD.to_string(),
                new_password: "Redstone#1337".to_string(),
            },
        )
        .await
        .unwrap();
    assert!(ctx
        .state
        .accounts
        .authenticate("jeb@example.com", PASSWORD)
        .await
        .is_err());

    ctx.state
        .accounts
        .deactivate(&user, "Redstone#1337")
        .await
        .unwrap();
    let result = ctx
        .state
        .accounts
        .authenticate("jeb@example.com", "Redstone#1337")
        .await;
    assert!(matches!(result, Err(AppError::Auth(message)) if message.contains("deactivated")));
}

#[tokio::test]
async fn test_registration_rejects_weak_passwords_and_duplicate_emails() {
    let ctx = TestContext::new().await;
    ctx.user("jeb").await;

    let weak = ctx
        .state
        .accounts
        .register(CreateUserRequest {
            username: "notch".to_string(),
            email: "notch@example.com".to_string(),
            password: "password".to_string(),
        })
        .await;
    assert!(matches!(weak, Err(AppError::Validation(_))));

    let duplicate = ctx
        .state
        .accounts
        .register(CreateUserRequest {
            username: "jeb2".to_string(),
            email: "JEB@example.com".to_string(),
            password: PASSWORD.to_string(),
        })
        .await;
    assert!(matches!(duplicate, Err(AppError::Validation(_))));
}
