mod common;

use common::TestContext;
use project_hosting_server::{
    errors::AppError,
    models::{ApprovalStatus, CreateProjectRequest, NotificationKind, UpdateProjectRequest},
    repository::ProjectRepository,
    services::ApprovalAction,
};

fn create_request(ctx: &TestContext, slug: &str) -> CreateProjectRequest {
    CreateProjectRequest {
        project_type_id: ctx.mod_type.id,
        slug: slug.to_string(),
        name: "Sodium".to_string(),
        summary: "A modern rendering engine".to_string(),
        description: String::new(),
    }
}

#[tokio::test]
async fn test_review_round_trip() {
    let ctx = TestContext::new().await;
    let owner = ctx.user("jellysquid").await;
    let admin = ctx.admin("moderator").await;

    let project = ctx
        .state
        .projects
        .create_project(&owner, create_request(&ctx, "sodium"))
        .await
        .unwrap();
    assert_eq!(project.approval_status, ApprovalStatus::Draft);
    assert!(project.submitted_at.is_none());

    let project = ctx
        .state
        .approvals
        .submit_for_review(&owner, project.id)
        .await
        .unwrap();
    assert_eq!(project.approval_status, ApprovalStatus::Pending);
    assert!(project.submitted_at.is_some());

    let edit = ctx
        .state
        .projects
        .update_project(
            &owner,
            project.id,
            UpdateProjectRequest {
                name: Some("Sodium Reforged".to_string()),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(edit, Err(AppError::ProjectLocked)));

    let project = ctx.state.approvals.approve(&admin, project.id).await.unwrap();
    assert_eq!(project.approval_status, ApprovalStatus::Approved);
    assert_eq!(project.reviewed_by, Some(admin.id));
    assert!(project.reviewed_at.is_some());

    let approved = ctx.notifications.sent_of_kind(NotificationKind::ProjectApproved).await;
    assert_eq!(approved.len(), 1);
    assert_eq!(approved[0].recipient_id, owner.id);

    let edited = ctx
        .state
        .projects
        .update_project(
            &owner,
            project.id,
            UpdateProjectRequest {
                summary: Some("Faster chunks".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(edited.summary, "Faster chunks");
}

#[tokio::test]
async fn test_resubmit_while_pending_is_a_no_op() {
    let ctx = TestContext::new().await;
    let owner = ctx.user("jellysquid").await;
    let project = ctx.insert_project(&owner, "sodium", ApprovalStatus::Draft).await;

    let first = ctx
        .state
        .approvals
        .submit_for_review(&owner, project.id)
        .await
        .unwrap();
    let second = ctx
        .state
        .approvals
        .submit_for_review(&owner, project.id)
        .await
        .unwrap();

    assert_eq!(second.approval_status, ApprovalStatus::Pending);
    assert_eq!(second.submitted_at, first.submitted_at);
}

#[tokio::test]
async fn test_reject_after_approve_fails() {
    let ctx = TestContext::new().await;
    let owner = ctx.user("jellysquid").await;
    let admin = ctx.admin("moderator").await;
    let project = ctx.insert_project(&owner, "sodium", ApprovalStatus::Pending).await;

    ctx.state.approvals.approve(&admin, project.id).await.unwrap();
    let result = ctx
        .state
        .approvals
        .reject(&admin, project.id, "Changed my mind")
        .await;

    assert!(matches!(
        result,
        Err(AppError::InvalidStateTransition {
            from: ApprovalStatus::Approved,
            action: ApprovalAction::Reject,
        })
    ));
    let stored = ctx.store.find_project(project.id).await.unwrap().unwrap();
    assert_eq!(stored.approval_status, ApprovalStatus::Approved);
}

#[tokio::test]
async fn test_rejection_notifies_owner_and_allows_resubmission() {
    let ctx = TestContext::new().await;
    let owner = ctx.user("jellysquid").await;
    let admin = ctx.admin("moderator").await;
    let project = ctx.insert_project(&owner, "sodium", ApprovalStatus::Pending).await;

    let rejected = ctx
        .state
        .approvals
        .reject(&admin, project.id, "Missing license")
        .await
        .unwrap();
    assert_eq!(rejected.rejection_reason.as_deref(), Some("Missing license"));

    let sent = ctx.notifications.sent_of_kind(NotificationKind::ProjectRejected).await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].payload["rejection_reason"], "Missing license");

    let resubmitted = ctx
        .state
        .approvals
        .submit_for_review(&owner, project.id)
        .await
        .unwrap();
    assert_eq!(resubmitted.approval_status, ApprovalStatus::Pending);
    assert!(resubmitted.rejection_reason.is_none());
}

#[tokio::test]
async fn test_only_admins_review_and_only_owners_submit() {
    let ctx = TestContext::new().await;
    let owner = ctx.user("jellysquid").await;
    let stranger = ctx.user("griefer").await;
    let project = ctx.insert_project(&owner, "sodium", ApprovalStatus::Draft).await;

    assert!(matches!(
        ctx.state.approvals.submit_for_review(&stranger, project.id).await,
        Err(AppError::Forbidden)
    ));

    ctx.state
        .approvals
        .submit_for_review(&owner, project.id)
        .await
        .unwrap();
    assert!(matches!(
        ctx.state.approvals.approve(&owner, project.id).await,
        Err(AppError::Forbidden)
    ));
    assert!(matches!(
        ctx.state.approvals.pending_queue(&owner, 10, 0).await,
        Err(AppError::Forbidden)
    ));
}

#[tokio::test]
async fn test_auto_approve_stamps_review_times() {
    let ctx = TestContext::with_config(|config| config.auto_approve = true).await;
    let owner = ctx.user("jellysquid").await;

    let project = ctx
        .state
        .projects
        .create_project(&owner, create_request(&ctx, "sodium"))
        .await
        .unwrap();

    assert_eq!(project.approval_status, ApprovalStatus::Approved);
    assert!(project.submitted_at.is_some());
    assert!(project.reviewed_at.is_some());
}

#[tokio::test]
async fn test_create_project_enforces_pending_quota_and_unique_slug() {
    let ctx = TestContext::with_config(|config| config.quota.pending_projects_max = Some(1)).await;
    let owner = ctx.user("jellysquid").await;
    ctx.insert_project(&owner, "lithium", ApprovalStatus::Pending).await;

    let blocked = ctx
        .state
        .projects
        .create_project(&owner, create_request(&ctx, "sodium"))
        .await;
    assert!(matches!(blocked, Err(AppError::QuotaExceeded(_))));

    let other = ctx.user("caffeine").await;
    let taken = ctx
        .state
        .projects
        .create_project(&other, create_request(&ctx, "lithium"))
        .await;
    assert!(matches!(taken, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn test_soft_delete_and_restore() {
    let ctx = TestContext::new().await;
    let owner = ctx.user("jellysquid").await;
    let project = ctx.insert_project(&owner, "sodium", ApprovalStatus::Approved).await;

    ctx.state.projects.delete_project(&owner, project.id).await.unwrap();
    assert!(ctx.store.find_project(project.id).await.unwrap().is_none());
    assert!(ctx
        .store
        .find_project_with_trashed(project.id)
        .await
        .unwrap()
        .is_some());

    let restored = ctx.state.projects.restore_project(&owner, project.id).await.unwrap();
    assert!(!restored.is_trashed());
}

#[tokio::test]
async fn test_restore_window_expires() {
    let ctx = TestContext::new().await;
    let owner = ctx.user("jellysquid").await;
    let project = ctx.insert_project(&owner, "sodium", ApprovalStatus::Approved).await;

    ctx.store
        .soft_delete_project(project.id, chrono::Utc::now() - chrono::Duration::days(15))
        .await
        .unwrap();

    let result = ctx.state.projects.restore_project(&owner, project.id).await;
    assert!(matches!(result, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn test_unapproved_projects_are_hidden_from_the_public() {
    let ctx = TestContext::new().await;
    let owner = ctx.user("jellysquid").await;
    ctx.insert_project(&owner, "sodium", ApprovalStatus::Draft).await;
    ctx.insert_project(&owner, "lithium", ApprovalStatus::Approved).await;

    assert!(matches!(
        ctx.state.projects.get_project(None, "sodium").await,
        Err(AppError::NotFound)
    ));
    assert!(ctx.state.projects.get_project(Some(&owner), "sodium").await.is_ok());

    let listed = ctx.state.projects.list_public(20, 0).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].slug, "lithium");
}

#[tokio::test]
async fn test_submitting_drafts_respects_pending_limit() {
    let ctx = TestContext::with_config(|config| config.quota.pending_projects_max = Some(1)).await;
    let owner = ctx.user("jellysquid").await;
    let admin = ctx.admin("moderator").await;

    let mut drafts = Vec::new();
    for slug in ["sodium", "lithium", "phosphor"] {
        drafts.push(
            ctx.state
                .projects
                .create_project(&owner, create_request(&ctx, slug))
                .await
                .unwrap(),
        );
    }

    ctx.state
        .approvals
        .submit_for_review(&owner, drafts[0].id)
        .await
        .unwrap();
    let blocked = ctx
        .state
        .approvals
        .submit_for_review(&owner, drafts[1].id)
        .await;
    assert!(matches!(blocked, Err(AppError::QuotaExceeded(msg)) if msg.contains("pending projects")));
    let still_draft = ctx.store.find_project(drafts[1].id).await.unwrap().unwrap();
    assert_eq!(still_draft.approval_status, ApprovalStatus::Draft);

    // Re-submitting the queued project stays a no-op at the limit.
    let queued = ctx
        .state
        .approvals
        .submit_for_review(&owner, drafts[0].id)
        .await
        .unwrap();
    assert_eq!(queued.approval_status, ApprovalStatus::Pending);

    ctx.state.approvals.approve(&admin, drafts[0].id).await.unwrap();
    ctx.state
        .approvals
        .submit_for_review(&owner, drafts[1].id)
        .await
        .unwrap();

    let pending = ctx
        .state
        .quota
        .usage()
        .pending_project_count(owner.id)
        .await
        .unwrap();
    assert_eq!(pending, 1);

    let by_admin = ctx
        .state
        .approvals
        .submit_for_review(&admin, drafts[2].id)
        .await
        .unwrap();
    assert_eq!(by_admin.approval_status, ApprovalStatus::Pending);
}
