//! Project review lifecycle.
//!
//! ```text
//! draft ──submit──▶ pending ──approve──▶ approved
//!   ▲                 │
//!   │               reject
//!   │                 ▼
//!   └──────────── rejected ──submit──▶ pending
//! ```

use chrono::{DateTime, Utc};
use serde_json::json;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    errors::{AppError, Result},
    models::{ApprovalStatus, Notification, NotificationKind, Project, User},
    repository::Repository,
    services::{
        metrics::MetricsService, notifications::NotificationSink, quota_manager::QuotaManager,
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovalAction {
    Submit,
    Approve,
    Reject,
}

impl fmt::Display for ApprovalAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ApprovalAction::Submit => "submit for review",
            ApprovalAction::Approve => "approve",
            ApprovalAction::Reject => "reject",
        };
        f.write_str(s)
    }
}

/// Status a freshly created project starts in.
pub fn initial_status(auto_approve: bool) -> ApprovalStatus {
    if auto_approve {
        ApprovalStatus::Approved
    } else {
        ApprovalStatus::Draft
    }
}

/// The allowed transition table; `None` means the action is not valid from `from`.
pub fn next_status(from: ApprovalStatus, action: ApprovalAction) -> Option<ApprovalStatus> {
    match (from, action) {
        (ApprovalStatus::Draft | ApprovalStatus::Rejected, ApprovalAction::Submit) => {
            Some(ApprovalStatus::Pending)
        }
        (ApprovalStatus::Pending, ApprovalAction::Approve) => Some(ApprovalStatus::Approved),
        (ApprovalStatus::Pending, ApprovalAction::Reject) => Some(ApprovalStatus::Rejected),
        _ => None,
    }
}

/// Moves the project into review. Returns `false` and leaves the project untouched
/// when it is not in a submittable state.
pub fn submit(project: &mut Project, now: DateTime<Utc>) -> bool {
    let Some(next) = next_status(project.approval_status, ApprovalAction::Submit) else {
        return false;
    };
    project.approval_status = next;
    project.submitted_at = Some(now);
    project.rejection_reason = None;
    true
}

pub fn approve(project: &mut Project, reviewer_id: Uuid, now: DateTime<Utc>) -> Result<()> {
    let next = require_transition(project.approval_status, ApprovalAction::Approve)?;
    project.approval_status = next;
    project.reviewed_by = Some(reviewer_id);
    project.reviewed_at = Some(now);
    project.rejection_reason = None;
    Ok(())
}

pub fn reject(
    project: &mut Project,
    reviewer_id: Uuid,
    reason: &str,
    now: DateTime<Utc>,
) -> Result<()> {
    let reason = reason.trim();
    if reason.is_empty() {
        return Err(AppError::Validation(
            "A rejection reason is required".to_string(),
        ));
    }
    let next = require_transition(project.approval_status, ApprovalAction::Reject)?;
    project.approval_status = next;
    project.reviewed_by = Some(reviewer_id);
    project.reviewed_at = Some(now);
    project.rejection_reason = Some(reason.to_string());
    Ok(())
}

/// Metadata edits are refused while a project sits in the review queue.
pub fn ensure_editable(project: &Project) -> Result<()> {
    if project.approval_status == ApprovalStatus::Pending {
        return Err(AppError::ProjectLocked);
    }
    Ok(())
}

fn require_transition(from: ApprovalStatus, action: ApprovalAction) -> Result<ApprovalStatus> {
    next_status(from, action).ok_or(AppError::InvalidStateTransition { from, action })
}

pub struct ApprovalService {
    repo: Arc<dyn Repository>,
    quota: Arc<QuotaManager>,
    notifications: Arc<dyn NotificationSink>,
    metrics: Arc<MetricsService>,
}

impl ApprovalService {
    pub fn new(
        repo: Arc<dyn Repository>,
        quota: Arc<QuotaManager>,
        notifications: Arc<dyn NotificationSink>,
        metrics: Arc<MetricsService>,
    ) -> Self {
        Self {
            repo,
            quota,
            notifications,
            metrics,
        }
    }

    /// Entering the queue counts against the submitter's pending project limit.
    pub async fn submit_for_review(&self, actor: &User, project_id: Uuid) -> Result<Project> {
        let mut project = self.load(project_id).await?;
        self.ensure_owner_or_admin(actor, &project).await?;

        if next_status(project.approval_status, ApprovalAction::Submit).is_some() {
            self.quota.validate_project_creation(actor).await?;
        }

        if !submit(&mut project, Utc::now()) {
            tracing::debug!(
                project_id = %project.id,
                status = %project.approval_status,
                "submit for review ignored"
            );
            return Ok(project);
        }

        let project = self.repo.update_project(&project).await?;
        tracing::info!(project_id = %project.id, "project submitted for review");
        Ok(project)
    }

    pub async fn approve(&self, reviewer: &User, project_id: Uuid) -> Result<Project> {
        Self::ensure_admin(reviewer)?;
        let mut project = self.load(project_id).await?;

        approve(&mut project, reviewer.id, Utc::now())?;
        let project = self.repo.update_project(&project).await?;

        self.metrics.record_review_decision("approved");
        tracing::info!(project_id = %project.id, reviewer = %reviewer.id, "project approved");
        self.notify_owner(&project, NotificationKind::ProjectApproved).await;
        Ok(project)
    }

    pub async fn reject(&self, reviewer: &User, project_id: Uuid, reason: &str) -> Result<Project> {
        Self::ensure_admin(reviewer)?;
        let mut project = self.load(project_id).await?;

        reject(&mut project, reviewer.id, reason, Utc::now())?;
        let project = self.repo.update_project(&project).await?;

        self.metrics.record_review_decision("rejected");
        tracing::info!(project_id = %project.id, reviewer = %reviewer.id, "project rejected");
        self.notify_owner(&project, NotificationKind::ProjectRejected).await;
        Ok(project)
    }

    pub async fn pending_queue(&self, reviewer: &User, limit: i64, offset: i64) -> Result<Vec<Project>> {
        Self::ensure_admin(reviewer)?;
        self.repo
            .list_projects_by_status(ApprovalStatus::Pending, limit, offset)
            .await
    }

    async fn load(&self, project_id: Uuid) -> Result<Project> {
        self.repo
            .find_project(project_id)
            .await?
            .ok_or(AppError::NotFound)
    }

    fn ensure_admin(user: &User) -> Result<()> {
        if !user.is_admin() {
            return Err(AppError::Forbidden);
        }
        Ok(())
    }

    async fn ensure_owner_or_admin(&self, actor: &User, project: &Project) -> Result<()> {
        if actor.is_admin() || self.repo.primary_owner(project.id).await? == Some(actor.id) {
            return Ok(());
        }
        Err(AppError::Forbidden)
    }

    async fn notify_owner(&self, project: &Project, kind: NotificationKind) {
        let owner = match self.repo.primary_owner(project.id).await {
            Ok(Some(owner)) => owner,
            Ok(None) => return,
            Err(e) => {
                tracing::warn!(project_id = %project.id, "failed to look up project owner: {}", e);
                return;
            }
        };

        let notification = Notification::new(
            owner,
            kind,
            json!({
                "project_id": project.id,
                "project_slug": project.slug,
                "project_name": project.name,
                "rejection_reason": project.rejection_reason,
            }),
        );
        match self.notifications.enqueue(notification).await {
            Ok(()) => self.metrics.record_notification(kind_label(kind)),
            Err(e) => tracing::warn!(project_id = %project.id, "failed to enqueue notification: {}", e),
        }
    }
}

pub(crate) fn kind_label(kind: NotificationKind) -> &'static str {
    match kind {
        NotificationKind::DependencyVersionDeleted => "dependency_version_deleted",
        NotificationKind::ProjectApproved => "project_approved",
        NotificationKind::ProjectRejected => "project_rejected",
        NotificationKind::EmailChangeRequested => "email_change_requested",
    }
}
