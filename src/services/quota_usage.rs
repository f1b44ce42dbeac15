use std::sync::Arc;
use uuid::Uuid;

use crate::{
    errors::Result,
    models::{ApprovalStatus, QuotaUsage},
    repository::Repository,
};

/// Read-only aggregation of what a user or project currently consumes.
pub struct QuotaUsageAccumulator {
    repo: Arc<dyn Repository>,
}

impl QuotaUsageAccumulator {
    pub fn new(repo: Arc<dyn Repository>) -> Self {
        Self { repo }
    }

    pub async fn pending_project_count(&self, user_id: Uuid) -> Result<i64> {
        self.repo
            .count_projects_by_owner_and_status(user_id, ApprovalStatus::Pending)
            .await
    }

    pub async fn total_storage_used(&self, user_id: Uuid) -> Result<i64> {
        self.repo.storage_used_by_owner(user_id).await
    }

    pub async fn project_storage_used(&self, project_id: Uuid) -> Result<i64> {
        self.repo.storage_used_by_project(project_id).await
    }

    pub async fn snapshot(&self, user_id: Uuid) -> Result<QuotaUsage> {
        let (pending_projects, storage_used) = futures::try_join!(
            self.pending_project_count(user_id),
            self.total_storage_used(user_id)
        )?;

        Ok(QuotaUsage {
            pending_projects,
            storage_used,
        })
    }
}
