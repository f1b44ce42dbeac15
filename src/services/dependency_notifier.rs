use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    errors::Result,
    models::{DependentVersion, Notification, NotificationKind, Project, ProjectVersion},
    repository::Repository,
    services::{approval::kind_label, metrics::MetricsService, notifications::NotificationSink},
};

/// Tells owners of dependent versions that a version they pinned is gone.
///
/// Only links to the specific version count; links to the project as a whole
/// still resolve after the deletion. Every dependent version produces its own
/// notification, so an owner with two broken dependents gets two.
pub struct DependencyNotifier {
    repo: Arc<dyn Repository>,
    notifications: Arc<dyn NotificationSink>,
    metrics: Arc<MetricsService>,
}

impl DependencyNotifier {
    pub fn new(
        repo: Arc<dyn Repository>,
        notifications: Arc<dyn NotificationSink>,
        metrics: Arc<MetricsService>,
    ) -> Self {
        Self {
            repo,
            notifications,
            metrics,
        }
    }

    /// Must run before the version's rows are removed.
    pub async fn collect(&self, version_id: Uuid) -> Result<Vec<DependentVersion>> {
        self.repo.dependents_of_version(version_id).await
    }

    /// Enqueues one notification per dependent version and returns how many
    /// were accepted by the sink.
    pub async fn dispatch(
        &self,
        deleted: &ProjectVersion,
        project: &Project,
        dependents: Vec<DependentVersion>,
    ) -> usize {
        let mut sent = 0;

        for (owner_id, versions) in group_by_owner(dependents) {
            for dependent in versions {
                let notification = Notification::new(
                    owner_id,
                    NotificationKind::DependencyVersionDeleted,
                    json!({
                        "deleted_project_id": project.id,
                        "deleted_project_slug": project.slug,
                        "deleted_project_name": project.name,
                        "deleted_version_id": deleted.id,
                        "deleted_version_number": deleted.version_number,
                        "dependent_project_id": dependent.project_id,
                        "dependent_project_slug": dependent.project_slug,
                        "dependent_project_name": dependent.project_name,
                        "dependent_version_id": dependent.version_id,
                        "dependent_version_number": dependent.version_number,
                    }),
                );

                match self.notifications.enqueue(notification).await {
                    Ok(()) => {
                        sent += 1;
                        self.metrics
                            .record_notification(kind_label(NotificationKind::DependencyVersionDeleted));
                    }
                    Err(e) => tracing::warn!(
                        owner = %owner_id,
                        dependent_version = %dependent.version_id,
                        "failed to enqueue dependency notification: {}",
                        e
                    ),
                }
            }
        }

        if sent > 0 {
            tracing::info!(
                version_id = %deleted.id,
                notified = sent,
                "dependency owners notified of deleted version"
            );
        }
        sent
    }
}

/// Buckets dependents by the primary owner of their project. Dependents whose
/// project has no owner are dropped.
pub fn group_by_owner(dependents: Vec<DependentVersion>) -> BTreeMap<Uuid, Vec<DependentVersion>> {
    let mut grouped: BTreeMap<Uuid, Vec<DependentVersion>> = BTreeMap::new();
    for dependent in dependents {
        match dependent.owner_id {
            Some(owner_id) => grouped.entry(owner_id).or_default().push(dependent),
            None => tracing::warn!(
                project_id = %dependent.project_id,
                "dependent project has no primary owner, skipping notification"
            ),
        }
    }
    grouped
}
