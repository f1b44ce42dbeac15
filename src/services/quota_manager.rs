use chrono::{Duration, Utc};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    config::ConfigProvider,
    errors::{AppError, Result},
    models::{Project, QuotaField, QuotaLimitSet, QuotaScope, QuotaStatus, UploadedFile, User},
    repository::Repository,
    services::{
        metrics::MetricsService, quota_resolver::QuotaLayers, quota_usage::QuotaUsageAccumulator,
    },
};

/// Compares current usage against resolved limits. Admins are exempt from every check.
pub struct QuotaManager {
    repo: Arc<dyn Repository>,
    config: Arc<dyn ConfigProvider>,
    usage: QuotaUsageAccumulator,
    metrics: Arc<MetricsService>,
}

impl QuotaManager {
    pub fn new(
        repo: Arc<dyn Repository>,
        config: Arc<dyn ConfigProvider>,
        metrics: Arc<MetricsService>,
    ) -> Self {
        Self {
            usage: QuotaUsageAccumulator::new(repo.clone()),
            repo,
            config,
            metrics,
        }
    }

    pub fn usage(&self) -> &QuotaUsageAccumulator {
        &self.usage
    }

    pub async fn layers(
        &self,
        user_id: Uuid,
        project_type_id: Option<Uuid>,
        project_id: Option<Uuid>,
    ) -> Result<QuotaLayers> {
        let user = self.repo.quota_override(QuotaScope::User(user_id)).await?;
        let project = match project_id {
            Some(id) => self.repo.quota_override(QuotaScope::Project(id)).await?,
            None => None,
        };
        let project_type = match project_type_id {
            Some(id) => self.repo.quota_override(QuotaScope::ProjectType(id)).await?,
            None => None,
        };

        Ok(QuotaLayers {
            user,
            project,
            project_type,
            defaults: self.config.quota_defaults(),
        })
    }

    /// Effective limits for `user`, optionally scoped to a project type and project.
    /// When only the project is given its own type is used.
    pub async fn resolve_limits(
        &self,
        user: &User,
        project_type_id: Option<Uuid>,
        project: Option<&Project>,
    ) -> Result<QuotaLimitSet> {
        let project_type_id = project_type_id.or(project.map(|p| p.project_type_id));
        let layers = self
            .layers(user.id, project_type_id, project.map(|p| p.id))
            .await?;
        Ok(layers.resolve())
    }

    pub async fn can_create_project(&self, user: &User) -> Result<bool> {
        Ok(self.pending_projects_violation(user).await?.is_none())
    }

    pub async fn validate_project_creation(&self, user: &User) -> Result<()> {
        match self.pending_projects_violation(user).await? {
            Some(violation) => Err(self.reject(violation)),
            None => Ok(()),
        }
    }

    pub async fn validate_storage_quota(&self, user: &User, additional_bytes: i64) -> Result<()> {
        match self.storage_violation(user, additional_bytes).await? {
            Some(violation) => Err(self.reject(violation)),
            None => Ok(()),
        }
    }

    /// Advisory check for warning banners: the first limit the user has reached, if any.
    pub async fn check_quota_breach(&self, user: &User) -> Result<Option<String>> {
        if user.is_admin() {
            return Ok(None);
        }

        let limits = self.resolve_limits(user, None, None).await?;

        if let Some(max) = limits.pending_projects_max {
            let pending = self.usage.pending_project_count(user.id).await?;
            if pending >= max {
                return Ok(Some(format!(
                    "You have reached the maximum of {} pending projects. Wait for a review before submitting more.",
                    max
                )));
            }
        }

        if let Some(max) = limits.total_storage_max {
            let used = self.usage.total_storage_used(user.id).await?;
            if used >= max {
                return Ok(Some(format!(
                    "You have used {} of your {} bytes storage quota.",
                    used, max
                )));
            }
        }

        Ok(None)
    }

    /// Every limit a new version upload would break. The quota subject is the
    /// project's primary owner; uploads are exempt when either the uploader or
    /// the owner is an admin.
    pub async fn check_version_upload(
        &self,
        actor: &User,
        project: &Project,
        files: &[UploadedFile],
    ) -> Result<QuotaCheckResult> {
        let owner = match self.repo.primary_owner(project.id).await? {
            Some(owner_id) if owner_id != actor.id => self.repo.find_user(owner_id).await?,
            _ => None,
        };
        let owner = owner.as_ref().unwrap_or(actor);

        if actor.is_admin() || owner.is_admin() {
            return Ok(QuotaCheckResult::allowed());
        }

        let limits = self.resolve_limits(owner, None, Some(project)).await?;
        let upload_size: i64 = files.iter().map(UploadedFile::size).sum();
        let mut violations = Vec::new();

        if let Some(max) = limits.versions_per_day_max {
            let since = Utc::now() - Duration::hours(24);
            let recent = self.repo.count_versions_since(project.id, since).await?;
            if recent >= max {
                violations.push(QuotaViolation {
                    field: QuotaField::VersionsPerDayMax,
                    current_value: recent,
                    limit_value: max,
                    message: format!(
                        "Daily version limit of {} reached for this project (current: {})",
                        max, recent
                    ),
                });
            }
        }

        if let Some(max) = limits.files_per_version_max {
            let count = files.len() as i64;
            if count > max {
                violations.push(QuotaViolation {
                    field: QuotaField::FilesPerVersionMax,
                    current_value: count,
                    limit_value: max,
                    message: format!("A version may contain at most {} files (got {})", max, count),
                });
            }
        }

        if let Some(max) = limits.file_size_max {
            if let Some(file) = files.iter().find(|f| f.size() > max) {
                violations.push(QuotaViolation {
                    field: QuotaField::FileSizeMax,
                    current_value: file.size(),
                    limit_value: max,
                    message: format!(
                        "File {} is {} bytes which exceeds the limit of {} bytes",
                        file.file_name,
                        file.size(),
                        max
                    ),
                });
            }
        }

        if let Some(max) = limits.version_size_max {
            if upload_size > max {
                violations.push(QuotaViolation {
                    field: QuotaField::VersionSizeMax,
                    current_value: upload_size,
                    limit_value: max,
                    message: format!(
                        "Version size of {} bytes exceeds the limit of {} bytes",
                        upload_size, max
                    ),
                });
            }
        }

        if let Some(max) = limits.project_storage_max {
            let used = self.usage.project_storage_used(project.id).await?;
            if used + upload_size > max {
                violations.push(QuotaViolation {
                    field: QuotaField::ProjectStorageMax,
                    current_value: used + upload_size,
                    limit_value: max,
                    message: format!(
                        "Project storage limit of {} bytes would be exceeded (current: {} + upload: {} = {})",
                        max,
                        used,
                        upload_size,
                        used + upload_size
                    ),
                });
            }
        }

        if let Some(violation) = self.storage_violation_with(owner, &limits, upload_size).await? {
            violations.push(violation);
        }

        Ok(QuotaCheckResult {
            allowed: violations.is_empty(),
            violations,
        })
    }

    pub async fn validate_version_upload(
        &self,
        actor: &User,
        project: &Project,
        files: &[UploadedFile],
    ) -> Result<()> {
        let result = self.check_version_upload(actor, project, files).await?;
        match result.violations.into_iter().next() {
            Some(violation) => Err(self.reject(violation)),
            None => Ok(()),
        }
    }

    pub async fn quota_status(&self, user: &User) -> Result<QuotaStatus> {
        let layers = self.layers(user.id, None, None).await?;
        let usage = self.usage.snapshot(user.id).await?;
        let breach = self.check_quota_breach(user).await?;

        Ok(QuotaStatus {
            limits: layers.explain(),
            usage,
            breach,
            checked_at: Utc::now(),
        })
    }

    pub async fn get_override(&self, admin: &User, scope: QuotaScope) -> Result<Option<QuotaLimitSet>> {
        Self::ensure_admin(admin)?;
        self.ensure_scope_exists(scope).await?;
        self.repo.quota_override(scope).await
    }

    /// Replaces the override row for `scope`. An all-empty set removes the row.
    pub async fn set_override(&self, admin: &User, scope: QuotaScope, limits: QuotaLimitSet) -> Result<()> {
        Self::ensure_admin(admin)?;
        if let Some(field) = QuotaField::ALL
            .into_iter()
            .find(|field| limits.get(*field).is_some_and(|value| value < 0))
        {
            return Err(AppError::Validation(format!("{} must not be negative", field)));
        }
        self.ensure_scope_exists(scope).await?;

        if limits.is_empty() {
            self.repo.clear_quota_override(scope).await?;
        } else {
            self.repo.set_quota_override(scope, &limits).await?;
        }
        tracing::info!(
            scope = ?scope.kind(),
            scope_id = %scope.id(),
            admin = %admin.id,
            "quota override updated"
        );
        Ok(())
    }

    pub async fn clear_override(&self, admin: &User, scope: QuotaScope) -> Result<bool> {
        Self::ensure_admin(admin)?;
        let removed = self.repo.clear_quota_override(scope).await?;
        if removed {
            tracing::info!(scope = ?scope.kind(), scope_id = %scope.id(), "quota override cleared");
        }
        Ok(removed)
    }

    fn ensure_admin(user: &User) -> Result<()> {
        if !user.is_admin() {
            return Err(AppError::Forbidden);
        }
        Ok(())
    }

    async fn ensure_scope_exists(&self, scope: QuotaScope) -> Result<()> {
        let exists = match scope {
            QuotaScope::User(id) => self.repo.find_user(id).await?.is_some(),
            QuotaScope::Project(id) => self.repo.find_project_with_trashed(id).await?.is_some(),
            QuotaScope::ProjectType(id) => self.repo.find_project_type(id).await?.is_some(),
        };
        if !exists {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    async fn pending_projects_violation(&self, user: &User) -> Result<Option<QuotaViolation>> {
        if user.is_admin() {
            return Ok(None);
        }

        let limits = self.resolve_limits(user, None, None).await?;
        let Some(max) = limits.pending_projects_max else {
            return Ok(None);
        };

        let pending = self.usage.pending_project_count(user.id).await?;
        if pending < max {
            return Ok(None);
        }

        Ok(Some(QuotaViolation {
            field: QuotaField::PendingProjectsMax,
            current_value: pending,
            limit_value: max,
            message: format!(
                "You have reached the maximum of {} pending projects (current: {})",
                max, pending
            ),
        }))
    }

    async fn storage_violation(
        &self,
        user: &User,
        additional_bytes: i64,
    ) -> Result<Option<QuotaViolation>> {
        if user.is_admin() {
            return Ok(None);
        }
        let limits = self.resolve_limits(user, None, None).await?;
        self.storage_violation_with(user, &limits, additional_bytes)
            .await
    }

    async fn storage_violation_with(
        &self,
        user: &User,
        limits: &QuotaLimitSet,
        additional_bytes: i64,
    ) -> Result<Option<QuotaViolation>> {
        let Some(max) = limits.total_storage_max else {
            return Ok(None);
        };

        let used = self.usage.total_storage_used(user.id).await?;
        if used + additional_bytes <= max {
            return Ok(None);
        }

        Ok(Some(QuotaViolation {
            field: QuotaField::TotalStorageMax,
            current_value: used + additional_bytes,
            limit_value: max,
            message: format!(
                "Storage limit of {} bytes would be exceeded (current: {} + new: {} = {})",
                max,
                used,
                additional_bytes,
                used + additional_bytes
            ),
        }))
    }

    fn reject(&self, violation: QuotaViolation) -> AppError {
        self.metrics.record_quota_rejection(violation.field.as_str());
        tracing::info!(
            limit = %violation.field,
            current = violation.current_value,
            max = violation.limit_value,
            "quota check failed"
        );
        AppError::QuotaExceeded(violation.message)
    }
}

#[derive(Debug)]
pub struct QuotaCheckResult {
    pub allowed: bool,
    pub violations: Vec<QuotaViolation>,
}

impl QuotaCheckResult {
    fn allowed() -> Self {
        Self {
            allowed: true,
            violations: Vec::new(),
        }
    }
}

#[derive(Debug)]
pub struct QuotaViolation {
    pub field: QuotaField,
    pub current_value: i64,
    pub limit_value: i64,
    pub message: String,
}
