use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    config::ConfigProvider,
    errors::{AppError, Result},
    models::{
        ApprovalStatus, CreateProjectRequest, Project, ProjectType, UpdateProjectRequest, User,
    },
    repository::Repository,
    services::{approval, metrics::MetricsService, quota_manager::QuotaManager},
};

const MAX_NAME_LENGTH: usize = 128;
const MAX_SUMMARY_LENGTH: usize = 256;

pub struct ProjectService {
    repo: Arc<dyn Repository>,
    config: Arc<dyn ConfigProvider>,
    quota: Arc<QuotaManager>,
    metrics: Arc<MetricsService>,
}

impl ProjectService {
    pub fn new(
        repo: Arc<dyn Repository>,
        config: Arc<dyn ConfigProvider>,
        quota: Arc<QuotaManager>,
        metrics: Arc<MetricsService>,
    ) -> Self {
        Self {
            repo,
            config,
            quota,
            metrics,
        }
    }

    pub async fn create_project(&self, owner: &User, request: CreateProjectRequest) -> Result<Project> {
        validate_slug(&request.slug)?;
        validate_text("name", &request.name, MAX_NAME_LENGTH)?;
        validate_text("summary", &request.summary, MAX_SUMMARY_LENGTH)?;

        if self
            .repo
            .find_project_type(request.project_type_id)
            .await?
            .is_none()
        {
            return Err(AppError::Validation("Unknown project type".to_string()));
        }

        if self.repo.find_project_by_slug(&request.slug).await?.is_some() {
            return Err(AppError::Validation(format!(
                "Slug '{}' is already taken",
                request.slug
            )));
        }

        self.quota.validate_project_creation(owner).await?;

        let now = Utc::now();
        let status = approval::initial_status(self.config.auto_approve());
        let stamped = (status == ApprovalStatus::Approved).then_some(now);
        let project = Project {
            id: Uuid::new_v4(),
            project_type_id: request.project_type_id,
            slug: request.slug,
            name: request.name.trim().to_string(),
            summary: request.summary.trim().to_string(),
            description: request.description,
            approval_status: status,
            submitted_at: stamped,
            reviewed_at: stamped,
            reviewed_by: None,
            rejection_reason: None,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };

        let project = self.repo.create_project(&project, owner.id).await?;
        self.metrics.record_project_created();
        tracing::info!(
            project_id = %project.id,
            slug = %project.slug,
            owner = %owner.id,
            status = %project.approval_status,
            "project created"
        );
        Ok(project)
    }

    pub async fn update_project(
        &self,
        actor: &User,
        project_id: Uuid,
        request: UpdateProjectRequest,
    ) -> Result<Project> {
        let mut project = self.load(project_id).await?;
        self.ensure_owner(actor, &project).await?;
        approval::ensure_editable(&project)?;

        if let Some(name) = request.name {
            validate_text("name", &name, MAX_NAME_LENGTH)?;
            project.name = name.trim().to_string();
        }
        if let Some(summary) = request.summary {
            validate_text("summary", &summary, MAX_SUMMARY_LENGTH)?;
            project.summary = summary.trim().to_string();
        }
        if let Some(description) = request.description {
            project.description = description;
        }

        self.repo.update_project(&project).await
    }

    pub async fn delete_project(&self, actor: &User, project_id: Uuid) -> Result<()> {
        let project = self.load(project_id).await?;
        self.ensure_owner(actor, &project).await?;

        self.repo.soft_delete_project(project.id, Utc::now()).await?;
        tracing::info!(project_id = %project.id, actor = %actor.id, "project moved to trash");
        Ok(())
    }

    /// Brings a trashed project back while it is still inside the restore window.
    pub async fn restore_project(&self, actor: &User, project_id: Uuid) -> Result<Project> {
        let project = self
            .repo
            .find_project_with_trashed(project_id)
            .await?
            .ok_or(AppError::NotFound)?;
        self.ensure_owner(actor, &project).await?;

        let Some(deleted_at) = project.deleted_at else {
            return Err(AppError::Validation("Project is not deleted".to_string()));
        };
        if Utc::now() - deleted_at > self.config.restore_window() {
            return Err(AppError::Validation(
                "The restore window for this project has expired".to_string(),
            ));
        }
        if self.repo.find_project_by_slug(&project.slug).await?.is_some() {
            return Err(AppError::Validation(format!(
                "Slug '{}' has been taken by another project",
                project.slug
            )));
        }

        self.repo.restore_project(project.id).await?;
        tracing::info!(project_id = %project.id, actor = %actor.id, "project restored");
        self.load(project.id).await
    }

    /// Approved projects are visible to everyone; other states only to members and admins.
    pub async fn get_project(&self, viewer: Option<&User>, slug: &str) -> Result<Project> {
        let project = self
            .repo
            .find_project_by_slug(slug)
            .await?
            .ok_or(AppError::NotFound)?;

        if project.approval_status == ApprovalStatus::Approved {
            return Ok(project);
        }
        match viewer {
            Some(user) if self.is_member_or_admin(user, &project).await? => Ok(project),
            _ => Err(AppError::NotFound),
        }
    }

    pub async fn list_public(&self, limit: i64, offset: i64) -> Result<Vec<Project>> {
        self.repo
            .list_projects_by_status(ApprovalStatus::Approved, limit.clamp(1, 100), offset.max(0))
            .await
    }

    pub async fn list_project_types(&self) -> Result<Vec<ProjectType>> {
        self.repo.list_project_types().await
    }

    pub async fn create_project_type(&self, admin: &User, slug: &str, name: &str) -> Result<ProjectType> {
        if !admin.is_admin() {
            return Err(AppError::Forbidden);
        }
        validate_slug(slug)?;
        validate_text("type name", name, MAX_NAME_LENGTH)?;

        let existing = self.repo.list_project_types().await?;
        if existing.iter().any(|t| t.slug == slug) {
            return Err(AppError::Validation(format!(
                "Project type '{}' already exists",
                slug
            )));
        }
        self.repo.create_project_type(slug, name.trim()).await
    }

    pub async fn ensure_member(&self, actor: &User, project: &Project) -> Result<()> {
        if self.is_member_or_admin(actor, project).await? {
            return Ok(());
        }
        Err(AppError::Forbidden)
    }

    async fn ensure_owner(&self, actor: &User, project: &Project) -> Result<()> {
        if actor.is_admin() || self.repo.primary_owner(project.id).await? == Some(actor.id) {
            return Ok(());
        }
        Err(AppError::Forbidden)
    }

    async fn is_member_or_admin(&self, user: &User, project: &Project) -> Result<bool> {
        Ok(user.is_admin() || self.repo.is_member(project.id, user.id).await?)
    }

    async fn load(&self, project_id: Uuid) -> Result<Project> {
        self.repo
            .find_project(project_id)
            .await?
            .ok_or(AppError::NotFound)
    }
}

pub fn validate_slug(slug: &str) -> Result<()> {
    let valid_chars = slug
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    if !(3..=64).contains(&slug.len()) || !valid_chars {
        return Err(AppError::Validation(
            "Slug must be 3-64 characters of lowercase letters, digits and hyphens".to_string(),
        ));
    }
    Ok(())
}

fn validate_text(field: &str, value: &str, max: usize) -> Result<()> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::Validation(format!("Project {} is required", field)));
    }
    if value.chars().count() > max {
        return Err(AppError::Validation(format!(
            "Project {} must be at most {} characters",
            field, max
        )));
    }
    Ok(())
}
