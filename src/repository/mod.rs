use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::errors::Result;
use crate::models::{
    ApprovalStatus, Dependency, DependentVersion, NewUser, Project, ProjectFile, ProjectType,
    ProjectVersion, QuotaLimitSet, QuotaScope, User,
};

pub mod memory;

pub use memory::MemoryStore;

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_user(&self, id: Uuid) -> Result<Option<User>>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>>;

    async fn create_user(&self, new_user: NewUser) -> Result<User>;

    async fn update_user(&self, user: &User) -> Result<User>;
}

#[async_trait]
pub trait ProjectRepository: Send + Sync {
    async fn find_project_type(&self, id: Uuid) -> Result<Option<ProjectType>>;

    async fn list_project_types(&self) -> Result<Vec<ProjectType>>;

    async fn create_project_type(&self, slug: &str, name: &str) -> Result<ProjectType>;

    /// Active projects only.
    async fn find_project(&self, id: Uuid) -> Result<Option<Project>>;

    /// Includes soft-deleted projects.
    async fn find_project_with_trashed(&self, id: Uuid) -> Result<Option<Project>>;

    async fn find_project_by_slug(&self, slug: &str) -> Result<Option<Project>>;

    async fn list_projects_by_status(
        &self,
        status: ApprovalStatus,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Project>>;

    /// Inserts the project and its primary owner membership together.
    async fn create_project(&self, project: &Project, owner_id: Uuid) -> Result<Project>;

    async fn update_project(&self, project: &Project) -> Result<Project>;

    async fn soft_delete_project(&self, id: Uuid, deleted_at: DateTime<Utc>) -> Result<()>;

    async fn restore_project(&self, id: Uuid) -> Result<()>;

    async fn primary_owner(&self, project_id: Uuid) -> Result<Option<Uuid>>;

    async fn is_member(&self, project_id: Uuid, user_id: Uuid) -> Result<bool>;

    /// Counts active projects the user is primary owner of.
    async fn count_projects_by_owner_and_status(
        &self,
        owner_id: Uuid,
        status: ApprovalStatus,
    ) -> Result<i64>;
}

#[async_trait]
pub trait VersionRepository: Send + Sync {
    async fn find_version(&self, id: Uuid) -> Result<Option<ProjectVersion>>;

    async fn find_version_by_number(
        &self,
        project_id: Uuid,
        version_number: &str,
    ) -> Result<Option<ProjectVersion>>;

    async fn list_versions(&self, project_id: Uuid) -> Result<Vec<ProjectVersion>>;

    async fn list_files(&self, version_id: Uuid) -> Result<Vec<ProjectFile>>;

    async fn list_dependencies(&self, version_id: Uuid) -> Result<Vec<Dependency>>;

    async fn count_versions_since(&self, project_id: Uuid, since: DateTime<Utc>) -> Result<i64>;

    /// Sum of file sizes across every active project the user is primary owner of.
    async fn storage_used_by_owner(&self, owner_id: Uuid) -> Result<i64>;

    async fn storage_used_by_project(&self, project_id: Uuid) -> Result<i64>;

    /// Inserts the version, its files and its dependency rows atomically.
    async fn create_version(
        &self,
        version: &ProjectVersion,
        files: &[ProjectFile],
        dependencies: &[Dependency],
    ) -> Result<ProjectVersion>;

    /// Versions (other than `version_id` itself) pinning a dependency on `version_id`.
    async fn dependents_of_version(&self, version_id: Uuid) -> Result<Vec<DependentVersion>>;

    /// Removes the version with its files and every dependency row declared by
    /// or pointing at it, atomically. Returns the removed file rows.
    async fn delete_version(&self, version_id: Uuid) -> Result<Vec<ProjectFile>>;
}

#[async_trait]
pub trait QuotaOverrideRepository: Send + Sync {
    async fn quota_override(&self, scope: QuotaScope) -> Result<Option<QuotaLimitSet>>;

    async fn set_quota_override(&self, scope: QuotaScope, limits: &QuotaLimitSet) -> Result<()>;

    async fn clear_quota_override(&self, scope: QuotaScope) -> Result<bool>;
}

/// Everything the services need from persistence.
pub trait Repository:
    UserRepository + ProjectRepository + VersionRepository + QuotaOverrideRepository
{
}

impl<T> Repository for T where
    T: UserRepository + ProjectRepository + VersionRepository + QuotaOverrideRepository
{
}
