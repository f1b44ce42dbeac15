use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::queries::{ProjectQueries, QuotaQueries, UserQueries, VersionQueries};
use super::Database;
use crate::errors::Result;
use crate::models::{
    ApprovalStatus, Dependency, DependentVersion, NewUser, Project, ProjectFile, ProjectType,
    ProjectVersion, QuotaLimitSet, QuotaScope, User,
};
use crate::repository::{
    ProjectRepository, QuotaOverrideRepository, UserRepository, VersionRepository,
};

#[async_trait]
impl UserRepository for Database {
    async fn find_user(&self, id: Uuid) -> Result<Option<User>> {
        UserQueries::find_by_id(self.pool(), id).await
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        UserQueries::find_by_email(self.pool(), email).await
    }

    async fn create_user(&self, new_user: NewUser) -> Result<User> {
        UserQueries::create_user(self.pool(), &new_user).await
    }

    async fn update_user(&self, user: &User) -> Result<User> {
        UserQueries::update(self.pool(), user).await
    }
}

#[async_trait]
impl ProjectRepository for Database {
    async fn find_project_type(&self, id: Uuid) -> Result<Option<ProjectType>> {
        ProjectQueries::find_type(self.pool(), id).await
    }

    async fn list_project_types(&self) -> Result<Vec<ProjectType>> {
        ProjectQueries::list_types(self.pool()).await
    }

    async fn create_project_type(&self, slug: &str, name: &str) -> Result<ProjectType> {
        ProjectQueries::create_type(self.pool(), slug, name).await
    }

    async fn find_project(&self, id: Uuid) -> Result<Option<Project>> {
        ProjectQueries::find_by_id(self.pool(), id, false).await
    }

    async fn find_project_with_trashed(&self, id: Uuid) -> Result<Option<Project>> {
        ProjectQueries::find_by_id(self.pool(), id, true).await
    }

    async fn find_project_by_slug(&self, slug: &str) -> Result<Option<Project>> {
        ProjectQueries::find_by_slug(self.pool(), slug).await
    }

    async fn list_projects_by_status(
        &self,
        status: ApprovalStatus,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Project>> {
        ProjectQueries::list_by_status(self.pool(), status, limit, offset).await
    }

    async fn create_project(&self, project: &Project, owner_id: Uuid) -> Result<Project> {
        ProjectQueries::create(self.pool(), project, owner_id).await
    }

    async fn update_project(&self, project: &Project) -> Result<Project> {
        ProjectQueries::update(self.pool(), project).await
    }

    async fn soft_delete_project(&self, id: Uuid, deleted_at: DateTime<Utc>) -> Result<()> {
        ProjectQueries::set_deleted_at(self.pool(), id, Some(deleted_at)).await
    }

    async fn restore_project(&self, id: Uuid) -> Result<()> {
        ProjectQueries::set_deleted_at(self.pool(), id, None).await
    }

    async fn primary_owner(&self, project_id: Uuid) -> Result<Option<Uuid>> {
        ProjectQueries::primary_owner(self.pool(), project_id).await
    }

    async fn is_member(&self, project_id: Uuid, user_id: Uuid) -> Result<bool> {
        ProjectQueries::is_member(self.pool(), project_id, user_id).await
    }

    async fn count_projects_by_owner_and_status(
        &self,
        owner_id: Uuid,
        status: ApprovalStatus,
    ) -> Result<i64> {
        ProjectQueries::count_by_owner_and_status(self.pool(), owner_id, status).await
    }
}

#[async_trait]
impl VersionRepository for Database {
    async fn find_version(&self, id: Uuid) -> Result<Option<ProjectVersion>> {
        VersionQueries::find_by_id(self.pool(), id).await
    }

    async fn find_version_by_number(
        &self,
        project_id: Uuid,
        version_number: &str,
    ) -> Result<Option<ProjectVersion>> {
        VersionQueries::find_by_number(self.pool(), project_id, version_number).await
    }

    async fn list_versions(&self, project_id: Uuid) -> Result<Vec<ProjectVersion>> {
        VersionQueries::list_by_project(self.pool(), project_id).await
    }

    async fn list_files(&self, version_id: Uuid) -> Result<Vec<ProjectFile>> {
        VersionQueries::list_files(self.pool(), version_id).await
    }

    async fn list_dependencies(&self, version_id: Uuid) -> Result<Vec<Dependency>> {
        VersionQueries::list_dependencies(self.pool(), version_id).await
    }

    async fn count_versions_since(&self, project_id: Uuid, since: DateTime<Utc>) -> Result<i64> {
        VersionQueries::count_since(self.pool(), project_id, since).await
    }

    async fn storage_used_by_owner(&self, owner_id: Uuid) -> Result<i64> {
        VersionQueries::storage_used_by_owner(self.pool(), owner_id).await
    }

    async fn storage_used_by_project(&self, project_id: Uuid) -> Result<i64> {
        VersionQueries::storage_used_by_project(self.pool(), project_id).await
    }

    async fn create_version(
        &self,
        version: &ProjectVersion,
        files: &[ProjectFile],
        dependencies: &[Dependency],
    ) -> Result<ProjectVersion> {
        VersionQueries::create(self.pool(), version, files, dependencies).await
    }

    async fn dependents_of_version(&self, version_id: Uuid) -> Result<Vec<DependentVersion>> {
        VersionQueries::dependents_of(self.pool(), version_id).await
    }

    async fn delete_version(&self, version_id: Uuid) -> Result<Vec<ProjectFile>> {
        VersionQueries::delete(self.pool(), version_id).await
    }
}

#[async_trait]
impl QuotaOverrideRepository for Database {
    async fn quota_override(&self, scope: QuotaScope) -> Result<Option<QuotaLimitSet>> {
        QuotaQueries::find(self.pool(), scope).await
    }

    async fn set_quota_override(&self, scope: QuotaScope, limits: &QuotaLimitSet) -> Result<()> {
        QuotaQueries::upsert(self.pool(), scope, limits).await
    }

    async fn clear_quota_override(&self, scope: QuotaScope) -> Result<bool> {
        QuotaQueries::delete(self.pool(), scope).await
    }
}
