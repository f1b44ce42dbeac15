use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{ProjectRepository, QuotaOverrideRepository, UserRepository, VersionRepository};
use crate::errors::{AppError, Result};
use crate::models::{
    ApprovalStatus, Dependency, DependentVersion, MemberRole, NewUser, Project, ProjectFile,
    ProjectMember, ProjectType, ProjectVersion, QuotaLimitSet, QuotaScope, User,
};

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    project_types: HashMap<Uuid, ProjectType>,
    projects: HashMap<Uuid, Project>,
    members: Vec<ProjectMember>,
    versions: HashMap<Uuid, ProjectVersion>,
    files: HashMap<Uuid, ProjectFile>,
    dependencies: HashMap<Uuid, Dependency>,
    quotas: HashMap<QuotaScope, QuotaLimitSet>,
}

impl Tables {
    fn primary_owner(&self, project_id: Uuid) -> Option<Uuid> {
        self.members
            .iter()
            .find(|m| m.project_id == project_id && m.is_primary)
            .map(|m| m.user_id)
    }

    fn active_owned_projects(&self, owner_id: Uuid) -> impl Iterator<Item = &Project> + '_ {
        self.projects.values().filter(move |p| {
            p.deleted_at.is_none() && self.primary_owner(p.id) == Some(owner_id)
        })
    }

    fn project_storage(&self, project_id: Uuid) -> i64 {
        self.files
            .values()
            .filter(|f| {
                self.versions
                    .get(&f.version_id)
                    .is_some_and(|v| v.project_id == project_id)
            })
            .map(|f| f.size_bytes)
            .sum()
    }
}

/// In-process repository used by the test suite and for running without PostgreSQL.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a member row directly; project creation only records the primary owner.
    pub async fn add_member(&self, project_id: Uuid, user_id: Uuid, role: MemberRole) {
        let mut tables = self.tables.write().await;
        tables.members.push(ProjectMember {
            project_id,
            user_id,
            role,
            is_primary: false,
            created_at: Utc::now(),
        });
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn find_user(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn create_user(&self, new_user: NewUser) -> Result<User> {
        let mut tables = self.tables.write().await;
        if tables
            .users
            .values()
            .any(|u| u.email.eq_ignore_ascii_case(&new_user.email))
        {
            return Err(AppError::Validation(
                "User with this email already exists".to_string(),
            ));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            username: new_user.username,
            email: new_user.email,
            password_hash: new_user.password_hash,
            role: new_user.role,
            pending_email: None,
            email_change_token: None,
            created_at: now,
            updated_at: now,
            deactivated_at: None,
        };
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update_user(&self, user: &User) -> Result<User> {
        let mut tables = self.tables.write().await;
        let stored = tables.users.get_mut(&user.id).ok_or(AppError::NotFound)?;
        *stored = User {
            updated_at: Utc::now(),
            ..user.clone()
        };
        Ok(stored.clone())
    }
}

#[async_trait]
impl ProjectRepository for MemoryStore {
    async fn find_project_type(&self, id: Uuid) -> Result<Option<ProjectType>> {
        Ok(self.tables.read().await.project_types.get(&id).cloned())
    }

    async fn list_project_types(&self) -> Result<Vec<ProjectType>> {
        let tables = self.tables.read().await;
        let mut types: Vec<ProjectType> = tables.project_types.values().cloned().collect();
        types.sort_by(|a, b| a.slug.cmp(&b.slug));
        Ok(types)
    }

    async fn create_project_type(&self, slug: &str, name: &str) -> Result<ProjectType> {
        let project_type = ProjectType {
            id: Uuid::new_v4(),
            slug: slug.to_string(),
            name: name.to_string(),
            created_at: Utc::now(),
        };
        self.tables
            .write()
            .await
            .project_types
            .insert(project_type.id, project_type.clone());
        Ok(project_type)
    }

    async fn find_project(&self, id: Uuid) -> Result<Option<Project>> {
        let tables = self.tables.read().await;
        Ok(tables
            .projects
            .get(&id)
            .filter(|p| p.deleted_at.is_none())
            .cloned())
    }

    async fn find_project_with_trashed(&self, id: Uuid) -> Result<Option<Project>> {
        Ok(self.tables.read().await.projects.get(&id).cloned())
    }

    async fn find_project_by_slug(&self, slug: &str) -> Result<Option<Project>> {
        let tables = self.tables.read().await;
        Ok(tables
            .projects
            .values()
            .find(|p| p.deleted_at.is_none() && p.slug == slug)
            .cloned())
    }

    async fn list_projects_by_status(
        &self,
        status: ApprovalStatus,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Project>> {
        let tables = self.tables.read().await;
        let mut projects: Vec<Project> = tables
            .projects
            .values()
            .filter(|p| p.deleted_at.is_none() && p.approval_status == status)
            .cloned()
            .collect();
        projects.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(projects
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn create_project(&self, project: &Project, owner_id: Uuid) -> Result<Project> {
        let mut tables = self.tables.write().await;
        tables.projects.insert(project.id, project.clone());
        tables.members.push(ProjectMember {
            project_id: project.id,
            user_id: owner_id,
            role: MemberRole::Owner,
            is_primary: true,
            created_at: project.created_at,
        });
        Ok(project.clone())
    }

    async fn update_project(&self, project: &Project) -> Result<Project> {
        let mut tables = self.tables.write().await;
        let stored = tables
            .projects
            .get_mut(&project.id)
            .ok_or(AppError::NotFound)?;
        *stored = Project {
            updated_at: Utc::now(),
            ..project.clone()
        };
        Ok(stored.clone())
    }

    async fn soft_delete_project(&self, id: Uuid, deleted_at: DateTime<Utc>) -> Result<()> {
        let mut tables = self.tables.write().await;
        let project = tables.projects.get_mut(&id).ok_or(AppError::NotFound)?;
        project.deleted_at = Some(deleted_at);
        Ok(())
    }

    async fn restore_project(&self, id: Uuid) -> Result<()> {
        let mut tables = self.tables.write().await;
        let project = tables.projects.get_mut(&id).ok_or(AppError::NotFound)?;
        project.deleted_at = None;
        Ok(())
    }

    async fn primary_owner(&self, project_id: Uuid) -> Result<Option<Uuid>> {
        Ok(self.tables.read().await.primary_owner(project_id))
    }

    async fn is_member(&self, project_id: Uuid, user_id: Uuid) -> Result<bool> {
        let tables = self.tables.read().await;
        Ok(tables
            .members
            .iter()
            .any(|m| m.project_id == project_id && m.user_id == user_id))
    }

    async fn count_projects_by_owner_and_status(
        &self,
        owner_id: Uuid,
        status: ApprovalStatus,
    ) -> Result<i64> {
        let tables = self.tables.read().await;
        Ok(tables
            .active_owned_projects(owner_id)
            .filter(|p| p.approval_status == status)
            .count() as i64)
    }
}

#[async_trait]
impl VersionRepository for MemoryStore {
    async fn find_version(&self, id: Uuid) -> Result<Option<ProjectVersion>> {
        Ok(self.tables.read().await.versions.get(&id).cloned())
    }

    async fn find_version_by_number(
        &self,
        project_id: Uuid,
        version_number: &str,
    ) -> Result<Option<ProjectVersion>> {
        let tables = self.tables.read().await;
        Ok(tables
            .versions
            .values()
            .find(|v| v.project_id == project_id && v.version_number == version_number)
            .cloned())
    }

    async fn list_versions(&self, project_id: Uuid) -> Result<Vec<ProjectVersion>> {
        let tables = self.tables.read().await;
        let mut versions: Vec<ProjectVersion> = tables
            .versions
            .values()
            .filter(|v| v.project_id == project_id)
            .cloned()
            .collect();
        versions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(versions)
    }

    async fn list_files(&self, version_id: Uuid) -> Result<Vec<ProjectFile>> {
        let tables = self.tables.read().await;
        let mut files: Vec<ProjectFile> = tables
            .files
            .values()
            .filter(|f| f.version_id == version_id)
            .cloned()
            .collect();
        files.sort_by(|a, b| a.file_name.cmp(&b.file_name));
        Ok(files)
    }

    async fn list_dependencies(&self, version_id: Uuid) -> Result<Vec<Dependency>> {
        let tables = self.tables.read().await;
        Ok(tables
            .dependencies
            .values()
            .filter(|d| d.version_id == version_id)
            .cloned()
            .collect())
    }

    async fn count_versions_since(&self, project_id: Uuid, since: DateTime<Utc>) -> Result<i64> {
        let tables = self.tables.read().await;
        Ok(tables
            .versions
            .values()
            .filter(|v| v.project_id == project_id && v.created_at >= since)
            .count() as i64)
    }

    async fn storage_used_by_owner(&self, owner_id: Uuid) -> Result<i64> {
        let tables = self.tables.read().await;
        Ok(tables
            .active_owned_projects(owner_id)
            .map(|p| tables.project_storage(p.id))
            .sum())
    }

    async fn storage_used_by_project(&self, project_id: Uuid) -> Result<i64> {
        Ok(self.tables.read().await.project_storage(project_id))
    }

    async fn create_version(
        &self,
        version: &ProjectVersion,
        files: &[ProjectFile],
        dependencies: &[Dependency],
    ) -> Result<ProjectVersion> {
        let mut tables = self.tables.write().await;
        tables.versions.insert(version.id, version.clone());
        for file in files {
            tables.files.insert(file.id, file.clone());
        }
        for dependency in dependencies {
            tables.dependencies.insert(dependency.id, dependency.clone());
        }
        Ok(version.clone())
    }

    async fn dependents_of_version(&self, version_id: Uuid) -> Result<Vec<DependentVersion>> {
        let tables = self.tables.read().await;
        let mut dependents: Vec<DependentVersion> = tables
            .dependencies
            .values()
            .filter(|d| d.targets_version(version_id) && d.version_id != version_id)
            .filter_map(|d| {
                let version = tables.versions.get(&d.version_id)?;
                let project = tables
                    .projects
                    .get(&version.project_id)
                    .filter(|p| p.deleted_at.is_none())?;
                Some(DependentVersion {
                    dependency_id: d.id,
                    version_id: version.id,
                    version_number: version.version_number.clone(),
                    project_id: project.id,
                    project_slug: project.slug.clone(),
                    project_name: project.name.clone(),
                    owner_id: tables.primary_owner(project.id),
                })
            })
            .collect();
        dependents.sort_by(|a, b| {
            (&a.project_slug, &a.version_number).cmp(&(&b.project_slug, &b.version_number))
        });
        Ok(dependents)
    }

    async fn delete_version(&self, version_id: Uuid) -> Result<Vec<ProjectFile>> {
        let mut tables = self.tables.write().await;
        if tables.versions.remove(&version_id).is_none() {
            return Err(AppError::NotFound);
        }

        let removed: Vec<ProjectFile> = tables
            .files
            .values()
            .filter(|f| f.version_id == version_id)
            .cloned()
            .collect();
        for file in &removed {
            tables.files.remove(&file.id);
        }
        tables
            .dependencies
            .retain(|_, d| d.version_id != version_id && !d.targets_version(version_id));

        Ok(removed)
    }
}

#[async_trait]
impl QuotaOverrideRepository for MemoryStore {
    async fn quota_override(&self, scope: QuotaScope) -> Result<Option<QuotaLimitSet>> {
        Ok(self.tables.read().await.quotas.get(&scope).copied())
    }

    async fn set_quota_override(&self, scope: QuotaScope, limits: &QuotaLimitSet) -> Result<()> {
        self.tables.write().await.quotas.insert(scope, *limits);
        Ok(())
    }

    async fn clear_quota_override(&self, scope: QuotaScope) -> Result<bool> {
        Ok(self.tables.write().await.quotas.remove(&scope).is_some())
    }
}
