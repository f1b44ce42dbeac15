use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    errors::{AppError, Result},
    models::{
        CreateVersionRequest, Dependency, DependencyRequest, Project, ProjectFile, ProjectVersion,
        UploadedFile, User, VersionResponse,
    },
    repository::Repository,
    services::{
        dependency_notifier::DependencyNotifier, metrics::MetricsService,
        quota_manager::QuotaManager,
    },
    storage::{self, Storage},
    utils::file::{calculate_sha256, detect_mime_type, validate_upload_names},
};

const MAX_VERSION_NUMBER_LENGTH: usize = 32;

#[derive(Debug, Serialize)]
pub struct DeletionReport {
    pub version_id: Uuid,
    pub removed_files: usize,
    pub notified: usize,
}

pub struct VersionService {
    repo: Arc<dyn Repository>,
    storage: Arc<dyn Storage>,
    quota: Arc<QuotaManager>,
    notifier: DependencyNotifier,
    metrics: Arc<MetricsService>,
}

impl VersionService {
    pub fn new(
        repo: Arc<dyn Repository>,
        storage: Arc<dyn Storage>,
        quota: Arc<QuotaManager>,
        notifier: DependencyNotifier,
        metrics: Arc<MetricsService>,
    ) -> Self {
        Self {
            repo,
            storage,
            quota,
            notifier,
            metrics,
        }
    }

    pub async fn create_version(
        &self,
        actor: &User,
        project_id: Uuid,
        request: CreateVersionRequest,
        files: Vec<UploadedFile>,
    ) -> Result<VersionResponse> {
        let project = self.load_project(project_id).await?;
        self.ensure_member(actor, &project).await?;

        let version_number = request.version_number.trim().to_string();
        if version_number.is_empty() || version_number.len() > MAX_VERSION_NUMBER_LENGTH {
            return Err(AppError::Validation(format!(
                "Version number must be 1-{} characters",
                MAX_VERSION_NUMBER_LENGTH
            )));
        }
        if request.name.trim().is_empty() {
            return Err(AppError::Validation("Version name is required".to_string()));
        }
        if files.is_empty() {
            return Err(AppError::Validation(
                "A version must contain at least one file".to_string(),
            ));
        }
        validate_upload_names(&files)?;

        if self
            .repo
            .find_version_by_number(project.id, &version_number)
            .await?
            .is_some()
        {
            return Err(AppError::Validation(format!(
                "Version {} already exists for this project",
                version_number
            )));
        }

        self.quota.validate_version_upload(actor, &project, &files).await?;

        let version = ProjectVersion {
            id: Uuid::new_v4(),
            project_id: project.id,
            author_id: actor.id,
            version_number,
            name: request.name.trim().to_string(),
            changelog: request.changelog,
            created_at: Utc::now(),
        };

        let mut dependencies = Vec::with_capacity(request.dependencies.len());
        for dependency in &request.dependencies {
            dependencies.push(self.resolve_dependency(&project, version.id, dependency).await?);
        }

        let project_files: Vec<ProjectFile> = files
            .iter()
            .enumerate()
            .map(|(index, file)| ProjectFile {
                id: Uuid::new_v4(),
                version_id: version.id,
                file_name: file.file_name.clone(),
                size_bytes: file.size(),
                sha256: calculate_sha256(&file.data),
                mime_type: detect_mime_type(&file.file_name),
                storage_path: storage::file_path(project.id, version.id, &file.file_name),
                is_primary: index == 0,
                created_at: version.created_at,
            })
            .collect();

        let mut stored = Vec::with_capacity(project_files.len());
        for (record, file) in project_files.iter().zip(&files) {
            if let Err(e) = self.storage.store(&record.storage_path, &file.data).await {
                self.remove_stored(&stored).await;
                return Err(e);
            }
            stored.push(record.storage_path.clone());
        }

        let version = match self
            .repo
            .create_version(&version, &project_files, &dependencies)
            .await
        {
            Ok(version) => version,
            Err(e) => {
                self.remove_stored(&stored).await;
                return Err(e);
            }
        };

        self.metrics.record_version_uploaded();
        tracing::info!(
            project_id = %project.id,
            version_id = %version.id,
            version_number = %version.version_number,
            files = project_files.len(),
            "version uploaded"
        );

        Ok(VersionResponse {
            version,
            files: project_files,
            dependencies,
        })
    }

    pub async fn list_versions(&self, project: &Project) -> Result<Vec<VersionResponse>> {
        let versions = self.repo.list_versions(project.id).await?;
        let mut responses = Vec::with_capacity(versions.len());
        for version in versions {
            let (files, dependencies) = futures::try_join!(
                self.repo.list_files(version.id),
                self.repo.list_dependencies(version.id)
            )?;
            responses.push(VersionResponse {
                version,
                files,
                dependencies,
            });
        }
        Ok(responses)
    }

    /// Reads a stored release file. The stored size must match the recorded one.
    pub async fn download_file(
        &self,
        project: &Project,
        version_number: &str,
        file_name: &str,
    ) -> Result<(ProjectFile, Vec<u8>)> {
        let version = self
            .repo
            .find_version_by_number(project.id, version_number)
            .await?
            .ok_or(AppError::NotFound)?;
        let file = self
            .repo
            .list_files(version.id)
            .await?
            .into_iter()
            .find(|f| f.file_name == file_name)
            .ok_or(AppError::NotFound)?;

        let stored_size = self.storage.size(&file.storage_path).await?;
        if stored_size != file.size_bytes as u64 {
            tracing::error!(
                file_id = %file.id,
                recorded = file.size_bytes,
                stored = stored_size,
                "stored file size does not match its record"
            );
            return Err(AppError::Storage(format!(
                "File {} is corrupted",
                file.file_name
            )));
        }

        let data = self.storage.retrieve(&file.storage_path).await?;
        Ok((file, data))
    }

    /// Removes the version and its files. Dependents are collected before the
    /// rows disappear and their owners are notified once the delete committed.
    pub async fn delete_version(&self, actor: &User, version_id: Uuid) -> Result<DeletionReport> {
        let version = self
            .repo
            .find_version(version_id)
            .await?
            .ok_or(AppError::NotFound)?;
        let project = self.load_project(version.project_id).await?;
        self.ensure_member(actor, &project).await?;

        let dependents = self.notifier.collect(version.id).await?;
        let removed = self.repo.delete_version(version.id).await?;

        let paths: Vec<String> = removed.iter().map(|f| f.storage_path.clone()).collect();
        self.remove_stored(&paths).await;

        self.metrics.record_version_deleted();
        tracing::info!(
            project_id = %project.id,
            version_id = %version.id,
            removed_files = removed.len(),
            dependents = dependents.len(),
            "version deleted"
        );

        let notified = self.notifier.dispatch(&version, &project, dependents).await;

        Ok(DeletionReport {
            version_id: version.id,
            removed_files: removed.len(),
            notified,
        })
    }

    async fn resolve_dependency(
        &self,
        project: &Project,
        version_id: Uuid,
        request: &DependencyRequest,
    ) -> Result<Dependency> {
        let mut dependency = Dependency {
            id: Uuid::new_v4(),
            version_id,
            dependency_type: request.dependency_type,
            dependency_project_id: None,
            dependency_version_id: None,
            external_name: None,
            external_version: None,
        };

        let Some(slug) = request.project.as_deref() else {
            let name = request
                .name
                .as_deref()
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .ok_or_else(|| {
                    AppError::Validation(
                        "A dependency needs either a project slug or a name".to_string(),
                    )
                })?;
            dependency.external_name = Some(name.to_string());
            dependency.external_version = request.version.clone();
            return Ok(dependency);
        };

        let target = self
            .repo
            .find_project_by_slug(slug)
            .await?
            .ok_or_else(|| AppError::UnresolvedDependency(slug.to_string()))?;
        if target.id == project.id {
            return Err(AppError::SelfDependency);
        }
        dependency.dependency_project_id = Some(target.id);

        if let Some(number) = request.version.as_deref() {
            let pinned = self
                .repo
                .find_version_by_number(target.id, number)
                .await?
                .ok_or_else(|| AppError::UnresolvedDependency(format!("{}@{}", slug, number)))?;
            dependency.dependency_version_id = Some(pinned.id);
        }

        Ok(dependency)
    }

    async fn remove_stored(&self, paths: &[String]) {
        for path in paths {
            if let Err(e) = self.storage.delete(path).await {
                tracing::warn!(path = %path, "failed to remove stored file: {}", e);
            }
        }
    }

    async fn ensure_member(&self, actor: &User, project: &Project) -> Result<()> {
        if actor.is_admin() || self.repo.is_member(project.id, actor.id).await? {
            return Ok(());
        }
        Err(AppError::Forbidden)
    }

    async fn load_project(&self, project_id: Uuid) -> Result<Project> {
        self.repo
            .find_project(project_id)
            .await?
            .ok_or(AppError::NotFound)
    }
}
