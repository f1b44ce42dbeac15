use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, ToSchema)]
pub struct ProjectVersion {
    pub id: Uuid,
    pub project_id: Uuid,
    pub author_id: Uuid,
    pub version_number: String,
    pub name: String,
    pub changelog: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, ToSchema)]
pub struct ProjectFile {
    pub id: Uuid,
    pub version_id: Uuid,
    pub file_name: String,
    pub size_bytes: i64,
    pub sha256: String,
    pub mime_type: String,
    #[serde(skip_serializing)]
    pub storage_path: String,
    pub is_primary: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "dependency_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum DependencyType {
    Required,
    Optional,
    Embedded,
}

/// Edge from a consuming version to what it needs.
///
/// A linked dependency sets `dependency_project_id` and, when pinned to one
/// release, `dependency_version_id`. A manual dependency only carries the
/// free-text `external_name`/`external_version` pair.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, ToSchema)]
pub struct Dependency {
    pub id: Uuid,
    pub version_id: Uuid,
    pub dependency_type: DependencyType,
    pub dependency_project_id: Option<Uuid>,
    pub dependency_version_id: Option<Uuid>,
    pub external_name: Option<String>,
    pub external_version: Option<String>,
}

impl Dependency {
    pub fn is_linked(&self) -> bool {
        self.dependency_project_id.is_some()
    }

    pub fn targets_version(&self, version_id: Uuid) -> bool {
        self.dependency_version_id == Some(version_id)
    }
}

/// A version elsewhere in the system that pins a dependency on a specific version.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct DependentVersion {
    pub dependency_id: Uuid,
    pub version_id: Uuid,
    pub version_number: String,
    pub project_id: Uuid,
    pub project_slug: String,
    pub project_name: String,
    pub owner_id: Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DependencyRequest {
    /// Slug of a hosted project. When absent the dependency is manual.
    pub project: Option<String>,
    /// Version number; pins a linked dependency or describes a manual one.
    pub version: Option<String>,
    /// Free-text name for manual dependencies.
    pub name: Option<String>,
    pub dependency_type: DependencyType,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateVersionRequest {
    pub version_number: String,
    pub name: String,
    #[serde(default)]
    pub changelog: String,
    #[serde(default)]
    pub dependencies: Vec<DependencyRequest>,
}

#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub data: Vec<u8>,
}

impl UploadedFile {
    pub fn size(&self) -> i64 {
        self.data.len() as i64
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct VersionResponse {
    #[serde(flatten)]
    pub version: ProjectVersion,
    pub files: Vec<ProjectFile>,
    pub dependencies: Vec<Dependency>,
}
