use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use utoipa::ToSchema;
use uuid::Uuid;

/// The named limits every quota layer may set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuotaField {
    PendingProjectsMax,
    TotalStorageMax,
    ProjectStorageMax,
    VersionsPerDayMax,
    VersionSizeMax,
    FilesPerVersionMax,
    FileSizeMax,
}

impl QuotaField {
    pub const ALL: [QuotaField; 7] = [
        QuotaField::PendingProjectsMax,
        QuotaField::TotalStorageMax,
        QuotaField::ProjectStorageMax,
        QuotaField::VersionsPerDayMax,
        QuotaField::VersionSizeMax,
        QuotaField::FilesPerVersionMax,
        QuotaField::FileSizeMax,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            QuotaField::PendingProjectsMax => "pending_projects_max",
            QuotaField::TotalStorageMax => "total_storage_max",
            QuotaField::ProjectStorageMax => "project_storage_max",
            QuotaField::VersionsPerDayMax => "versions_per_day_max",
            QuotaField::VersionSizeMax => "version_size_max",
            QuotaField::FilesPerVersionMax => "files_per_version_max",
            QuotaField::FileSizeMax => "file_size_max",
        }
    }
}

impl fmt::Display for QuotaField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A set of optional limits. As an override layer `None` means "inherit";
/// once resolved `None` means "unlimited". Sizes are in bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, FromRow, Serialize, Deserialize, ToSchema)]
pub struct QuotaLimitSet {
    #[serde(default)]
    pub pending_projects_max: Option<i64>,
    #[serde(default)]
    pub total_storage_max: Option<i64>,
    #[serde(default)]
    pub project_storage_max: Option<i64>,
    #[serde(default)]
    pub versions_per_day_max: Option<i64>,
    #[serde(default)]
    pub version_size_max: Option<i64>,
    #[serde(default)]
    pub files_per_version_max: Option<i64>,
    #[serde(default)]
    pub file_size_max: Option<i64>,
}

impl QuotaLimitSet {
    pub fn get(&self, field: QuotaField) -> Option<i64> {
        match field {
            QuotaField::PendingProjectsMax => self.pending_projects_max,
            QuotaField::TotalStorageMax => self.total_storage_max,
            QuotaField::ProjectStorageMax => self.project_storage_max,
            QuotaField::VersionsPerDayMax => self.versions_per_day_max,
            QuotaField::VersionSizeMax => self.version_size_max,
            QuotaField::FilesPerVersionMax => self.files_per_version_max,
            QuotaField::FileSizeMax => self.file_size_max,
        }
    }

    pub fn set(&mut self, field: QuotaField, value: Option<i64>) {
        let slot = match field {
            QuotaField::PendingProjectsMax => &mut self.pending_projects_max,
            QuotaField::TotalStorageMax => &mut self.total_storage_max,
            QuotaField::ProjectStorageMax => &mut self.project_storage_max,
            QuotaField::VersionsPerDayMax => &mut self.versions_per_day_max,
            QuotaField::VersionSizeMax => &mut self.version_size_max,
            QuotaField::FilesPerVersionMax => &mut self.files_per_version_max,
            QuotaField::FileSizeMax => &mut self.file_size_max,
        };
        *slot = value;
    }

    pub fn with(mut self, field: QuotaField, value: i64) -> Self {
        self.set(field, Some(value));
        self
    }

    pub fn is_empty(&self) -> bool {
        QuotaField::ALL.iter().all(|field| self.get(*field).is_none())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "quota_scope", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum QuotaScopeKind {
    User,
    Project,
    ProjectType,
}

/// The entity an override row is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuotaScope {
    User(Uuid),
    Project(Uuid),
    ProjectType(Uuid),
}

impl QuotaScope {
    pub fn kind(&self) -> QuotaScopeKind {
        match self {
            QuotaScope::User(_) => QuotaScopeKind::User,
            QuotaScope::Project(_) => QuotaScopeKind::Project,
            QuotaScope::ProjectType(_) => QuotaScopeKind::ProjectType,
        }
    }

    pub fn id(&self) -> Uuid {
        match self {
            QuotaScope::User(id) | QuotaScope::Project(id) | QuotaScope::ProjectType(id) => *id,
        }
    }
}

/// Which layer an effective limit came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QuotaSource {
    User,
    Project,
    ProjectType,
    Default,
    Unlimited,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EffectiveLimit {
    pub field: QuotaField,
    pub value: Option<i64>,
    pub source: QuotaSource,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct QuotaUsage {
    pub pending_projects: i64,
    pub storage_used: i64,
}

#[derive(Debug, Serialize)]
pub struct QuotaStatus {
    pub limits: Vec<EffectiveLimit>,
    pub usage: QuotaUsage,
    pub breach: Option<String>,
    pub checked_at: DateTime<Utc>,
}
