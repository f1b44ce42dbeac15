use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::{AppError, Result};
use crate::models::*;

const USER_COLUMNS: &str = "id, username, email, password_hash, role, pending_email, \
    email_change_token, created_at, updated_at, deactivated_at";

const PROJECT_COLUMNS: &str = "id, project_type_id, slug, name, summary, description, \
    approval_status, submitted_at, reviewed_at, reviewed_by, rejection_reason, \
    created_at, updated_at, deleted_at";

const VERSION_COLUMNS: &str =
    "id, project_id, author_id, version_number, name, changelog, created_at";

const FILE_COLUMNS: &str =
    "id, version_id, file_name, size_bytes, sha256, mime_type, storage_path, is_primary, created_at";

const DEPENDENCY_COLUMNS: &str = "id, version_id, dependency_type, dependency_project_id, \
    dependency_version_id, external_name, external_version";

const QUOTA_COLUMNS: &str = "pending_projects_max, total_storage_max, project_storage_max, \
    versions_per_day_max, version_size_max, files_per_version_max, file_size_max";

pub struct UserQueries;

impl UserQueries {
    pub async fn create_user(pool: &PgPool, new_user: &NewUser) -> Result<User> {
        let sql = format!(
            "INSERT INTO users (username, email, password_hash, role) \
             VALUES ($1, $2, $3, $4) RETURNING {USER_COLUMNS}"
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(&new_user.username)
            .bind(&new_user.email)
            .bind(&new_user.password_hash)
            .bind(new_user.role)
            .fetch_one(pool)
            .await?;

        Ok(user)
    }

    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE LOWER(email) = LOWER($1)");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(pool)
            .await?;

        Ok(user)
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(user)
    }

    pub async fn update(pool: &PgPool, user: &User) -> Result<User> {
        let sql = format!(
            "UPDATE users SET username = $2, email = $3, password_hash = $4, role = $5, \
             pending_email = $6, email_change_token = $7, deactivated_at = $8, updated_at = NOW() \
             WHERE id = $1 RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(user.id)
            .bind(&user.username)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(user.role)
            .bind(&user.pending_email)
            .bind(&user.email_change_token)
            .bind(user.deactivated_at)
            .fetch_optional(pool)
            .await?
            .ok_or(AppError::NotFound)
    }
}

pub struct ProjectQueries;

impl ProjectQueries {
    pub async fn find_type(pool: &PgPool, id: Uuid) -> Result<Option<ProjectType>> {
        let project_type = sqlx::query_as::<_, ProjectType>(
            "SELECT id, slug, name, created_at FROM project_types WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(project_type)
    }

    pub async fn list_types(pool: &PgPool) -> Result<Vec<ProjectType>> {
        let types = sqlx::query_as::<_, ProjectType>(
            "SELECT id, slug, name, created_at FROM project_types ORDER BY slug",
        )
        .fetch_all(pool)
        .await?;

        Ok(types)
    }

    pub async fn create_type(pool: &PgPool, slug: &str, name: &str) -> Result<ProjectType> {
        let project_type = sqlx::query_as::<_, ProjectType>(
            "INSERT INTO project_types (slug, name) VALUES ($1, $2) \
             RETURNING id, slug, name, created_at",
        )
        .bind(slug)
        .bind(name)
        .fetch_one(pool)
        .await?;

        Ok(project_type)
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid, with_trashed: bool) -> Result<Option<Project>> {
        let sql = if with_trashed {
            format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE id = $1")
        } else {
            format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE id = $1 AND deleted_at IS NULL")
        };
        let project = sqlx::query_as::<_, Project>(&sql)
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(project)
    }

    pub async fn find_by_slug(pool: &PgPool, slug: &str) -> Result<Option<Project>> {
        let sql = format!(
            "SELECT {PROJECT_COLUMNS} FROM projects WHERE slug = $1 AND deleted_at IS NULL"
        );
        let project = sqlx::query_as::<_, Project>(&sql)
            .bind(slug)
            .fetch_optional(pool)
            .await?;

        Ok(project)
    }

    pub async fn list_by_status(
        pool: &PgPool,
        status: ApprovalStatus,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Project>> {
        let sql = format!(
            "SELECT {PROJECT_COLUMNS} FROM projects \
             WHERE approval_status = $1 AND deleted_at IS NULL \
             ORDER BY created_at DESC LIMIT $2 OFFSET $3"
        );
        let projects = sqlx::query_as::<_, Project>(&sql)
            .bind(status)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await?;

        Ok(projects)
    }

    pub async fn create(pool: &PgPool, project: &Project, owner_id: Uuid) -> Result<Project> {
        let mut tx = pool.begin().await?;

        let sql = format!(
            "INSERT INTO projects ({PROJECT_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14) \
             RETURNING {PROJECT_COLUMNS}"
        );
        let created = sqlx::query_as::<_, Project>(&sql)
            .bind(project.id)
            .bind(project.project_type_id)
            .bind(&project.slug)
            .bind(&project.name)
            .bind(&project.summary)
            .bind(&project.description)
            .bind(project.approval_status)
            .bind(project.submitted_at)
            .bind(project.reviewed_at)
            .bind(project.reviewed_by)
            .bind(&project.rejection_reason)
            .bind(project.created_at)
            .bind(project.updated_at)
            .bind(project.deleted_at)
            .fetch_one(&mut *tx)
            .await?;

        sqlx::query(
            "INSERT INTO project_members (project_id, user_id, role, is_primary) \
             VALUES ($1, $2, 'owner', TRUE)",
        )
        .bind(created.id)
        .bind(owner_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(created)
    }

    pub async fn update(pool: &PgPool, project: &Project) -> Result<Project> {
        let sql = format!(
            "UPDATE projects SET name = $2, summary = $3, description = $4, approval_status = $5, \
             submitted_at = $6, reviewed_at = $7, reviewed_by = $8, rejection_reason = $9, \
             updated_at = NOW() WHERE id = $1 RETURNING {PROJECT_COLUMNS}"
        );
        sqlx::query_as::<_, Project>(&sql)
            .bind(project.id)
            .bind(&project.name)
            .bind(&project.summary)
            .bind(&project.description)
            .bind(project.approval_status)
            .bind(project.submitted_at)
            .bind(project.reviewed_at)
            .bind(project.reviewed_by)
            .bind(&project.rejection_reason)
            .fetch_optional(pool)
            .await?
            .ok_or(AppError::NotFound)
    }

    pub async fn set_deleted_at(
        pool: &PgPool,
        id: Uuid,
        deleted_at: Option<DateTime<Utc>>,
    ) -> Result<()> {
        let result = sqlx::query("UPDATE projects SET deleted_at = $2 WHERE id = $1")
            .bind(id)
            .bind(deleted_at)
            .execute(pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    pub async fn primary_owner(pool: &PgPool, project_id: Uuid) -> Result<Option<Uuid>> {
        let owner = sqlx::query_scalar::<_, Uuid>(
            "SELECT user_id FROM project_members WHERE project_id = $1 AND is_primary",
        )
        .bind(project_id)
        .fetch_optional(pool)
        .await?;

        Ok(owner)
    }

    pub async fn is_member(pool: &PgPool, project_id: Uuid, user_id: Uuid) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM project_members WHERE project_id = $1 AND user_id = $2)",
        )
        .bind(project_id)
        .bind(user_id)
        .fetch_one(pool)
        .await?;

        Ok(exists)
    }

    pub async fn count_by_owner_and_status(
        pool: &PgPool,
        owner_id: Uuid,
        status: ApprovalStatus,
    ) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM projects p \
             JOIN project_members pm ON pm.project_id = p.id AND pm.is_primary \
             WHERE pm.user_id = $1 AND p.approval_status = $2 AND p.deleted_at IS NULL",
        )
        .bind(owner_id)
        .bind(status)
        .fetch_one(pool)
        .await?;

        Ok(count)
    }
}

pub struct VersionQueries;

impl VersionQueries {
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<ProjectVersion>> {
        let sql = format!("SELECT {VERSION_COLUMNS} FROM project_versions WHERE id = $1");
        let version = sqlx::query_as::<_, ProjectVersion>(&sql)
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(version)
    }

    pub async fn find_by_number(
        pool: &PgPool,
        project_id: Uuid,
        version_number: &str,
    ) -> Result<Option<ProjectVersion>> {
        let sql = format!(
            "SELECT {VERSION_COLUMNS} FROM project_versions \
             WHERE project_id = $1 AND version_number = $2"
        );
        let version = sqlx::query_as::<_, ProjectVersion>(&sql)
            .bind(project_id)
            .bind(version_number)
            .fetch_optional(pool)
            .await?;

        Ok(version)
    }

    pub async fn list_by_project(pool: &PgPool, project_id: Uuid) -> Result<Vec<ProjectVersion>> {
        let sql = format!(
            "SELECT {VERSION_COLUMNS} FROM project_versions \
             WHERE project_id = $1 ORDER BY created_at DESC"
        );
        let versions = sqlx::query_as::<_, ProjectVersion>(&sql)
            .bind(project_id)
            .fetch_all(pool)
            .await?;

        Ok(versions)
    }

    pub async fn list_files(pool: &PgPool, version_id: Uuid) -> Result<Vec<ProjectFile>> {
        let sql = format!(
            "SELECT {FILE_COLUMNS} FROM project_files WHERE version_id = $1 ORDER BY file_name"
        );
        let files = sqlx::query_as::<_, ProjectFile>(&sql)
            .bind(version_id)
            .fetch_all(pool)
            .await?;

        Ok(files)
    }

    pub async fn list_dependencies(pool: &PgPool, version_id: Uuid) -> Result<Vec<Dependency>> {
        let sql = format!("SELECT {DEPENDENCY_COLUMNS} FROM dependencies WHERE version_id = $1");
        let dependencies = sqlx::query_as::<_, Dependency>(&sql)
            .bind(version_id)
            .fetch_all(pool)
            .await?;

        Ok(dependencies)
    }

    pub async fn count_since(pool: &PgPool, project_id: Uuid, since: DateTime<Utc>) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM project_versions WHERE project_id = $1 AND created_at >= $2",
        )
        .bind(project_id)
        .bind(since)
        .fetch_one(pool)
        .await?;

        Ok(count)
    }

    pub async fn storage_used_by_owner(pool: &PgPool, owner_id: Uuid) -> Result<i64> {
        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COALESCE(SUM(f.size_bytes), 0)::BIGINT FROM project_files f \
             JOIN project_versions v ON v.id = f.version_id \
             JOIN projects p ON p.id = v.project_id \
             JOIN project_members pm ON pm.project_id = p.id AND pm.is_primary \
             WHERE pm.user_id = $1 AND p.deleted_at IS NULL",
        )
        .bind(owner_id)
        .fetch_one(pool)
        .await?;

        Ok(total)
    }

    pub async fn storage_used_by_project(pool: &PgPool, project_id: Uuid) -> Result<i64> {
        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COALESCE(SUM(f.size_bytes), 0)::BIGINT FROM project_files f \
             JOIN project_versions v ON v.id = f.version_id \
             WHERE v.project_id = $1",
        )
        .bind(project_id)
        .fetch_one(pool)
        .await?;

        Ok(total)
    }

    pub async fn create(
        pool: &PgPool,
        version: &ProjectVersion,
        files: &[ProjectFile],
        dependencies: &[Dependency],
    ) -> Result<ProjectVersion> {
        let mut tx = pool.begin().await?;

        let sql = format!(
            "INSERT INTO project_versions ({VERSION_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {VERSION_COLUMNS}"
        );
        let created = sqlx::query_as::<_, ProjectVersion>(&sql)
            .bind(version.id)
            .bind(version.project_id)
            .bind(version.author_id)
            .bind(&version.version_number)
            .bind(&version.name)
            .bind(&version.changelog)
            .bind(version.created_at)
            .fetch_one(&mut *tx)
            .await?;

        for file in files {
            sqlx::query(&format!(
                "INSERT INTO project_files ({FILE_COLUMNS}) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)"
            ))
            .bind(file.id)
            .bind(file.version_id)
            .bind(&file.file_name)
            .bind(file.size_bytes)
            .bind(&file.sha256)
            .bind(&file.mime_type)
            .bind(&file.storage_path)
            .bind(file.is_primary)
            .bind(file.created_at)
            .execute(&mut *tx)
            .await?;
        }

        for dependency in dependencies {
            sqlx::query(&format!(
                "INSERT INTO dependencies ({DEPENDENCY_COLUMNS}) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7)"
            ))
            .bind(dependency.id)
            .bind(dependency.version_id)
            .bind(dependency.dependency_type)
            .bind(dependency.dependency_project_id)
            .bind(dependency.dependency_version_id)
            .bind(&dependency.external_name)
            .bind(&dependency.external_version)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(created)
    }

    pub async fn dependents_of(pool: &PgPool, version_id: Uuid) -> Result<Vec<DependentVersion>> {
        let dependents = sqlx::query_as::<_, DependentVersion>(
            "SELECT d.id AS dependency_id, v.id AS version_id, v.version_number, \
                    p.id AS project_id, p.slug AS project_slug, p.name AS project_name, \
                    pm.user_id AS owner_id \
             FROM dependencies d \
             JOIN project_versions v ON v.id = d.version_id \
             JOIN projects p ON p.id = v.project_id \
             LEFT JOIN project_members pm ON pm.project_id = p.id AND pm.is_primary \
             WHERE d.dependency_version_id = $1 AND d.version_id <> $1 AND p.deleted_at IS NULL \
             ORDER BY p.slug, v.version_number",
        )
        .bind(version_id)
        .fetch_all(pool)
        .await?;

        Ok(dependents)
    }

    pub async fn delete(pool: &PgPool, version_id: Uuid) -> Result<Vec<ProjectFile>> {
        let mut tx = pool.begin().await?;

        let sql = format!("DELETE FROM project_files WHERE version_id = $1 RETURNING {FILE_COLUMNS}");
        let removed = sqlx::query_as::<_, ProjectFile>(&sql)
            .bind(version_id)
            .fetch_all(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM dependencies WHERE version_id = $1 OR dependency_version_id = $1")
            .bind(version_id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM project_versions WHERE id = $1")
            .bind(version_id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound);
        }

        tx.commit().await?;
        Ok(removed)
    }
}

pub struct QuotaQueries;

impl QuotaQueries {
    pub async fn find(pool: &PgPool, scope: QuotaScope) -> Result<Option<QuotaLimitSet>> {
        let sql = format!(
            "SELECT {QUOTA_COLUMNS} FROM quota_overrides WHERE scope = $1 AND scope_id = $2"
        );
        let limits = sqlx::query_as::<_, QuotaLimitSet>(&sql)
            .bind(scope.kind())
            .bind(scope.id())
            .fetch_optional(pool)
            .await?;

        Ok(limits)
    }

    pub async fn upsert(pool: &PgPool, scope: QuotaScope, limits: &QuotaLimitSet) -> Result<()> {
        let sql = format!(
            "INSERT INTO quota_overrides (scope, scope_id, {QUOTA_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             ON CONFLICT (scope, scope_id) DO UPDATE SET \
                pending_projects_max = EXCLUDED.pending_projects_max, \
                total_storage_max = EXCLUDED.total_storage_max, \
                project_storage_max = EXCLUDED.project_storage_max, \
                versions_per_day_max = EXCLUDED.versions_per_day_max, \
                version_size_max = EXCLUDED.version_size_max, \
                files_per_version_max = EXCLUDED.files_per_version_max, \
                file_size_max = EXCLUDED.file_size_max, \
                updated_at = NOW()"
        );
        sqlx::query(&sql)
            .bind(scope.kind())
            .bind(scope.id())
            .bind(limits.pending_projects_max)
            .bind(limits.total_storage_max)
            .bind(limits.project_storage_max)
            .bind(limits.versions_per_day_max)
            .bind(limits.version_size_max)
            .bind(limits.files_per_version_max)
            .bind(limits.file_size_max)
            .execute(pool)
            .await?;

        Ok(())
    }

    pub async fn delete(pool: &PgPool, scope: QuotaScope) -> Result<bool> {
        let result = sqlx::query("DELETE FROM quota_overrides WHERE scope = $1 AND scope_id = $2")
            .bind(scope.kind())
            .bind(scope.id())
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
