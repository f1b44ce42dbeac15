#![allow(dead_code)]

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tempfile::TempDir;
use uuid::Uuid;

use project_hosting_server::{
    config::Config,
    handlers::AppState,
    models::{
        ApprovalStatus, CreateUserRequest, DependencyType, Dependency, Project, ProjectFile,
        ProjectType, ProjectVersion, User, UserRole,
    },
    repository::{MemoryStore, ProjectRepository, VersionRepository},
    services::MemoryNotificationSink,
    storage::LocalStorage,
};

pub const MB: i64 = 1024 * 1024;
pub const PASSWORD: &str = "Creeper#2011";

pub fn test_config(upload_dir: &str) -> Config {
    Config {
        upload_dir: upload_dir.to_string(),
        jwt_secret: "test-secret".to_string(),
        bcrypt_cost: 4,
        ..Config::default()
    }
}

/// A fully wired application over in-memory persistence and a temp upload dir.
pub struct TestContext {
    pub state: AppState,
    pub store: Arc<MemoryStore>,
    pub notifications: Arc<MemoryNotificationSink>,
    pub storage: Arc<LocalStorage>,
    pub mod_type: ProjectType,
    pub dir: TempDir,
}

impl TestContext {
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    pub async fn with_config(customize: impl FnOnce(&mut Config)) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let mut config = test_config(dir.path().to_str().unwrap());
        customize(&mut config);

        let store = Arc::new(MemoryStore::new());
        let notifications = Arc::new(MemoryNotificationSink::new());
        let storage = Arc::new(LocalStorage::new(dir.path()).unwrap());
        let mod_type = store.create_project_type("mod", "Mod").await.unwrap();

        let state = AppState::new(
            config,
            store.clone(),
            storage.clone(),
            notifications.clone(),
        )
        .unwrap();

        Self {
            state,
            store,
            notifications,
            storage,
            mod_type,
            dir,
        }
    }

    pub async fn user(&self, username: &str) -> User {
        self.register(username, UserRole::User).await
    }

    pub async fn admin(&self, username: &str) -> User {
        self.register(username, UserRole::Admin).await
    }

    async fn register(&self, username: &str, role: UserRole) -> User {
        self.state
            .accounts
            .register_with_role(
                CreateUserRequest {
                    username: username.to_string(),
                    email: format!("{}@example.com", username),
                    password: PASSWORD.to_string(),
                },
                role,
            )
            .await
            .unwrap()
    }

    /// Inserts a project straight into the store, bypassing the quota guard.
    pub async fn insert_project(&self, owner: &User, slug: &str, status: ApprovalStatus) -> Project {
        let now = Utc::now();
        let project = Project {
            id: Uuid::new_v4(),
            project_type_id: self.mod_type.id,
            slug: slug.to_string(),
            name: slug.to_string(),
            summary: format!("{} summary", slug),
            description: String::new(),
            approval_status: status,
            submitted_at: None,
            reviewed_at: None,
            reviewed_by: None,
            rejection_reason: None,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        self.store.create_project(&project, owner.id).await.unwrap()
    }

    /// Inserts a version whose single file row claims `size_bytes` without
    /// writing anything to disk.
    pub async fn insert_version(
        &self,
        project: &Project,
        author: &User,
        version_number: &str,
        size_bytes: i64,
    ) -> ProjectVersion {
        self.insert_version_at(project, author, version_number, size_bytes, Utc::now())
            .await
    }

    pub async fn insert_version_at(
        &self,
        project: &Project,
        author: &User,
        version_number: &str,
        size_bytes: i64,
        created_at: DateTime<Utc>,
    ) -> ProjectVersion {
        let version = ProjectVersion {
            id: Uuid::new_v4(),
            project_id: project.id,
            author_id: author.id,
            version_number: version_number.to_string(),
            name: version_number.to_string(),
            changelog: String::new(),
            created_at,
        };
        let file = ProjectFile {
            id: Uuid::new_v4(),
            version_id: version.id,
            file_name: format!("{}-{}.jar", project.slug, version_number),
            size_bytes,
            sha256: String::new(),
            mime_type: "application/java-archive".to_string(),
            storage_path: format!("{}/{}/{}-{}.jar", project.id, version.id, project.slug, version_number),
            is_primary: true,
            created_at,
        };
        self.store
            .create_version(&version, &[file], &[])
            .await
            .unwrap()
    }

    /// Inserts a version of `project` that pins `target`.
    pub async fn insert_dependent_version(
        &self,
        project: &Project,
        author: &User,
        version_number: &str,
        target: &ProjectVersion,
    ) -> ProjectVersion {
        let version = ProjectVersion {
            id: Uuid::new_v4(),
            project_id: project.id,
            author_id: author.id,
            version_number: version_number.to_string(),
            name: version_number.to_string(),
            changelog: String::new(),
            created_at: Utc::now(),
        };
        let dependency = Dependency {
            id: Uuid::new_v4(),
            version_id: version.id,
            dependency_type: DependencyType::Required,
            dependency_project_id: Some(target.project_id),
            dependency_version_id: Some(target.id),
            external_name: None,
            external_version: None,
        };
        self.store
            .create_version(&version, &[], &[dependency])
            .await
            .unwrap()
    }

    pub fn access_token(&self, user: &User) -> String {
        self.state.jwt.generate_access_token(user).unwrap()
    }
}
