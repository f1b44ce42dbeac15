mod common;

use common::TestContext;
use project_hosting_server::{
    errors::AppError,
    models::{
        ApprovalStatus, CreateVersionRequest, DependencyRequest, DependencyType, MemberRole,
        NotificationKind, UploadedFile, User, VersionResponse,
    },
    repository::VersionRepository,
    storage::Storage,
};
use uuid::Uuid;

fn jar(name: &str) -> UploadedFile {
    UploadedFile {
        file_name: name.to_string(),
        data: format!("PK fake archive for {}", name).into_bytes(),
    }
}

fn pinned(slug: &str, version: &str) -> DependencyRequest {
    DependencyRequest {
        project: Some(slug.to_string()),
        version: Some(version.to_string()),
        name: None,
        dependency_type: DependencyType::Required,
    }
}

async fn upload(
    ctx: &TestContext,
    actor: &User,
    project_id: Uuid,
    version_number: &str,
    dependencies: Vec<DependencyRequest>,
    files: Vec<UploadedFile>,
) -> Result<VersionResponse, AppError> {
    ctx.state
        .versions
        .create_version(
            actor,
            project_id,
            CreateVersionRequest {
                version_number: version_number.to_string(),
                name: format!("Release {}", version_number),
                changelog: String::new(),
                dependencies,
            },
            files,
        )
        .await
}

#[tokio::test]
async fn test_deleting_a_pinned_version_notifies_each_dependent() {
    let ctx = TestContext::new().await;
    let library_author = ctx.user("fabricmc").await;
    let modder = ctx.user("jellysquid").await;

    let library = ctx.insert_project(&library_author, "fabric-api", ApprovalStatus::Approved).await;
    let sodium = ctx.insert_project(&modder, "sodium", ApprovalStatus::Approved).await;
    let lithium = ctx.insert_project(&modder, "lithium", ApprovalStatus::Approved).await;

    let target = upload(
        &ctx,
        &library_author,
        library.id,
        "0.92.0",
        vec![],
        vec![jar("fabric-api-0.92.0.jar"), jar("fabric-api-0.92.0-sources.jar")],
    )
    .await
    .unwrap();
    for file in &target.files {
        assert!(ctx.storage.exists(&file.storage_path).await.unwrap());
    }

    let sodium_release = upload(
        &ctx,
        &modder,
        sodium.id,
        "0.5.3",
        vec![pinned("fabric-api", "0.92.0")],
        vec![jar("sodium-0.5.3.jar")],
    )
    .await
    .unwrap();
    assert_eq!(
        sodium_release.dependencies[0].dependency_version_id,
        Some(target.version.id)
    );
    upload(
        &ctx,
        &modder,
        lithium.id,
        "0.11.2",
        vec![pinned("fabric-api", "0.92.0")],
        vec![jar("lithium-0.11.2.jar")],
    )
    .await
    .unwrap();

    let report = ctx
        .state
        .versions
        .delete_version(&library_author, target.version.id)
        .await
        .unwrap();
    assert_eq!(report.removed_files, 2);
    assert_eq!(report.notified, 2);

    let sent = ctx
        .notifications
        .sent_of_kind(NotificationKind::DependencyVersionDeleted)
        .await;
    assert_eq!(sent.len(), 2);
    assert!(sent.iter().all(|n| n.recipient_id == modder.id));
    assert!(sent
        .iter()
        .all(|n| n.payload["deleted_version_number"] == "0.92.0"));
    let mut dependents: Vec<&str> = sent
        .iter()
        .filter_map(|n| n.payload["dependent_project_slug"].as_str())
        .collect();
    dependents.sort();
    assert_eq!(dependents, vec!["lithium", "sodium"]);

    for file in &target.files {
        assert!(!ctx.storage.exists(&file.storage_path).await.unwrap());
    }
    assert!(ctx
        .store
        .list_dependencies(sodium_release.version.id)
        .await
        .unwrap()
        .is_empty());
    assert!(ctx.store.find_version(target.version.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_project_level_links_are_not_notified() {
    let ctx = TestContext::new().await;
    let library_author = ctx.user("fabricmc").await;
    let modder = ctx.user("jellysquid").await;

    let library = ctx.insert_project(&library_author, "fabric-api", ApprovalStatus::Approved).await;
    let sodium = ctx.insert_project(&modder, "sodium", ApprovalStatus::Approved).await;

    let target = upload(&ctx, &library_author, library.id, "1.0.0", vec![], vec![jar("api.jar")])
        .await
        .unwrap();
    let unpinned = DependencyRequest {
        project: Some("fabric-api".to_string()),
        version: None,
        name: None,
        dependency_type: DependencyType::Optional,
    };
    upload(&ctx, &modder, sodium.id, "0.1.0", vec![unpinned], vec![jar("sodium.jar")])
        .await
        .unwrap();

    let report = ctx
        .state
        .versions
        .delete_version(&library_author, target.version.id)
        .await
        .unwrap();
    assert_eq!(report.notified, 0);
    assert!(ctx.notifications.sent().await.is_empty());
}

#[tokio::test]
async fn test_dependency_resolution_errors() {
    let ctx = TestContext::new().await;
    let modder = ctx.user("jellysquid").await;
    let sodium = ctx.insert_project(&modder, "sodium", ApprovalStatus::Approved).await;
    upload(&ctx, &modder, sodium.id, "0.1.0", vec![], vec![jar("sodium.jar")])
        .await
        .unwrap();

    let own = upload(
        &ctx,
        &modder,
        sodium.id,
        "0.2.0",
        vec![pinned("sodium", "0.1.0")],
        vec![jar("sodium.jar")],
    )
    .await;
    assert!(matches!(own, Err(AppError::SelfDependency)));

    let missing = upload(
        &ctx,
        &modder,
        sodium.id,
        "0.2.0",
        vec![pinned("does-not-exist", "1.0")],
        vec![jar("sodium.jar")],
    )
    .await;
    assert!(matches!(missing, Err(AppError::UnresolvedDependency(slug)) if slug == "does-not-exist"));

    let manual = DependencyRequest {
        project: None,
        version: Some("1.20.1".to_string()),
        name: Some("Minecraft".to_string()),
        dependency_type: DependencyType::Required,
    };
    let release = upload(&ctx, &modder, sodium.id, "0.2.0", vec![manual], vec![jar("sodium.jar")])
        .await
        .unwrap();
    assert_eq!(release.dependencies[0].external_name.as_deref(), Some("Minecraft"));
    assert!(!release.dependencies[0].is_linked());
}

#[tokio::test]
async fn test_duplicate_file_names_are_rejected_before_storing() {
    let ctx = TestContext::new().await;
    let modder = ctx.user("jellysquid").await;
    let sodium = ctx.insert_project(&modder, "sodium", ApprovalStatus::Approved).await;

    let result = upload(
        &ctx,
        &modder,
        sodium.id,
        "0.1.0",
        vec![],
        vec![jar("sodium.jar"), jar("sodium.jar")],
    )
    .await;

    assert!(matches!(result, Err(AppError::DuplicateFileName(name)) if name == "sodium.jar"));
    assert!(ctx.store.list_versions(sodium.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_only_members_manage_versions() {
    let ctx = TestContext::new().await;
    let modder = ctx.user("jellysquid").await;
    let stranger = ctx.user("griefer").await;
    let sodium = ctx.insert_project(&modder, "sodium", ApprovalStatus::Approved).await;

    let denied = upload(&ctx, &stranger, sodium.id, "6.6.6", vec![], vec![jar("evil.jar")]).await;
    assert!(matches!(denied, Err(AppError::Forbidden)));

    let release = upload(&ctx, &modder, sodium.id, "0.1.0", vec![], vec![jar("sodium.jar")])
        .await
        .unwrap();
    let delete = ctx
        .state
        .versions
        .delete_version(&stranger, release.version.id)
        .await;
    assert!(matches!(delete, Err(AppError::Forbidden)));

    let duplicate = upload(&ctx, &modder, sodium.id, "0.1.0", vec![], vec![jar("other.jar")]).await;
    assert!(matches!(duplicate, Err(AppError::Validation(_))));

    let contributor = ctx.user("embeddedt").await;
    ctx.store
        .add_member(sodium.id, contributor.id, MemberRole::Contributor)
        .await;
    let contributed = upload(&ctx, &contributor, sodium.id, "0.2.0", vec![], vec![jar("sodium.jar")])
        .await
        .unwrap();
    assert_eq!(contributed.version.author_id, contributor.id);
    ctx.state
        .versions
        .delete_version(&contributor, contributed.version.id)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_download_checks_stored_size() {
    let ctx = TestContext::new().await;
    let modder = ctx.user("jellysquid").await;
    let sodium = ctx.insert_project(&modder, "sodium", ApprovalStatus::Approved).await;
    let release = upload(&ctx, &modder, sodium.id, "0.1.0", vec![], vec![jar("sodium.jar")])
        .await
        .unwrap();

    let (file, data) = ctx
        .state
        .versions
        .download_file(&sodium, "0.1.0", "sodium.jar")
        .await
        .unwrap();
    assert_eq!(file.id, release.files[0].id);
    assert_eq!(data, jar("sodium.jar").data);

    ctx.storage
        .store(&file.storage_path, b"truncated")
        .await
        .unwrap();
    let corrupted = ctx
        .state
        .versions
        .download_file(&sodium, "0.1.0", "sodium.jar")
        .await;
    assert!(matches!(corrupted, Err(AppError::Storage(_))));
}
