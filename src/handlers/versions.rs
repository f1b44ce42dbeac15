use axum::{
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use uuid::Uuid;

use crate::{
    errors::{AppError, Result},
    handlers::AppState,
    middleware::auth::AuthenticatedUser,
    models::{CreateVersionRequest, UploadedFile},
};

pub async fn list_versions(
    State(state): State<AppState>,
    viewer: Option<AuthenticatedUser>,
    Path(slug): Path<String>,
) -> Result<Json<serde_json::Value>> {
    let project = state
        .projects
        .get_project(viewer.as_ref().map(|v| &v.user), &slug)
        .await?;
    let versions = state.versions.list_versions(&project).await?;

    Ok(Json(json!({
        "data": versions
    })))
}

/// Multipart upload: a `data` part with the version metadata as JSON, then one
/// part per release file. The first file becomes the primary download.
pub async fn upload_version(
    State(state): State<AppState>,
    AuthenticatedUser { user }: AuthenticatedUser,
    Path(project_id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<serde_json::Value>)> {
    let mut request: Option<CreateVersionRequest> = None;
    let mut files = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();
        let file_name = field.file_name().map(|s| s.to_string());

        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Failed to read part '{}': {}", name, e)))?;

        match (name.as_str(), file_name) {
            ("data", _) => {
                request = Some(serde_json::from_slice(&data).map_err(|e| {
                    AppError::Validation(format!("Invalid version metadata: {}", e))
                })?);
            }
            (_, Some(file_name)) => files.push(UploadedFile {
                file_name,
                data: data.to_vec(),
            }),
            (other, None) => {
                return Err(AppError::Validation(format!(
                    "Unexpected form field '{}'",
                    other
                )))
            }
        }
    }

    let request = request
        .ok_or_else(|| AppError::Validation("Missing 'data' part with version metadata".to_string()))?;

    let version = state
        .versions
        .create_version(&user, project_id, request, files)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Version uploaded successfully",
            "data": version
        })),
    ))
}

pub async fn download_file(
    State(state): State<AppState>,
    viewer: Option<AuthenticatedUser>,
    Path((slug, version_number, file_name)): Path<(String, String, String)>,
) -> Result<Response> {
    let project = state
        .projects
        .get_project(viewer.as_ref().map(|v| &v.user), &slug)
        .await?;
    let (file, data) = state
        .versions
        .download_file(&project, &version_number, &file_name)
        .await?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, file.mime_type),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", file.file_name),
            ),
        ],
        data,
    )
        .into_response())
}

pub async fn delete_version(
    State(state): State<AppState>,
    AuthenticatedUser { user }: AuthenticatedUser,
    Path(version_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>> {
    let report = state.versions.delete_version(&user, version_id).await?;

    Ok(Json(json!({
        "message": "Version deleted",
        "data": report
    })))
}
