use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use serde_json::json;
use uuid::Uuid;

use crate::{
    errors::Result,
    handlers::AppState,
    middleware::auth::AuthenticatedUser,
    models::{CreateProjectRequest, ListProjectsQuery, UpdateProjectRequest},
};

const DEFAULT_PAGE_SIZE: i64 = 20;

#[utoipa::path(
    get,
    path = "/api/v1/project-types",
    responses((status = 200, description = "All project types", body = [ProjectType])),
    tag = "projects"
)]
pub async fn list_project_types(State(state): State<AppState>) -> Result<Json<serde_json::Value>> {
    let types = state.projects.list_project_types().await?;

    Ok(Json(json!({
        "data": types
    })))
}

/// Approved projects only.
#[utoipa::path(
    get,
    path = "/api/v1/projects",
    params(
        ("limit" = Option<i64>, Query, description = "Page size, at most 100"),
        ("offset" = Option<i64>, Query, description = "Rows to skip")
    ),
    responses((status = 200, description = "Approved projects", body = [Project])),
    tag = "projects"
)]
pub async fn list_projects(
    State(state): State<AppState>,
    Query(query): Query<ListProjectsQuery>,
) -> Result<Json<serde_json::Value>> {
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE);
    let offset = query.offset.unwrap_or(0);
    let projects = state.projects.list_public(limit, offset).await?;

    Ok(Json(json!({
        "data": projects,
        "limit": limit,
        "offset": offset
    })))
}

#[utoipa::path(
    get,
    path = "/api/v1/projects/{slug}",
    params(("slug" = String, Path, description = "Project slug")),
    responses(
        (status = 200, description = "The project", body = Project),
        (status = 404, description = "Unknown or not visible")
    ),
    tag = "projects"
)]
pub async fn get_project(
    State(state): State<AppState>,
    viewer: Option<AuthenticatedUser>,
    Path(slug): Path<String>,
) -> Result<Json<serde_json::Value>> {
    let project = state
        .projects
        .get_project(viewer.as_ref().map(|v| &v.user), &slug)
        .await?;

    Ok(Json(json!({
        "data": project
    })))
}

pub async fn create_project(
    State(state): State<AppState>,
    AuthenticatedUser { user }: AuthenticatedUser,
    Json(request): Json<CreateProjectRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>)> {
    let project = state.projects.create_project(&user, request).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Project created successfully",
            "data": project
        })),
    ))
}

pub async fn update_project(
    State(state): State<AppState>,
    AuthenticatedUser { user }: AuthenticatedUser,
    Path(project_id): Path<Uuid>,
    Json(request): Json<UpdateProjectRequest>,
) -> Result<Json<serde_json::Value>> {
    let project = state
        .projects
        .update_project(&user, project_id, request)
        .await?;

    Ok(Json(json!({
        "message": "Project updated successfully",
        "data": project
    })))
}

pub async fn submit_project(
    State(state): State<AppState>,
    AuthenticatedUser { user }: AuthenticatedUser,
    Path(project_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>> {
    let project = state.approvals.submit_for_review(&user, project_id).await?;

    Ok(Json(json!({
        "message": "Project submitted for review",
        "data": project
    })))
}

pub async fn delete_project(
    State(state): State<AppState>,
    AuthenticatedUser { user }: AuthenticatedUser,
    Path(project_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>> {
    state.projects.delete_project(&user, project_id).await?;

    Ok(Json(json!({
        "message": "Project moved to trash",
        "restore_window_days": state.config.restore_window_days
    })))
}

pub async fn restore_project(
    State(state): State<AppState>,
    AuthenticatedUser { user }: AuthenticatedUser,
    Path(project_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>> {
    let project = state.projects.restore_project(&user, project_id).await?;

    Ok(Json(json!({
        "message": "Project restored",
        "data": project
    })))
}
