use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::{
    errors::{AppError, Result},
    handlers::AppState,
    middleware::auth::AuthenticatedUser,
    models::{ListProjectsQuery, QuotaLimitSet, QuotaScope, RejectProjectRequest},
};

#[derive(Debug, Deserialize)]
pub struct CreateProjectTypeRequest {
    pub slug: String,
    pub name: String,
}

pub async fn pending_queue(
    State(state): State<AppState>,
    AuthenticatedUser { user }: AuthenticatedUser,
    Query(query): Query<ListProjectsQuery>,
) -> Result<Json<serde_json::Value>> {
    let limit = query.limit.unwrap_or(50).clamp(1, 200);
    let offset = query.offset.unwrap_or(0).max(0);
    let projects = state.approvals.pending_queue(&user, limit, offset).await?;

    Ok(Json(json!({
        "data": projects,
        "limit": limit,
        "offset": offset
    })))
}

pub async fn approve_project(
    State(state): State<AppState>,
    AuthenticatedUser { user }: AuthenticatedUser,
    Path(project_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>> {
    let project = state.approvals.approve(&user, project_id).await?;

    Ok(Json(json!({
        "message": "Project approved",
        "data": project
    })))
}

pub async fn reject_project(
    State(state): State<AppState>,
    AuthenticatedUser { user }: AuthenticatedUser,
    Path(project_id): Path<Uuid>,
    Json(request): Json<RejectProjectRequest>,
) -> Result<Json<serde_json::Value>> {
    let project = state
        .approvals
        .reject(&user, project_id, &request.reason)
        .await?;

    Ok(Json(json!({
        "message": "Project rejected",
        "data": project
    })))
}

pub async fn create_project_type(
    State(state): State<AppState>,
    AuthenticatedUser { user }: AuthenticatedUser,
    Json(request): Json<CreateProjectTypeRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>)> {
    let project_type = state
        .projects
        .create_project_type(&user, &request.slug, &request.name)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Project type created",
            "data": project_type
        })),
    ))
}

fn parse_scope(kind: &str, id: Uuid) -> Result<QuotaScope> {
    match kind {
        "users" => Ok(QuotaScope::User(id)),
        "projects" => Ok(QuotaScope::Project(id)),
        "project-types" => Ok(QuotaScope::ProjectType(id)),
        other => Err(AppError::Validation(format!(
            "Unknown quota scope '{}', expected users, projects or project-types",
            other
        ))),
    }
}

pub async fn get_quota_override(
    State(state): State<AppState>,
    AuthenticatedUser { user }: AuthenticatedUser,
    Path((kind, id)): Path<(String, Uuid)>,
) -> Result<Json<serde_json::Value>> {
    let scope = parse_scope(&kind, id)?;
    let limits = state.quota.get_override(&user, scope).await?;

    Ok(Json(json!({
        "data": limits
    })))
}

pub async fn set_quota_override(
    State(state): State<AppState>,
    AuthenticatedUser { user }: AuthenticatedUser,
    Path((kind, id)): Path<(String, Uuid)>,
    Json(limits): Json<QuotaLimitSet>,
) -> Result<Json<serde_json::Value>> {
    let scope = parse_scope(&kind, id)?;
    state.quota.set_override(&user, scope, limits).await?;

    Ok(Json(json!({
        "message": "Quota override saved",
        "data": limits
    })))
}

pub async fn clear_quota_override(
    State(state): State<AppState>,
    AuthenticatedUser { user }: AuthenticatedUser,
    Path((kind, id)): Path<(String, Uuid)>,
) -> Result<Json<serde_json::Value>> {
    let scope = parse_scope(&kind, id)?;
    if !state.quota.clear_override(&user, scope).await? {
        return Err(AppError::NotFound);
    }

    Ok(Json(json!({
        "message": "Quota override cleared"
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_scope() {
        let id = Uuid::new_v4();
        assert_eq!(parse_scope("users", id).unwrap(), QuotaScope::User(id));
        assert_eq!(parse_scope("projects", id).unwrap(), QuotaScope::Project(id));
        assert_eq!(
            parse_scope("project-types", id).unwrap(),
            QuotaScope::ProjectType(id)
        );
        assert!(parse_scope("teams", id).is_err());
    }
}
