use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::handlers::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::health::liveness,
        crate::handlers::projects::list_project_types,
        crate::handlers::projects::list_projects,
        crate::handlers::projects::get_project,
        crate::handlers::user::get_quota,
    ),
    components(
        schemas(
            crate::models::ApprovalStatus,
            crate::models::Project,
            crate::models::ProjectType,
            crate::models::ProjectVersion,
            crate::models::ProjectFile,
            crate::models::Dependency,
            crate::models::DependencyType,
            crate::models::QuotaLimitSet,
            crate::models::UserResponse,
            crate::models::UserRole,
        )
    ),
    tags(
        (name = "projects", description = "Public project catalogue"),
        (name = "user", description = "Signed-in user endpoints"),
        (name = "health", description = "Health check endpoints")
    ),
    info(
        title = "Project Hosting API",
        version = "0.1.0",
        description = "Hosting backend for game mods and plugins with review and quota enforcement"
    )
)]
pub struct ApiDoc;

pub fn create_docs_router() -> Router<AppState> {
    Router::new().merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
