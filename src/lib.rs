pub mod auth;
pub mod config;
pub mod database;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod repository;
pub mod services;
pub mod storage;
pub mod utils;

use axum::{
    extract::DefaultBodyLimit,
    middleware::from_fn_with_state,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::handlers::{
    account, admin, auth as auth_handlers, docs, health, metrics as metrics_handlers, projects,
    user, versions, AppState,
};

/// Builds the full HTTP surface over a wired `AppState`.
pub fn create_app(state: AppState) -> Router {
    let public = Router::new()
        .route("/health", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .route("/metrics", get(metrics_handlers::metrics_handler))
        .route("/api/v1/auth/register", post(auth_handlers::register))
        .route("/api/v1/auth/login", post(auth_handlers::login))
        .route("/api/v1/auth/refresh", post(auth_handlers::refresh))
        .route("/api/v1/project-types", get(projects::list_project_types));

    // Project routes take a slug for reads and the project id for writes.
    let catalogue = Router::new()
        .route(
            "/api/v1/projects",
            get(projects::list_projects).post(projects::create_project),
        )
        .route(
            "/api/v1/projects/:project",
            get(projects::get_project)
                .patch(projects::update_project)
                .delete(projects::delete_project),
        )
        .route("/api/v1/projects/:project/submit", post(projects::submit_project))
        .route("/api/v1/projects/:project/restore", post(projects::restore_project))
        .route(
            "/api/v1/projects/:project/versions",
            get(versions::list_versions).post(versions::upload_version),
        )
        .route(
            "/api/v1/projects/:project/versions/:version/files/:file",
            get(versions::download_file),
        )
        .route("/api/v1/versions/:version", delete(versions::delete_version))
        .route("/api/v1/me", get(account::me))
        .route("/api/v1/me/quota", get(user::get_quota))
        .route("/api/v1/me/password", put(account::change_password))
        .route("/api/v1/me/email", post(account::request_email_change))
        .route("/api/v1/me/email/confirm", post(account::confirm_email_change))
        .route("/api/v1/me/deactivate", post(account::deactivate))
        .layer(from_fn_with_state(
            state.clone(),
            middleware::quota_warning_middleware,
        ));

    let admin = Router::new()
        .route("/api/v1/admin/projects/pending", get(admin::pending_queue))
        .route("/api/v1/admin/projects/:project/approve", post(admin::approve_project))
        .route("/api/v1/admin/projects/:project/reject", post(admin::reject_project))
        .route("/api/v1/admin/project-types", post(admin::create_project_type))
        .route(
            "/api/v1/admin/quotas/:scope/:id",
            get(admin::get_quota_override)
                .put(admin::set_quota_override)
                .delete(admin::clear_quota_override),
        );

    let body_limit = state.config.max_upload_size;

    Router::new()
        .merge(public)
        .merge(catalogue)
        .merge(admin)
        .merge(docs::create_docs_router())
        .layer(from_fn_with_state(
            state.clone(),
            middleware::metrics_middleware,
        ))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
