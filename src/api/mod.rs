//! HTTP API.
//!
//! Routes mirror the resource layout of the web client: `/projects`,
//! `/tasks`, `/layers`, `/views`, `/orgs`, `/users`, `/comments` and
//! `/search`. Bodies are camelCase JSON. Errors render through
//! [`ApiError`](error::ApiError).

pub mod error;
mod handlers;
pub mod middleware;

use std::sync::Arc;

use axum::{
    extract::FromRef,
    http::{HeaderValue, Method},
    middleware::from_fn_with_state,
    routing::{get, patch, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::AppConfig;
use crate::db::Database;
use middleware::{auth_middleware, rate_limit_middleware, SecurityConfig};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub config: Arc<AppConfig>,
}

impl FromRef<AppState> for Database {
    fn from_ref(state: &AppState) -> Self {
        state.db.clone()
    }
}

/// Router with default configuration and no authentication.
pub fn create_router(db: Database) -> Router {
    create_router_with_config(db, AppConfig::default())
}

pub fn create_router_with_config(db: Database, config: AppConfig) -> Router {
    let security = config.security.clone();
    let state = AppState {
        db,
        config: Arc::new(config),
    };

    let api = Router::new()
        // Projects
        .route(
            "/projects",
            get(handlers::projects::list_projects).post(handlers::projects::create_project),
        )
        .route(
            "/projects/{id}",
            get(handlers::projects::get_project)
                .patch(handlers::projects::update_project)
                .delete(handlers::projects::delete_project),
        )
        .route("/projects/{id}/layers", patch(handlers::projects::reorder_layers))
        .route(
            "/projects/{id}/update-users",
            patch(handlers::projects::update_project_members),
        )
        // Tasks
        .route(
            "/tasks",
            get(handlers::tasks::list_tasks).post(handlers::tasks::create_task),
        )
        .route("/tasks/user/{user_id}", get(handlers::tasks::list_user_tasks))
        .route(
            "/tasks/{id}",
            get(handlers::tasks::get_task)
                .patch(handlers::tasks::update_task)
                .delete(handlers::tasks::delete_task),
        )
        .route("/tasks/{id}/layer", patch(handlers::tasks::assign_task_to_layer))
        .route("/tasks/{id}/drop", post(handlers::tasks::drop_task_onto_task))
        .route("/tasks/{id}/status", patch(handlers::tasks::update_task_status))
        .route("/tasks/{id}/parent", put(handlers::tasks::reparent_task))
        .route("/tasks/{id}/attachments", post(handlers::tasks::add_attachment))
        // Layers
        .route(
            "/layers",
            get(handlers::layers::list_layers).post(handlers::layers::create_layer),
        )
        .route("/layers/layout", get(handlers::layers::get_layout))
        .route(
            "/layers/{id}",
            patch(handlers::layers::rename_layer).delete(handlers::layers::delete_layer),
        )
        // Views
        .route("/views", post(handlers::views::create_view))
        .route(
            "/views/{id}",
            patch(handlers::views::update_view).delete(handlers::views::delete_view),
        )
        // Orgs
        .route(
            "/orgs",
            get(handlers::orgs::list_orgs).post(handlers::orgs::create_org),
        )
        .route(
            "/orgs/{id}",
            get(handlers::orgs::get_org)
                .patch(handlers::orgs::update_org)
                .delete(handlers::orgs::delete_org),
        )
        // Users
        .route(
            "/users",
            get(handlers::users::list_users).post(handlers::users::create_user),
        )
        .route(
            "/users/external/{external_id}",
            get(handlers::users::get_user_by_external_id),
        )
        .route(
            "/users/{id}",
            get(handlers::users::get_user)
                .patch(handlers::users::update_user)
                .delete(handlers::users::delete_user),
        )
        // Comments
        .route("/comments", post(handlers::comments::create_comment))
        .route(
            "/comments/{id}/soft-delete",
            patch(handlers::comments::soft_delete_comment),
        )
        // Search
        .route("/search", get(handlers::search::search));

    let api = with_security(api, &security);

    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .merge(api)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(&security)),
        )
        .with_state(state)
}

fn with_security(api: Router<AppState>, security: &SecurityConfig) -> Router<AppState> {
    let api = match &security.rate_limiter {
        Some(limiter) => api.layer(from_fn_with_state(limiter.clone(), rate_limit_middleware)),
        None => api,
    };
    if security.api_key.is_none() {
        return api;
    }
    api.layer(from_fn_with_state(security.clone(), auth_middleware))
}

fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    let Some(origins) = &security.cors_origins else {
        return CorsLayer::permissive();
    };
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {origin}");
                None
            }
        })
        .collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers(Any)
}
