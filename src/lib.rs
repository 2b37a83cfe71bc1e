use axum::Router;
use axum::extract::State;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

pub mod api;
pub mod app_env;
pub mod client;
pub mod db;
pub mod domain;
pub mod dto;
pub mod external_connections;
pub mod logging;
pub mod persistence;
pub mod routing_utils;

#[cfg(test)]
mod integration_test;

/// State shared by every route in the application
pub struct SharedData {
    pub ext_cxn: persistence::ExternalConnectivity,
}

pub type AppState = State<Arc<SharedData>>;

/// Assembles the application router: the API routes, the swagger UI, CORS for
/// browser clients served from other origins, and request tracing.
pub fn router(shared_data: Arc<SharedData>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app_routes = Router::new()
        .nest("/api/users", api::user::user_routes())
        .nest("/api/tasks", api::task::task_routes())
        .merge(api::swagger_main::build_documentation())
        .layer(cors);

    logging::attach_tracing_http(app_routes).with_state(shared_data)
}
