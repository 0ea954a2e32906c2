use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};

use shared_utils::extractor::identity_middleware;

use crate::handlers;
use crate::services::doctor::DoctorDirectoryService;

pub fn doctor_routes(directory: Arc<DoctorDirectoryService>) -> Router {
    // Public routes (no caller identity required)
    let public_routes = Router::new()
        .route("/", get(handlers::list_doctors))
        .route("/{doctor_id}", get(handlers::get_doctor))
        .route("/{doctor_id}/working-hours", get(handlers::get_working_hours));

    // Protected routes (caller identity required)
    let protected_routes = Router::new()
        .route("/", post(handlers::register_doctor))
        .route("/{doctor_id}/working-hours", put(handlers::update_working_hours))
        .layer(middleware::from_fn(identity_middleware));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(directory)
}
