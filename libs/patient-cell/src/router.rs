use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use shared_utils::extractor::identity_middleware;

use crate::handlers;
use crate::services::patient::PatientRegistryService;

pub fn patient_routes(registry: Arc<PatientRegistryService>) -> Router {
    Router::new()
        .route("/", post(handlers::register_patient))
        .route("/{patient_id}", get(handlers::get_patient))
        .layer(middleware::from_fn(identity_middleware))
        .with_state(registry)
}
