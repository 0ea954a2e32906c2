use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, patch, post},
    Router,
};

use shared_utils::extractor::identity_middleware;

use crate::handlers;
use crate::services::availability::AvailabilityService;
use crate::services::booking::AppointmentBookingService;

/// Availability read on the doctor resource; nested under `/doctors` by the
/// API router, alongside the doctor directory's own routes.
pub fn availability_routes(availability: Arc<AvailabilityService>) -> Router {
    Router::new()
        .route("/{doctor_id}/slots", get(handlers::get_available_slots))
        .with_state(availability)
}

pub fn appointment_routes(booking: Arc<AppointmentBookingService>) -> Router {
    // Every appointment route needs a caller identity
    Router::new()
        .route("/", post(handlers::book_appointment))
        .route("/search", get(handlers::search_appointments))
        .route(
            "/{appointment_id}",
            get(handlers::get_appointment).put(handlers::update_appointment),
        )
        .route(
            "/{appointment_id}/reschedule",
            patch(handlers::reschedule_appointment),
        )
        .route("/{appointment_id}/cancel", post(handlers::cancel_appointment))
        .route("/{appointment_id}/status", post(handlers::transition_status))
        .route(
            "/patients/{patient_id}",
            get(handlers::list_patient_appointments),
        )
        .route(
            "/doctors/{doctor_id}",
            get(handlers::list_doctor_appointments),
        )
        .layer(middleware::from_fn(identity_middleware))
        .with_state(booking)
}
