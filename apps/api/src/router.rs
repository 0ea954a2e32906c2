use std::sync::Arc;

use axum::{
    Router,
    routing::get,
};

use doctor_cell::router::doctor_routes;
use doctor_cell::services::doctor::DoctorDirectoryService;
use patient_cell::router::patient_routes;
use patient_cell::services::patient::PatientRegistryService;
use scheduling_cell::router::{appointment_routes, availability_routes};
use scheduling_cell::services::availability::AvailabilityService;
use scheduling_cell::services::booking::{AppointmentBookingService, BookingValidationRules};
use scheduling_cell::store::{AppointmentStore, InMemoryAppointmentStore};
use shared_config::AppConfig;

pub fn create_router(config: Arc<AppConfig>) -> Router {
    let doctors = Arc::new(DoctorDirectoryService::with_default_slot_minutes(
        config.default_slot_minutes,
    ));
    let patients = Arc::new(PatientRegistryService::new());
    let store: Arc<dyn AppointmentStore> = Arc::new(InMemoryAppointmentStore::new());

    let availability = Arc::new(AvailabilityService::new(doctors.clone(), store.clone()));
    let booking = Arc::new(AppointmentBookingService::with_rules(
        store,
        doctors.clone(),
        patients.clone(),
        BookingValidationRules {
            max_advance_booking_days: config.max_advance_booking_days,
        },
    ));

    Router::new()
        .route("/", get(|| async { "Clinic scheduling API is running!" }))
        .nest(
            "/doctors",
            doctor_routes(doctors).merge(availability_routes(availability)),
        )
        .nest("/patients", patient_routes(patients))
        .nest("/appointments", appointment_routes(booking))
}
