use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use shared_models::auth::{Role, User};
use shared_models::error::AppError;

use crate::models::{
    Appointment, AppointmentSearchQuery, AppointmentStatus, CreateAppointmentRequest,
    RescheduleAppointmentRequest, SchedulingError, TransitionStatusRequest,
    UpdateAppointmentRequest,
};
use crate::services::availability::AvailabilityService;
use crate::services::booking::AppointmentBookingService;

fn scheduling_error(e: SchedulingError) -> AppError {
    match e {
        SchedulingError::InvalidInput(msg) => AppError::BadRequest(msg),
        SchedulingError::NotFound(what) => AppError::NotFound(format!("{} not found", what)),
        SchedulingError::Conflict => AppError::Conflict("Slot already booked".to_string()),
        SchedulingError::InvalidTransition { from, to } => AppError::BadRequest(format!(
            "Invalid status transition from {} to {}",
            from, to
        )),
        SchedulingError::ConcurrentModification => AppError::Conflict(
            "Appointment was modified by another request, please retry".to_string(),
        ),
        SchedulingError::Storage(msg) => AppError::Internal(msg),
    }
}

fn is_participant(user: &User, appointment: &Appointment) -> bool {
    user.is_admin() || user.id == appointment.patient_id || user.id == appointment.doctor_id
}

#[derive(Debug, Deserialize)]
pub struct SlotsQuery {
    pub date: NaiveDate,
}

#[axum::debug_handler]
pub async fn get_available_slots(
    State(availability): State<Arc<AvailabilityService>>,
    Path(doctor_id): Path<Uuid>,
    Query(query): Query<SlotsQuery>,
) -> Result<Json<Value>, AppError> {
    if query.date < Utc::now().date_naive() {
        return Err(AppError::BadRequest(
            "Cannot list availability for a past date".to_string(),
        ));
    }

    let slots = availability
        .available_slots(doctor_id, query.date)
        .await
        .map_err(scheduling_error)?;

    let total = slots.len();
    Ok(Json(json!({
        "doctor_id": doctor_id,
        "date": query.date,
        "slots": slots,
        "total": total
    })))
}

#[axum::debug_handler]
pub async fn book_appointment(
    State(booking): State<Arc<AppointmentBookingService>>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    // Only the booking patient themselves or an administrator may create
    if !user.is_admin() && user.id != request.patient_id {
        return Err(AppError::Forbidden(
            "Only the booking patient or an administrator can create an appointment".to_string(),
        ));
    }

    let appointment = booking
        .book_appointment(request)
        .await
        .map_err(scheduling_error)?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment
    })))
}

#[axum::debug_handler]
pub async fn get_appointment(
    State(booking): State<Arc<AppointmentBookingService>>,
    Path(appointment_id): Path<Uuid>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let appointment = booking
        .get_appointment(appointment_id)
        .await
        .map_err(scheduling_error)?;

    if !is_participant(&user, &appointment) {
        return Err(AppError::Forbidden(
            "Not authorized to view this appointment".to_string(),
        ));
    }

    Ok(Json(json!(appointment)))
}

#[axum::debug_handler]
pub async fn update_appointment(
    State(booking): State<Arc<AppointmentBookingService>>,
    Path(appointment_id): Path<Uuid>,
    Extension(user): Extension<User>,
    Json(request): Json<UpdateAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let current = booking
        .get_appointment(appointment_id)
        .await
        .map_err(scheduling_error)?;

    if !is_participant(&user, &current) {
        return Err(AppError::Forbidden(
            "Not authorized to update this appointment".to_string(),
        ));
    }
    if request.payment_status.is_some() && !user.is_admin() {
        return Err(AppError::Forbidden(
            "Only administrators can change payment status".to_string(),
        ));
    }

    let appointment = booking
        .update_appointment(appointment_id, request)
        .await
        .map_err(scheduling_error)?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment
    })))
}

#[axum::debug_handler]
pub async fn reschedule_appointment(
    State(booking): State<Arc<AppointmentBookingService>>,
    Path(appointment_id): Path<Uuid>,
    Extension(user): Extension<User>,
    Json(request): Json<RescheduleAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let current = booking
        .get_appointment(appointment_id)
        .await
        .map_err(scheduling_error)?;

    if !is_participant(&user, &current) {
        return Err(AppError::Forbidden(
            "Not authorized to reschedule this appointment".to_string(),
        ));
    }

    let outcome = booking
        .reschedule_appointment(appointment_id, request)
        .await
        .map_err(scheduling_error)?;

    Ok(Json(json!({
        "success": true,
        "appointment": outcome.appointment,
        "superseded": outcome.superseded
    })))
}

#[axum::debug_handler]
pub async fn cancel_appointment(
    State(booking): State<Arc<AppointmentBookingService>>,
    Path(appointment_id): Path<Uuid>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let current = booking
        .get_appointment(appointment_id)
        .await
        .map_err(scheduling_error)?;

    if !user.is_admin() && user.id != current.patient_id {
        return Err(AppError::Forbidden(
            "Not authorized to cancel this appointment".to_string(),
        ));
    }

    let appointment = booking
        .cancel_appointment(appointment_id)
        .await
        .map_err(scheduling_error)?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment
    })))
}

#[axum::debug_handler]
pub async fn transition_status(
    State(booking): State<Arc<AppointmentBookingService>>,
    Path(appointment_id): Path<Uuid>,
    Extension(user): Extension<User>,
    Json(request): Json<TransitionStatusRequest>,
) -> Result<Json<Value>, AppError> {
    let current = booking
        .get_appointment(appointment_id)
        .await
        .map_err(scheduling_error)?;

    if !is_participant(&user, &current) {
        return Err(AppError::Forbidden(
            "Not authorized to change this appointment".to_string(),
        ));
    }
    // Completion is the treating side's call, not the patient's
    if request.status == AppointmentStatus::Completed && user.role == Role::Patient {
        return Err(AppError::Forbidden(
            "Only the doctor or an administrator can mark an appointment completed".to_string(),
        ));
    }

    let appointment = booking
        .transition_status(appointment_id, request.status)
        .await
        .map_err(scheduling_error)?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment
    })))
}

#[axum::debug_handler]
pub async fn list_patient_appointments(
    State(booking): State<Arc<AppointmentBookingService>>,
    Path(patient_id): Path<Uuid>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    if !user.is_admin() && user.id != patient_id {
        return Err(AppError::Forbidden(
            "Not authorized to view this patient's appointments".to_string(),
        ));
    }

    let appointments = booking
        .search_appointments(AppointmentSearchQuery {
            patient_id: Some(patient_id),
            ..Default::default()
        })
        .await
        .map_err(scheduling_error)?;

    let total = appointments.len();
    Ok(Json(json!({
        "appointments": appointments,
        "total": total
    })))
}

#[axum::debug_handler]
pub async fn list_doctor_appointments(
    State(booking): State<Arc<AppointmentBookingService>>,
    Path(doctor_id): Path<Uuid>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    if !user.is_admin() && user.id != doctor_id {
        return Err(AppError::Forbidden(
            "Not authorized to view this doctor's appointments".to_string(),
        ));
    }

    let appointments = booking
        .search_appointments(AppointmentSearchQuery {
            doctor_id: Some(doctor_id),
            ..Default::default()
        })
        .await
        .map_err(scheduling_error)?;

    let total = appointments.len();
    Ok(Json(json!({
        "appointments": appointments,
        "total": total
    })))
}

#[axum::debug_handler]
pub async fn search_appointments(
    State(booking): State<Arc<AppointmentBookingService>>,
    Extension(user): Extension<User>,
    Query(mut query): Query<AppointmentSearchQuery>,
) -> Result<Json<Value>, AppError> {
    // Non-admins only ever see their own side of the calendar
    match user.role {
        Role::Admin => {}
        Role::Patient => query.patient_id = Some(user.id),
        Role::Doctor => query.doctor_id = Some(user.id),
    }

    let appointments = booking
        .search_appointments(query)
        .await
        .map_err(scheduling_error)?;

    let total = appointments.len();
    Ok(Json(json!({
        "appointments": appointments,
        "total": total
    })))
}
