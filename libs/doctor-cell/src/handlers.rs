use std::sync::Arc;

use axum::{
    extract::{Extension, Path, State},
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::{RegisterDoctorRequest, UpdateWorkingHoursRequest};
use crate::services::doctor::DoctorDirectoryService;

#[axum::debug_handler]
pub async fn register_doctor(
    State(directory): State<Arc<DoctorDirectoryService>>,
    Extension(user): Extension<User>,
    Json(request): Json<RegisterDoctorRequest>,
) -> Result<Json<Value>, AppError> {
    if !user.is_admin() {
        return Err(AppError::Forbidden(
            "Only administrators can register doctors".to_string(),
        ));
    }

    let doctor = directory
        .register_doctor(request)
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    Ok(Json(json!({
        "success": true,
        "doctor": doctor
    })))
}

#[axum::debug_handler]
pub async fn get_doctor(
    State(directory): State<Arc<DoctorDirectoryService>>,
    Path(doctor_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let doctor = directory
        .get_doctor(doctor_id)
        .await
        .ok_or_else(|| AppError::NotFound("Doctor not found".to_string()))?;

    Ok(Json(json!(doctor)))
}

#[axum::debug_handler]
pub async fn list_doctors(
    State(directory): State<Arc<DoctorDirectoryService>>,
) -> Result<Json<Value>, AppError> {
    let doctors = directory.list_doctors().await;
    let total = doctors.len();

    Ok(Json(json!({
        "doctors": doctors,
        "total": total
    })))
}

#[axum::debug_handler]
pub async fn get_working_hours(
    State(directory): State<Arc<DoctorDirectoryService>>,
    Path(doctor_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let working_hours = directory
        .working_hours(doctor_id)
        .await
        .ok_or_else(|| AppError::NotFound("Doctor not found".to_string()))?;

    Ok(Json(json!(working_hours)))
}

#[axum::debug_handler]
pub async fn update_working_hours(
    State(directory): State<Arc<DoctorDirectoryService>>,
    Path(doctor_id): Path<Uuid>,
    Extension(user): Extension<User>,
    Json(request): Json<UpdateWorkingHoursRequest>,
) -> Result<Json<Value>, AppError> {
    // Only the doctor themselves or an administrator may change the schedule
    if user.id != doctor_id && !user.is_admin() {
        return Err(AppError::Forbidden(
            "Not authorized to update this doctor's working hours".to_string(),
        ));
    }

    let doctor = directory
        .update_working_hours(doctor_id, request.working_hours)
        .await
        .map_err(|e| {
            if e.to_string().contains("not found") {
                AppError::NotFound("Doctor not found".to_string())
            } else {
                AppError::ValidationError(e.to_string())
            }
        })?;

    Ok(Json(json!({
        "success": true,
        "doctor": doctor
    })))
}
