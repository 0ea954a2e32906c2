use anyhow::{anyhow, Result};
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::models::{Doctor, RegisterDoctorRequest, WorkingHoursPolicy};

/// In-process registry of doctor profiles. Owns each doctor's
/// `WorkingHoursPolicy`; the scheduling cell only reads it.
pub struct DoctorDirectoryService {
    doctors: RwLock<HashMap<Uuid, Doctor>>,
    default_policy: WorkingHoursPolicy,
}

impl DoctorDirectoryService {
    pub fn new() -> Self {
        Self {
            doctors: RwLock::new(HashMap::new()),
            default_policy: WorkingHoursPolicy::default(),
        }
    }

    /// Registry whose fallback policy cuts slots of `minutes` instead of the
    /// built-in 30.
    pub fn with_default_slot_minutes(minutes: u16) -> Self {
        let default_policy = WorkingHoursPolicy {
            slot_duration_minutes: minutes,
            ..WorkingHoursPolicy::default()
        };
        Self {
            doctors: RwLock::new(HashMap::new()),
            default_policy,
        }
    }

    pub async fn register_doctor(&self, request: RegisterDoctorRequest) -> Result<Doctor> {
        debug!("Registering doctor profile for: {}", request.email);

        let working_hours = request
            .working_hours
            .unwrap_or_else(|| self.default_policy.clone());
        working_hours.validate().map_err(|e| anyhow!(e))?;

        let mut doctors = self.doctors.write().await;
        if doctors.values().any(|d| d.email == request.email) {
            return Err(anyhow!("Doctor with email {} already exists", request.email));
        }

        let now = Utc::now();
        let doctor = Doctor {
            id: Uuid::new_v4(),
            full_name: request.full_name,
            email: request.email,
            specialty: request.specialty,
            working_hours,
            created_at: now,
            updated_at: now,
        };
        doctors.insert(doctor.id, doctor.clone());

        debug!("Doctor profile created with ID: {}", doctor.id);
        Ok(doctor)
    }

    pub async fn get_doctor(&self, doctor_id: Uuid) -> Option<Doctor> {
        self.doctors.read().await.get(&doctor_id).cloned()
    }

    pub async fn list_doctors(&self) -> Vec<Doctor> {
        let mut doctors: Vec<Doctor> = self.doctors.read().await.values().cloned().collect();
        doctors.sort_by(|a, b| a.full_name.cmp(&b.full_name));
        doctors
    }

    /// The scheduling core's read path for a doctor's availability policy.
    pub async fn working_hours(&self, doctor_id: Uuid) -> Option<WorkingHoursPolicy> {
        self.doctors
            .read()
            .await
            .get(&doctor_id)
            .map(|d| d.working_hours.clone())
    }

    pub async fn update_working_hours(
        &self,
        doctor_id: Uuid,
        working_hours: WorkingHoursPolicy,
    ) -> Result<Doctor> {
        debug!("Updating working hours for doctor: {}", doctor_id);

        working_hours.validate().map_err(|e| anyhow!(e))?;

        let mut doctors = self.doctors.write().await;
        let doctor = doctors
            .get_mut(&doctor_id)
            .ok_or_else(|| anyhow!("Doctor not found"))?;

        doctor.working_hours = working_hours;
        doctor.updated_at = Utc::now();
        Ok(doctor.clone())
    }
}

impl Default for DoctorDirectoryService {
    fn default() -> Self {
        Self::new()
    }
}
