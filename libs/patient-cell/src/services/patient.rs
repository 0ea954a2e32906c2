use anyhow::{anyhow, Result};
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::models::{Patient, RegisterPatientRequest};

/// In-process patient registry; the booking path uses it as the identity
/// lookup for the patient side of an appointment.
pub struct PatientRegistryService {
    patients: RwLock<HashMap<Uuid, Patient>>,
}

impl PatientRegistryService {
    pub fn new() -> Self {
        Self {
            patients: RwLock::new(HashMap::new()),
        }
    }

    pub async fn register_patient(&self, request: RegisterPatientRequest) -> Result<Patient> {
        debug!("Registering patient: {}", request.email);

        let mut patients = self.patients.write().await;
        if patients.values().any(|p| p.email == request.email) {
            return Err(anyhow!("Patient with email {} already exists", request.email));
        }

        let now = Utc::now();
        let patient = Patient {
            id: Uuid::new_v4(),
            full_name: request.full_name,
            email: request.email,
            phone_number: request.phone_number,
            created_at: now,
            updated_at: now,
        };
        patients.insert(patient.id, patient.clone());
        Ok(patient)
    }

    pub async fn get_patient(&self, patient_id: Uuid) -> Option<Patient> {
        self.patients.read().await.get(&patient_id).cloned()
    }

    pub async fn exists(&self, patient_id: Uuid) -> bool {
        self.patients.read().await.contains_key(&patient_id)
    }
}

impl Default for PatientRegistryService {
    fn default() -> Self {
        Self::new()
    }
}
