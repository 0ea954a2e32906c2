// libs/scheduling-cell/src/services/availability.rs
use chrono::NaiveDate;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use doctor_cell::services::doctor::DoctorDirectoryService;

use crate::models::{SchedulingError, Slot, TimeRange};
use crate::services::conflict::ConflictDetector;
use crate::services::slots::SlotGenerator;
use crate::store::AppointmentStore;

/// Read-only composition of slot generation and conflict detection.
///
/// This never reserves anything: a slot reported free here can be taken by
/// another caller before this caller books. The booking service re-validates
/// inside its serialization scope, which is where that race is resolved.
pub struct AvailabilityService {
    doctors: Arc<DoctorDirectoryService>,
    store: Arc<dyn AppointmentStore>,
}

impl AvailabilityService {
    pub fn new(doctors: Arc<DoctorDirectoryService>, store: Arc<dyn AppointmentStore>) -> Self {
        Self { doctors, store }
    }

    /// The currently bookable slots for a doctor on a date, in chronological
    /// order.
    pub async fn available_slots(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<Slot>, SchedulingError> {
        debug!("Resolving available slots for doctor {} on {}", doctor_id, date);

        let policy = self
            .doctors
            .working_hours(doctor_id)
            .await
            .ok_or(SchedulingError::NotFound("doctor"))?;

        let booked = self.store.for_doctor_on(doctor_id, date).await?;

        let free: Vec<Slot> = SlotGenerator::generate(&policy, date)
            .into_iter()
            .filter(|slot| {
                let candidate = TimeRange {
                    date,
                    start: slot.start,
                    end: slot.end,
                };
                !ConflictDetector::conflicts_with_any(&candidate, doctor_id, &booked, None)
            })
            .collect();

        debug!("Found {} available slots", free.len());
        Ok(free)
    }
}
