// libs/scheduling-cell/src/services/booking.rs
use chrono::{DateTime, Duration, NaiveTime, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use doctor_cell::services::doctor::DoctorDirectoryService;
use patient_cell::services::patient::PatientRegistryService;
use shared_models::time::ClockMinutes;

use crate::models::{
    Appointment, AppointmentSearchQuery, AppointmentStatus, CreateAppointmentRequest,
    PaymentStatus, RescheduleAppointmentRequest, RescheduleOutcome, SchedulingError, TimeRange,
    UpdateAppointmentRequest,
};
use crate::services::conflict::ConflictDetector;
use crate::services::lifecycle::AppointmentLifecycleService;
use crate::store::{AppointmentStore, DayLockRegistry};

/// Validation bounds for where in the calendar a booking may land.
#[derive(Debug, Clone)]
pub struct BookingValidationRules {
    pub max_advance_booking_days: i64,
}

impl Default for BookingValidationRules {
    fn default() -> Self {
        Self {
            max_advance_booking_days: 90,
        }
    }
}

/// The only path that creates or moves appointments.
///
/// Every commit that could introduce an overlap runs inside the
/// per-`(doctor, date)` scope from `DayLockRegistry`: re-read the day's
/// bookings, re-run the conflict check, then write — so of two concurrent
/// overlapping attempts exactly one wins and the other observes `Conflict`.
///
/// Rewrites of an existing record (update, cancel, status transitions,
/// supersede) are additionally guarded by the store's `updated_at` check:
/// a snapshot read before another writer committed is refused with
/// `ConcurrentModification` instead of overwriting the newer state.
pub struct AppointmentBookingService {
    store: Arc<dyn AppointmentStore>,
    doctors: Arc<DoctorDirectoryService>,
    patients: Arc<PatientRegistryService>,
    locks: DayLockRegistry,
    lifecycle: AppointmentLifecycleService,
    validation_rules: BookingValidationRules,
}

impl AppointmentBookingService {
    pub fn new(
        store: Arc<dyn AppointmentStore>,
        doctors: Arc<DoctorDirectoryService>,
        patients: Arc<PatientRegistryService>,
    ) -> Self {
        Self::with_rules(store, doctors, patients, BookingValidationRules::default())
    }

    pub fn with_rules(
        store: Arc<dyn AppointmentStore>,
        doctors: Arc<DoctorDirectoryService>,
        patients: Arc<PatientRegistryService>,
        validation_rules: BookingValidationRules,
    ) -> Self {
        Self {
            store,
            doctors,
            patients,
            locks: DayLockRegistry::new(),
            lifecycle: AppointmentLifecycleService::new(),
            validation_rules,
        }
    }

    pub async fn book_appointment(
        &self,
        request: CreateAppointmentRequest,
    ) -> Result<Appointment, SchedulingError> {
        info!(
            "Booking appointment for patient {} with doctor {} on {}",
            request.patient_id, request.doctor_id, request.date
        );

        let range = TimeRange::new(request.date, request.start_time, request.end_time)?;
        self.validate_day_window(&range)?;

        if self.doctors.get_doctor(request.doctor_id).await.is_none() {
            return Err(SchedulingError::NotFound("doctor"));
        }
        if !self.patients.exists(request.patient_id).await {
            return Err(SchedulingError::NotFound("patient"));
        }

        // Serialized re-check and insert for this doctor/date.
        let _scope = self.locks.acquire(request.doctor_id, range.date).await;

        let existing = self.store.for_doctor_on(request.doctor_id, range.date).await?;
        if ConflictDetector::conflicts_with_any(&range, request.doctor_id, &existing, None) {
            warn!(
                "Conflict detected for doctor {} at {}",
                request.doctor_id, range
            );
            return Err(SchedulingError::Conflict);
        }

        let now = Utc::now();
        let appointment = Appointment {
            id: Uuid::new_v4(),
            patient_id: request.patient_id,
            doctor_id: request.doctor_id,
            date: range.date,
            start: range.start,
            end: range.end,
            appointment_type: request.appointment_type,
            status: AppointmentStatus::Upcoming,
            payment_status: PaymentStatus::Unpaid,
            notes: request.notes,
            superseded_by: None,
            created_at: now,
            updated_at: now,
        };
        self.store.insert(appointment.clone()).await?;

        info!("Appointment {} booked at {}", appointment.id, range);
        Ok(appointment)
    }

    pub async fn get_appointment(&self, id: Uuid) -> Result<Appointment, SchedulingError> {
        self.store
            .get(id)
            .await?
            .ok_or(SchedulingError::NotFound("appointment"))
    }

    /// Partial update. A change of doctor, date or time re-runs the conflict
    /// check against everyone except the record itself, under the target
    /// day's serialization scope.
    pub async fn update_appointment(
        &self,
        id: Uuid,
        request: UpdateAppointmentRequest,
    ) -> Result<Appointment, SchedulingError> {
        let current = self.get_appointment(id).await?;
        let observed = current.updated_at;

        let new_doctor = request.doctor_id.unwrap_or(current.doctor_id);
        let new_range = TimeRange::new(
            request.date.unwrap_or(current.date),
            request.start_time.unwrap_or(current.start),
            request.end_time.unwrap_or(current.end),
        )?;
        let moves = new_doctor != current.doctor_id || new_range != current.range();

        let mut updated = current.clone();
        if let Some(appointment_type) = request.appointment_type {
            updated.appointment_type = appointment_type;
        }
        if let Some(payment_status) = request.payment_status {
            updated.payment_status = payment_status;
        }
        if let Some(notes) = request.notes {
            updated.notes = Some(notes);
        }

        if moves {
            if current.status != AppointmentStatus::Upcoming {
                return Err(SchedulingError::InvalidInput(format!(
                    "only upcoming appointments can be moved, this one is {}",
                    current.status
                )));
            }
            self.validate_day_window(&new_range)?;
            if new_doctor != current.doctor_id
                && self.doctors.get_doctor(new_doctor).await.is_none()
            {
                return Err(SchedulingError::NotFound("doctor"));
            }

            let _scope = self.locks.acquire(new_doctor, new_range.date).await;

            let existing = self.store.for_doctor_on(new_doctor, new_range.date).await?;
            if ConflictDetector::conflicts_with_any(&new_range, new_doctor, &existing, Some(id)) {
                return Err(SchedulingError::Conflict);
            }

            updated.doctor_id = new_doctor;
            updated.date = new_range.date;
            updated.start = new_range.start;
            updated.end = new_range.end;
            updated.updated_at = Utc::now();
            self.store.put(updated.clone(), observed).await?;

            info!("Appointment {} moved to {}", id, new_range);
            return Ok(updated);
        }

        updated.updated_at = Utc::now();
        self.store.put(updated.clone(), observed).await?;
        Ok(updated)
    }

    /// Supersede-style reschedule: the old record is marked `rescheduled`
    /// (freeing its range for future bookings) and a fresh `upcoming` record
    /// is created for the new range. Both land atomically.
    pub async fn reschedule_appointment(
        &self,
        id: Uuid,
        request: RescheduleAppointmentRequest,
    ) -> Result<RescheduleOutcome, SchedulingError> {
        let current = self.get_appointment(id).await?;
        let observed = current.updated_at;
        self.lifecycle
            .validate_transition(current.status, AppointmentStatus::Rescheduled)?;

        let new_range = TimeRange::new(request.date, request.start_time, request.end_time)?;
        self.validate_day_window(&new_range)?;

        let _scope = self.locks.acquire(current.doctor_id, new_range.date).await;

        let existing = self
            .store
            .for_doctor_on(current.doctor_id, new_range.date)
            .await?;
        if ConflictDetector::conflicts_with_any(&new_range, current.doctor_id, &existing, Some(id))
        {
            return Err(SchedulingError::Conflict);
        }

        let now = Utc::now();
        let replacement = Appointment {
            id: Uuid::new_v4(),
            patient_id: current.patient_id,
            doctor_id: current.doctor_id,
            date: new_range.date,
            start: new_range.start,
            end: new_range.end,
            appointment_type: current.appointment_type,
            status: AppointmentStatus::Upcoming,
            payment_status: current.payment_status,
            notes: current.notes.clone(),
            superseded_by: None,
            created_at: now,
            updated_at: now,
        };

        let mut superseded = current;
        superseded.status = AppointmentStatus::Rescheduled;
        superseded.superseded_by = Some(replacement.id);
        superseded.updated_at = now;

        self.store
            .supersede(superseded.clone(), replacement.clone(), observed)
            .await?;

        info!(
            "Appointment {} rescheduled to {} as {}",
            id, new_range, replacement.id
        );
        Ok(RescheduleOutcome {
            superseded,
            appointment: replacement,
        })
    }

    /// Cancel is idempotent: canceling an already-canceled appointment is a
    /// no-op success, which keeps concurrent cancel requests simple.
    pub async fn cancel_appointment(&self, id: Uuid) -> Result<Appointment, SchedulingError> {
        let current = self.get_appointment(id).await?;

        if current.status == AppointmentStatus::Canceled {
            debug!("Appointment {} already canceled", id);
            return Ok(current);
        }
        self.lifecycle
            .validate_transition(current.status, AppointmentStatus::Canceled)?;

        let observed = current.updated_at;
        let mut updated = current;
        updated.status = AppointmentStatus::Canceled;
        updated.updated_at = Utc::now();
        self.store.put(updated.clone(), observed).await?;

        info!("Appointment {} canceled", id);
        Ok(updated)
    }

    pub async fn transition_status(
        &self,
        id: Uuid,
        next: AppointmentStatus,
    ) -> Result<Appointment, SchedulingError> {
        let current = self.get_appointment(id).await?;

        if next == AppointmentStatus::Canceled {
            return self.cancel_appointment(id).await;
        }
        if next == AppointmentStatus::Rescheduled {
            // Superseding requires a replacement range; the reschedule path
            // is the only way to produce that state.
            return Err(SchedulingError::InvalidInput(
                "rescheduling requires a new time range, use the reschedule operation".to_string(),
            ));
        }
        self.lifecycle.validate_transition(current.status, next)?;

        if next == AppointmentStatus::Completed && Utc::now() < start_instant(&current) {
            return Err(SchedulingError::InvalidInput(
                "appointment cannot be completed before its scheduled time".to_string(),
            ));
        }

        let observed = current.updated_at;
        let mut updated = current;
        updated.status = next;
        updated.updated_at = Utc::now();
        self.store.put(updated.clone(), observed).await?;

        info!("Appointment {} transitioned to {}", id, next);
        Ok(updated)
    }

    pub async fn search_appointments(
        &self,
        query: AppointmentSearchQuery,
    ) -> Result<Vec<Appointment>, SchedulingError> {
        self.store.search(&query).await
    }

    fn validate_day_window(&self, range: &TimeRange) -> Result<(), SchedulingError> {
        let today = Utc::now().date_naive();
        if range.date < today {
            return Err(SchedulingError::InvalidInput(format!(
                "date {} is in the past",
                range.date
            )));
        }
        let horizon = today + Duration::days(self.validation_rules.max_advance_booking_days);
        if range.date > horizon {
            return Err(SchedulingError::InvalidInput(format!(
                "date {} is beyond the booking horizon of {} days",
                range.date, self.validation_rules.max_advance_booking_days
            )));
        }
        Ok(())
    }
}

fn start_instant(appointment: &Appointment) -> DateTime<Utc> {
    appointment
        .date
        .and_time(naive_time(appointment.start))
        .and_utc()
}

fn naive_time(clock: ClockMinutes) -> NaiveTime {
    let minutes = u32::from(clock.minutes());
    // ClockMinutes is always within 00:00..24:00
    NaiveTime::from_hms_opt(minutes / 60, minutes % 60, 0).unwrap_or(NaiveTime::MIN)
}
