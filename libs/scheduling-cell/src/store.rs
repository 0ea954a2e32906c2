// libs/scheduling-cell/src/store.rs
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use tracing::debug;
use uuid::Uuid;

use crate::models::{Appointment, AppointmentSearchQuery, SchedulingError};

/// Persistence contract for appointment records. The booking service is the
/// only writer; the wire/disk format behind an implementation is its own
/// concern.
#[async_trait]
pub trait AppointmentStore: Send + Sync {
    async fn insert(&self, appointment: Appointment) -> Result<(), SchedulingError>;

    async fn get(&self, id: Uuid) -> Result<Option<Appointment>, SchedulingError>;

    /// Replace an existing record, but only if its stored `updated_at` still
    /// equals `expected_updated_at`. A mismatch means another writer committed
    /// after the caller's read; the stale snapshot is refused with
    /// `ConcurrentModification` and the caller re-reads and retries.
    async fn put(
        &self,
        appointment: Appointment,
        expected_updated_at: DateTime<Utc>,
    ) -> Result<(), SchedulingError>;

    /// Atomically mark `old` as superseded and insert its replacement.
    /// Either both records land or neither does. Guarded by the same
    /// `updated_at` check as `put`, so only one of two racing supersedes
    /// of the same record can win.
    async fn supersede(
        &self,
        old: Appointment,
        replacement: Appointment,
        expected_updated_at: DateTime<Utc>,
    ) -> Result<(), SchedulingError>;

    /// All appointments for a doctor on a date, regardless of status;
    /// callers filter by status themselves.
    async fn for_doctor_on(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<Appointment>, SchedulingError>;

    async fn search(
        &self,
        query: &AppointmentSearchQuery,
    ) -> Result<Vec<Appointment>, SchedulingError>;
}

/// In-process store backed by a `RwLock`ed map; sufficient for a single-node
/// deployment and for tests.
pub struct InMemoryAppointmentStore {
    appointments: RwLock<HashMap<Uuid, Appointment>>,
}

impl InMemoryAppointmentStore {
    pub fn new() -> Self {
        Self {
            appointments: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryAppointmentStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AppointmentStore for InMemoryAppointmentStore {
    async fn insert(&self, appointment: Appointment) -> Result<(), SchedulingError> {
        let mut appointments = self.appointments.write().await;
        if appointments.contains_key(&appointment.id) {
            return Err(SchedulingError::Storage(format!(
                "duplicate appointment id {}",
                appointment.id
            )));
        }
        appointments.insert(appointment.id, appointment);
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Appointment>, SchedulingError> {
        Ok(self.appointments.read().await.get(&id).cloned())
    }

    async fn put(
        &self,
        appointment: Appointment,
        expected_updated_at: DateTime<Utc>,
    ) -> Result<(), SchedulingError> {
        let mut appointments = self.appointments.write().await;
        let stored = appointments.get(&appointment.id).ok_or_else(|| {
            SchedulingError::Storage(format!("unknown appointment id {}", appointment.id))
        })?;
        if stored.updated_at != expected_updated_at {
            return Err(SchedulingError::ConcurrentModification);
        }
        appointments.insert(appointment.id, appointment);
        Ok(())
    }

    async fn supersede(
        &self,
        old: Appointment,
        replacement: Appointment,
        expected_updated_at: DateTime<Utc>,
    ) -> Result<(), SchedulingError> {
        // Single write lock: both records become visible together.
        let mut appointments = self.appointments.write().await;
        let stored = appointments
            .get(&old.id)
            .ok_or_else(|| SchedulingError::Storage(format!("unknown appointment id {}", old.id)))?;
        if stored.updated_at != expected_updated_at {
            return Err(SchedulingError::ConcurrentModification);
        }
        if appointments.contains_key(&replacement.id) {
            return Err(SchedulingError::Storage(format!(
                "duplicate appointment id {}",
                replacement.id
            )));
        }
        appointments.insert(old.id, old);
        appointments.insert(replacement.id, replacement);
        Ok(())
    }

    async fn for_doctor_on(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<Appointment>, SchedulingError> {
        let mut matches: Vec<Appointment> = self
            .appointments
            .read()
            .await
            .values()
            .filter(|a| a.doctor_id == doctor_id && a.date == date)
            .cloned()
            .collect();
        matches.sort_by_key(|a| a.start);
        Ok(matches)
    }

    async fn search(
        &self,
        query: &AppointmentSearchQuery,
    ) -> Result<Vec<Appointment>, SchedulingError> {
        let mut matches: Vec<Appointment> = self
            .appointments
            .read()
            .await
            .values()
            .filter(|a| query.patient_id.is_none_or(|id| a.patient_id == id))
            .filter(|a| query.doctor_id.is_none_or(|id| a.doctor_id == id))
            .filter(|a| query.status.is_none_or(|s| a.status == s))
            .filter(|a| query.from_date.is_none_or(|d| a.date >= d))
            .filter(|a| query.to_date.is_none_or(|d| a.date <= d))
            .cloned()
            .collect();
        matches.sort_by_key(|a| (a.date, a.start));
        Ok(matches)
    }
}

/// Serialization scope for booking commits: one async mutex per
/// `(doctor_id, date)` key. Holding the key's guard makes the
/// read-check-insert sequence for that doctor/date atomic with respect to
/// every other booking attempt on the same key, while unrelated doctors and
/// dates proceed in parallel.
pub struct DayLockRegistry {
    locks: Mutex<HashMap<(Uuid, NaiveDate), Arc<Mutex<()>>>>,
}

impl DayLockRegistry {
    pub fn new() -> Self {
        Self {
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Take the scope for a doctor/date. The guard is RAII: dropping it
    /// (including on error or cancellation) releases the scope, so a failed
    /// commit never wedges the key.
    ///
    /// Entries for days already in the past are evicted here once released,
    /// keeping the map bounded by the active booking horizon instead of
    /// growing one key per doctor-day forever.
    pub async fn acquire(&self, doctor_id: Uuid, date: NaiveDate) -> OwnedMutexGuard<()> {
        let today = Utc::now().date_naive();
        let slot = {
            let mut locks = self.locks.lock().await;
            locks.retain(|(_, day), lock| *day >= today || Arc::strong_count(lock) > 1);
            locks
                .entry((doctor_id, date))
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        debug!("Acquiring booking scope for doctor {} on {}", doctor_id, date);
        slot.lock_owned().await
    }

    /// Number of doctor/date keys currently tracked.
    pub async fn tracked_keys(&self) -> usize {
        self.locks.lock().await.len()
    }
}

impl Default for DayLockRegistry {
    fn default() -> Self {
        Self::new()
    }
}
