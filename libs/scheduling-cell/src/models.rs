// libs/scheduling-cell/src/models.rs
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use shared_models::time::ClockMinutes;

// ==============================================================================
// CORE SCHEDULING MODELS
// ==============================================================================

/// A concrete half-open `[start, end)` interval on a calendar date.
///
/// Construction enforces `start < end`; both endpoints are minutes since
/// midnight, so every comparison in the scheduler is numeric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub date: NaiveDate,
    pub start: ClockMinutes,
    pub end: ClockMinutes,
}

impl TimeRange {
    pub fn new(
        date: NaiveDate,
        start: ClockMinutes,
        end: ClockMinutes,
    ) -> Result<Self, SchedulingError> {
        if start >= end {
            return Err(SchedulingError::InvalidInput(format!(
                "start time {} must be before end time {}",
                start, end
            )));
        }
        Ok(Self { date, start, end })
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}, {})", self.date, self.start, self.end)
    }
}

/// A candidate bookable interval cut from a doctor's working window.
///
/// Slots are derived, never persisted, and recomputed on every availability
/// query; a slot reported free is a snapshot, not a reservation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Slot {
    pub start: ClockMinutes,
    pub end: ClockMinutes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Upcoming,
    Completed,
    Canceled,
    Rescheduled,
}

impl AppointmentStatus {
    /// Whether an appointment in this status still occupies its time range
    /// for conflict purposes. Canceled and superseded records free the slot.
    pub fn blocks_calendar(&self) -> bool {
        matches!(self, AppointmentStatus::Upcoming | AppointmentStatus::Completed)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, AppointmentStatus::Completed | AppointmentStatus::Canceled)
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Upcoming => write!(f, "upcoming"),
            AppointmentStatus::Completed => write!(f, "completed"),
            AppointmentStatus::Canceled => write!(f, "canceled"),
            AppointmentStatus::Rescheduled => write!(f, "rescheduled"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentType {
    Consultation,
    FollowUp,
    Checkup,
    Procedure,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Paid,
    Unpaid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub date: NaiveDate,
    pub start: ClockMinutes,
    pub end: ClockMinutes,
    pub appointment_type: AppointmentType,
    pub status: AppointmentStatus,
    pub payment_status: PaymentStatus,
    pub notes: Option<String>,
    /// Set on a rescheduled record: the replacement appointment's id.
    pub superseded_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Appointment {
    pub fn range(&self) -> TimeRange {
        TimeRange {
            date: self.date,
            start: self.start,
            end: self.end,
        }
    }
}

// ==============================================================================
// REQUEST/RESPONSE MODELS
// ==============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct CreateAppointmentRequest {
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub date: NaiveDate,
    pub start_time: ClockMinutes,
    pub end_time: ClockMinutes,
    pub appointment_type: AppointmentType,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateAppointmentRequest {
    pub doctor_id: Option<Uuid>,
    pub date: Option<NaiveDate>,
    pub start_time: Option<ClockMinutes>,
    pub end_time: Option<ClockMinutes>,
    pub appointment_type: Option<AppointmentType>,
    pub payment_status: Option<PaymentStatus>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RescheduleAppointmentRequest {
    pub date: NaiveDate,
    pub start_time: ClockMinutes,
    pub end_time: ClockMinutes,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransitionStatusRequest {
    pub status: AppointmentStatus,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppointmentSearchQuery {
    pub patient_id: Option<Uuid>,
    pub doctor_id: Option<Uuid>,
    pub status: Option<AppointmentStatus>,
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
}

/// Result of a supersede-style reschedule: the old record, now marked
/// `rescheduled`, and its replacement.
#[derive(Debug, Clone, Serialize)]
pub struct RescheduleOutcome {
    pub superseded: Appointment,
    pub appointment: Appointment,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SchedulingError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("slot already booked")]
    Conflict,

    #[error("invalid status transition from {from} to {to}")]
    InvalidTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },

    #[error("appointment was modified by another request")]
    ConcurrentModification,

    #[error("storage error: {0}")]
    Storage(String),
}
