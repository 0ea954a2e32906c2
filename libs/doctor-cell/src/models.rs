use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared_models::time::ClockMinutes;

pub const DAYS_PER_WEEK: usize = 7;

/// One weekday's availability window.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DayWindow {
    pub is_working: bool,
    pub start: ClockMinutes,
    pub end: ClockMinutes,
}

impl DayWindow {
    pub fn off() -> Self {
        Self {
            is_working: false,
            start: ClockMinutes::new(0).unwrap(),
            end: ClockMinutes::new(0).unwrap(),
        }
    }

    pub fn working(start: ClockMinutes, end: ClockMinutes) -> Self {
        Self {
            is_working: true,
            start,
            end,
        }
    }
}

/// Per-doctor weekly availability, indexed Monday..Sunday, plus the slot
/// granularity used when cutting the windows into bookable slots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkingHoursPolicy {
    pub days: [DayWindow; DAYS_PER_WEEK],
    pub slot_duration_minutes: u16,
}

impl Default for WorkingHoursPolicy {
    /// Monday through Friday, 09:00-17:00, 30 minute slots.
    fn default() -> Self {
        let weekday = DayWindow::working(
            ClockMinutes::from_hm(9, 0).unwrap(),
            ClockMinutes::from_hm(17, 0).unwrap(),
        );
        Self {
            days: [
                weekday,
                weekday,
                weekday,
                weekday,
                weekday,
                DayWindow::off(),
                DayWindow::off(),
            ],
            slot_duration_minutes: 30,
        }
    }
}

impl WorkingHoursPolicy {
    /// Reject zero slot durations and inverted windows on working days.
    pub fn validate(&self) -> Result<(), String> {
        if self.slot_duration_minutes == 0 {
            return Err("slot duration must be positive".to_string());
        }
        for (idx, day) in self.days.iter().enumerate() {
            if day.is_working && day.start >= day.end {
                return Err(format!(
                    "working day {} has start {} not before end {}",
                    idx, day.start, day.end
                ));
            }
        }
        Ok(())
    }

    /// The window for a calendar date, `None` when the doctor is off.
    pub fn window_for(&self, date: NaiveDate) -> Option<&DayWindow> {
        let day = &self.days[date.weekday().num_days_from_monday() as usize];
        day.is_working.then_some(day)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Doctor {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub specialty: String,
    pub working_hours: WorkingHoursPolicy,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterDoctorRequest {
    pub full_name: String,
    pub email: String,
    pub specialty: String,
    /// Defaults to Monday-Friday 09:00-17:00 when omitted.
    pub working_hours: Option<WorkingHoursPolicy>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateWorkingHoursRequest {
    pub working_hours: WorkingHoursPolicy,
}
