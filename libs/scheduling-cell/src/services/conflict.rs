// libs/scheduling-cell/src/services/conflict.rs
use uuid::Uuid;

use crate::models::{Appointment, TimeRange};

pub struct ConflictDetector;

impl ConflictDetector {
    /// Half-open interval overlap: `a.start < b.end && b.start < a.end`.
    /// Touching endpoints (`a.end == b.start`) do not overlap. This is the
    /// single overlap rule used everywhere in the scheduler.
    pub fn overlaps(a: &TimeRange, b: &TimeRange) -> bool {
        a.date == b.date && a.start < b.end && b.start < a.end
    }

    /// True if `candidate` overlaps any calendar-blocking appointment of the
    /// given doctor. `exclude` skips a record's own prior booking when
    /// re-checking a move of that record.
    pub fn conflicts_with_any(
        candidate: &TimeRange,
        doctor_id: Uuid,
        existing: &[Appointment],
        exclude: Option<Uuid>,
    ) -> bool {
        existing
            .iter()
            .filter(|a| a.doctor_id == doctor_id)
            .filter(|a| a.status.blocks_calendar())
            .filter(|a| exclude != Some(a.id))
            .any(|a| Self::overlaps(candidate, &a.range()))
    }
}
