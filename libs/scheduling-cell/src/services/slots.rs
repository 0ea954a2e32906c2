// libs/scheduling-cell/src/services/slots.rs
use chrono::NaiveDate;

use doctor_cell::models::WorkingHoursPolicy;

use crate::models::Slot;

pub struct SlotGenerator;

impl SlotGenerator {
    /// Cut the working window for `date` into consecutive duration-sized
    /// slots. A trailing remainder shorter than the slot duration is dropped,
    /// never truncated. Non-working weekdays yield an empty sequence.
    ///
    /// The result is recomputed on every call; policies and bookings change
    /// between requests, so caching here would serve stale availability.
    pub fn generate(policy: &WorkingHoursPolicy, date: NaiveDate) -> Vec<Slot> {
        let Some(window) = policy.window_for(date) else {
            return Vec::new();
        };

        let step = policy.slot_duration_minutes;
        let mut slots = Vec::new();
        let mut current = window.start;

        while let Some(slot_end) = current.checked_add(step) {
            if slot_end > window.end {
                break;
            }
            slots.push(Slot {
                start: current,
                end: slot_end,
            });
            current = slot_end;
        }

        slots
    }
}
