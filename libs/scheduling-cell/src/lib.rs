pub mod handlers;
pub mod models;
pub mod router;
pub mod services;
pub mod store;

pub use models::{Appointment, AppointmentStatus, SchedulingError, Slot, TimeRange};
pub use services::availability::AvailabilityService;
pub use services::booking::{AppointmentBookingService, BookingValidationRules};
pub use store::{AppointmentStore, InMemoryAppointmentStore};
