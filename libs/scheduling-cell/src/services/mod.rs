pub mod availability;
pub mod booking;
pub mod conflict;
pub mod lifecycle;
pub mod slots;

pub use availability::AvailabilityService;
pub use booking::AppointmentBookingService;
pub use conflict::ConflictDetector;
pub use lifecycle::AppointmentLifecycleService;
pub use slots::SlotGenerator;
