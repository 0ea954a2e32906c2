pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::{DayWindow, Doctor, WorkingHoursPolicy};
pub use services::doctor::DoctorDirectoryService;
