use std::env;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// How far into the future a booking may be placed.
    pub max_advance_booking_days: i64,
    /// Slot granularity used when a doctor profile does not set one.
    pub default_slot_minutes: u16,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            host: env::var("CLINIC_API_HOST").unwrap_or_else(|_| {
                warn!("CLINIC_API_HOST not set, binding 0.0.0.0");
                "0.0.0.0".to_string()
            }),
            port: env::var("CLINIC_API_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or_else(|| {
                    warn!("CLINIC_API_PORT not set or invalid, using 3000");
                    3000
                }),
            max_advance_booking_days: env::var("MAX_ADVANCE_BOOKING_DAYS")
                .ok()
                .and_then(|d| d.parse().ok())
                .unwrap_or(90),
            default_slot_minutes: env::var("DEFAULT_SLOT_MINUTES")
                .ok()
                .and_then(|m| m.parse().ok())
                .unwrap_or(30),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            max_advance_booking_days: 90,
            default_slot_minutes: 30,
        }
    }
}
