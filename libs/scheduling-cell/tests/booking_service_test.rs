use std::sync::Arc;

use assert_matches::assert_matches;
use chrono::{Duration, NaiveDate, Utc};
use uuid::Uuid;

use doctor_cell::models::{DayWindow, RegisterDoctorRequest, WorkingHoursPolicy, DAYS_PER_WEEK};
use doctor_cell::services::doctor::DoctorDirectoryService;
use patient_cell::models::RegisterPatientRequest;
use patient_cell::services::patient::PatientRegistryService;
use scheduling_cell::models::{
    AppointmentStatus, AppointmentType, CreateAppointmentRequest, RescheduleAppointmentRequest,
    SchedulingError, UpdateAppointmentRequest,
};
use scheduling_cell::services::availability::AvailabilityService;
use scheduling_cell::services::booking::{AppointmentBookingService, BookingValidationRules};
use scheduling_cell::store::{AppointmentStore, InMemoryAppointmentStore};
use shared_models::time::ClockMinutes;

fn hm(hours: u16, minutes: u16) -> ClockMinutes {
    ClockMinutes::from_hm(hours, minutes).unwrap()
}

/// Seven-day working week so tests can book on any upcoming date.
fn open_policy(start: ClockMinutes, end: ClockMinutes, slot_minutes: u16) -> WorkingHoursPolicy {
    WorkingHoursPolicy {
        days: [DayWindow::working(start, end); DAYS_PER_WEEK],
        slot_duration_minutes: slot_minutes,
    }
}

fn tomorrow() -> NaiveDate {
    Utc::now().date_naive() + Duration::days(1)
}

struct TestClinic {
    booking: Arc<AppointmentBookingService>,
    availability: AvailabilityService,
    doctor_id: Uuid,
    patient_id: Uuid,
}

impl TestClinic {
    async fn with_policy(policy: WorkingHoursPolicy) -> Self {
        let doctors = Arc::new(DoctorDirectoryService::new());
        let doctor = doctors
            .register_doctor(RegisterDoctorRequest {
                full_name: "Dr. Maya Okafor".to_string(),
                email: "maya.okafor@clinic.test".to_string(),
                specialty: "general".to_string(),
                working_hours: Some(policy),
            })
            .await
            .unwrap();

        let patients = Arc::new(PatientRegistryService::new());
        let patient = patients
            .register_patient(RegisterPatientRequest {
                full_name: "Jordan Reyes".to_string(),
                email: "jordan.reyes@example.test".to_string(),
                phone_number: None,
            })
            .await
            .unwrap();

        let store: Arc<dyn AppointmentStore> = Arc::new(InMemoryAppointmentStore::new());
        let availability = AvailabilityService::new(doctors.clone(), store.clone());
        let booking = Arc::new(AppointmentBookingService::new(store, doctors, patients));

        Self {
            booking,
            availability,
            doctor_id: doctor.id,
            patient_id: patient.id,
        }
    }

    async fn new() -> Self {
        Self::with_policy(open_policy(hm(9, 0), hm(17, 0), 30)).await
    }

    fn request(
        &self,
        date: NaiveDate,
        start: ClockMinutes,
        end: ClockMinutes,
    ) -> CreateAppointmentRequest {
        CreateAppointmentRequest {
            patient_id: self.patient_id,
            doctor_id: self.doctor_id,
            date,
            start_time: start,
            end_time: end,
            appointment_type: AppointmentType::Consultation,
            notes: None,
        }
    }
}

#[tokio::test]
async fn test_booking_creates_upcoming_unpaid_appointment() {
    let clinic = TestClinic::new().await;

    let appointment = clinic
        .booking
        .book_appointment(clinic.request(tomorrow(), hm(9, 0), hm(9, 30)))
        .await
        .unwrap();

    assert_eq!(appointment.status, AppointmentStatus::Upcoming);
    assert_eq!(appointment.doctor_id, clinic.doctor_id);
    assert_eq!(appointment.patient_id, clinic.patient_id);
    assert!(appointment.superseded_by.is_none());

    let fetched = clinic.booking.get_appointment(appointment.id).await.unwrap();
    assert_eq!(fetched.id, appointment.id);
}

#[tokio::test]
async fn test_overlapping_booking_is_rejected() {
    let clinic = TestClinic::new().await;
    let date = tomorrow();

    clinic
        .booking
        .book_appointment(clinic.request(date, hm(9, 0), hm(10, 0)))
        .await
        .unwrap();

    let overlapping = clinic
        .booking
        .book_appointment(clinic.request(date, hm(9, 30), hm(10, 30)))
        .await;
    assert_matches!(overlapping, Err(SchedulingError::Conflict));
}

#[tokio::test]
async fn test_back_to_back_bookings_both_succeed() {
    let clinic = TestClinic::new().await;
    let date = tomorrow();

    clinic
        .booking
        .book_appointment(clinic.request(date, hm(9, 0), hm(9, 30)))
        .await
        .unwrap();
    // Shares only the boundary instant with the first booking
    clinic
        .booking
        .book_appointment(clinic.request(date, hm(9, 30), hm(10, 0)))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_unknown_doctor_and_patient_are_not_found() {
    let clinic = TestClinic::new().await;

    let mut request = clinic.request(tomorrow(), hm(9, 0), hm(9, 30));
    request.doctor_id = Uuid::new_v4();
    assert_matches!(
        clinic.booking.book_appointment(request).await,
        Err(SchedulingError::NotFound("doctor"))
    );

    let mut request = clinic.request(tomorrow(), hm(9, 0), hm(9, 30));
    request.patient_id = Uuid::new_v4();
    assert_matches!(
        clinic.booking.book_appointment(request).await,
        Err(SchedulingError::NotFound("patient"))
    );
}

#[tokio::test]
async fn test_inverted_range_and_out_of_window_dates_rejected() {
    let clinic = TestClinic::new().await;
    let date = tomorrow();

    assert_matches!(
        clinic
            .booking
            .book_appointment(clinic.request(date, hm(10, 0), hm(9, 0)))
            .await,
        Err(SchedulingError::InvalidInput(_))
    );

    let yesterday = Utc::now().date_naive() - Duration::days(1);
    assert_matches!(
        clinic
            .booking
            .book_appointment(clinic.request(yesterday, hm(9, 0), hm(9, 30)))
            .await,
        Err(SchedulingError::InvalidInput(_))
    );

    let beyond_horizon = Utc::now().date_naive() + Duration::days(91);
    assert_matches!(
        clinic
            .booking
            .book_appointment(clinic.request(beyond_horizon, hm(9, 0), hm(9, 30)))
            .await,
        Err(SchedulingError::InvalidInput(_))
    );
}

#[tokio::test]
async fn test_custom_booking_horizon() {
    let doctors = Arc::new(DoctorDirectoryService::new());
    let doctor = doctors
        .register_doctor(RegisterDoctorRequest {
            full_name: "Dr. Sam Liu".to_string(),
            email: "sam.liu@clinic.test".to_string(),
            specialty: "general".to_string(),
            working_hours: Some(open_policy(hm(9, 0), hm(17, 0), 30)),
        })
        .await
        .unwrap();
    let patients = Arc::new(PatientRegistryService::new());
    let patient = patients
        .register_patient(RegisterPatientRequest {
            full_name: "Alex Kim".to_string(),
            email: "alex.kim@example.test".to_string(),
            phone_number: None,
        })
        .await
        .unwrap();
    let store: Arc<dyn AppointmentStore> = Arc::new(InMemoryAppointmentStore::new());
    let booking = AppointmentBookingService::with_rules(
        store,
        doctors,
        patients,
        BookingValidationRules {
            max_advance_booking_days: 7,
        },
    );

    let request = CreateAppointmentRequest {
        patient_id: patient.id,
        doctor_id: doctor.id,
        date: Utc::now().date_naive() + Duration::days(8),
        start_time: hm(9, 0),
        end_time: hm(9, 30),
        appointment_type: AppointmentType::Consultation,
        notes: None,
    };
    assert_matches!(
        booking.book_appointment(request).await,
        Err(SchedulingError::InvalidInput(_))
    );
}

#[tokio::test]
async fn test_availability_reflects_bookings() {
    let clinic = TestClinic::with_policy(open_policy(hm(9, 0), hm(11, 0), 30)).await;
    let date = tomorrow();

    clinic
        .booking
        .book_appointment(clinic.request(date, hm(9, 30), hm(10, 0)))
        .await
        .unwrap();

    let slots = clinic
        .availability
        .available_slots(clinic.doctor_id, date)
        .await
        .unwrap();

    // [09:30, 10:00) is taken; the other three slots remain
    assert_eq!(slots.len(), 3);
    assert_eq!(slots[0].start, hm(9, 0));
    assert_eq!(slots[1].start, hm(10, 0));
    assert_eq!(slots[2].start, hm(10, 30));
}

#[tokio::test]
async fn test_cancellation_frees_the_slot() {
    let clinic = TestClinic::with_policy(open_policy(hm(9, 0), hm(11, 0), 30)).await;
    let date = tomorrow();

    let appointment = clinic
        .booking
        .book_appointment(clinic.request(date, hm(9, 0), hm(9, 30)))
        .await
        .unwrap();
    let canceled = clinic.booking.cancel_appointment(appointment.id).await.unwrap();
    assert_eq!(canceled.status, AppointmentStatus::Canceled);

    let slots = clinic
        .availability
        .available_slots(clinic.doctor_id, date)
        .await
        .unwrap();
    assert_eq!(slots.len(), 4);

    // And the freed range is bookable again
    clinic
        .booking
        .book_appointment(clinic.request(date, hm(9, 0), hm(9, 30)))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_cancel_is_idempotent() {
    let clinic = TestClinic::new().await;

    let appointment = clinic
        .booking
        .book_appointment(clinic.request(tomorrow(), hm(9, 0), hm(9, 30)))
        .await
        .unwrap();

    let first = clinic.booking.cancel_appointment(appointment.id).await.unwrap();
    let second = clinic.booking.cancel_appointment(appointment.id).await.unwrap();
    assert_eq!(first.status, AppointmentStatus::Canceled);
    assert_eq!(second.status, AppointmentStatus::Canceled);
}

#[tokio::test]
async fn test_concurrent_identical_bookings_resolve_to_one_winner() {
    let clinic = TestClinic::new().await;
    let date = tomorrow();

    let first = clinic
        .booking
        .book_appointment(clinic.request(date, hm(9, 0), hm(10, 0)));
    let second = clinic
        .booking
        .book_appointment(clinic.request(date, hm(9, 0), hm(10, 0)));

    let (first, second) = tokio::join!(first, second);

    let successes = [&first, &second].iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1, "exactly one of two racing bookings must win");
    let loser = if first.is_ok() { second } else { first };
    assert_matches!(loser, Err(SchedulingError::Conflict));
}

#[tokio::test]
async fn test_reschedule_supersedes_and_frees_the_old_range() {
    let clinic = TestClinic::new().await;
    let date = tomorrow();

    let original = clinic
        .booking
        .book_appointment(clinic.request(date, hm(9, 0), hm(9, 30)))
        .await
        .unwrap();

    let outcome = clinic
        .booking
        .reschedule_appointment(
            original.id,
            RescheduleAppointmentRequest {
                date,
                start_time: hm(14, 0),
                end_time: hm(14, 30),
            },
        )
        .await
        .unwrap();

    assert_eq!(outcome.superseded.id, original.id);
    assert_eq!(outcome.superseded.status, AppointmentStatus::Rescheduled);
    assert_eq!(outcome.superseded.superseded_by, Some(outcome.appointment.id));
    assert_eq!(outcome.appointment.status, AppointmentStatus::Upcoming);
    assert_eq!(outcome.appointment.start, hm(14, 0));
    assert_eq!(outcome.appointment.patient_id, original.patient_id);

    // The superseded range no longer blocks the calendar
    clinic
        .booking
        .book_appointment(clinic.request(date, hm(9, 0), hm(9, 30)))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_reschedule_of_canceled_appointment_is_rejected() {
    let clinic = TestClinic::new().await;
    let date = tomorrow();

    let appointment = clinic
        .booking
        .book_appointment(clinic.request(date, hm(9, 0), hm(9, 30)))
        .await
        .unwrap();
    clinic.booking.cancel_appointment(appointment.id).await.unwrap();

    let result = clinic
        .booking
        .reschedule_appointment(
            appointment.id,
            RescheduleAppointmentRequest {
                date,
                start_time: hm(10, 0),
                end_time: hm(10, 30),
            },
        )
        .await;
    assert_matches!(result, Err(SchedulingError::InvalidTransition { .. }));
}

#[tokio::test]
async fn test_concurrent_reschedules_produce_exactly_one_replacement() {
    let clinic = TestClinic::new().await;
    let date = tomorrow();

    let appointment = clinic
        .booking
        .book_appointment(clinic.request(date, hm(9, 0), hm(9, 30)))
        .await
        .unwrap();

    let first = clinic.booking.reschedule_appointment(
        appointment.id,
        RescheduleAppointmentRequest {
            date,
            start_time: hm(14, 0),
            end_time: hm(14, 30),
        },
    );
    let second = clinic.booking.reschedule_appointment(
        appointment.id,
        RescheduleAppointmentRequest {
            date,
            start_time: hm(15, 0),
            end_time: hm(15, 30),
        },
    );

    let (first, second) = tokio::join!(first, second);

    let successes = [&first, &second].iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1, "only one reschedule may supersede the record");
    let loser = if first.is_ok() { second } else { first };
    assert!(matches!(
        loser,
        Err(SchedulingError::InvalidTransition { .. })
            | Err(SchedulingError::ConcurrentModification)
    ));

    // Exactly one record still occupies the calendar
    let active: Vec<_> = clinic
        .booking
        .search_appointments(scheduling_cell::models::AppointmentSearchQuery {
            doctor_id: Some(clinic.doctor_id),
            ..Default::default()
        })
        .await
        .unwrap()
        .into_iter()
        .filter(|a| a.status.blocks_calendar())
        .collect();
    assert_eq!(active.len(), 1);
}

#[tokio::test]
async fn test_reschedule_into_occupied_range_is_a_conflict() {
    let clinic = TestClinic::new().await;
    let date = tomorrow();

    clinic
        .booking
        .book_appointment(clinic.request(date, hm(10, 0), hm(10, 30)))
        .await
        .unwrap();
    let movable = clinic
        .booking
        .book_appointment(clinic.request(date, hm(9, 0), hm(9, 30)))
        .await
        .unwrap();

    let result = clinic
        .booking
        .reschedule_appointment(
            movable.id,
            RescheduleAppointmentRequest {
                date,
                start_time: hm(10, 0),
                end_time: hm(10, 30),
            },
        )
        .await;
    assert_matches!(result, Err(SchedulingError::Conflict));
}

#[tokio::test]
async fn test_update_can_move_within_its_own_old_range() {
    let clinic = TestClinic::new().await;
    let date = tomorrow();

    let appointment = clinic
        .booking
        .book_appointment(clinic.request(date, hm(9, 0), hm(10, 0)))
        .await
        .unwrap();

    // Shrinking into the middle of its own old range must not self-conflict
    let updated = clinic
        .booking
        .update_appointment(
            appointment.id,
            UpdateAppointmentRequest {
                start_time: Some(hm(9, 15)),
                end_time: Some(hm(9, 45)),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.start, hm(9, 15));
    assert_eq!(updated.end, hm(9, 45));
}

#[tokio::test]
async fn test_update_notes_only_leaves_schedule_untouched() {
    let clinic = TestClinic::new().await;

    let appointment = clinic
        .booking
        .book_appointment(clinic.request(tomorrow(), hm(9, 0), hm(9, 30)))
        .await
        .unwrap();

    let updated = clinic
        .booking
        .update_appointment(
            appointment.id,
            UpdateAppointmentRequest {
                notes: Some("bring previous lab results".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.start, appointment.start);
    assert_eq!(updated.end, appointment.end);
    assert_eq!(updated.notes.as_deref(), Some("bring previous lab results"));
}

#[tokio::test]
async fn test_update_move_onto_other_booking_is_a_conflict() {
    let clinic = TestClinic::new().await;
    let date = tomorrow();

    clinic
        .booking
        .book_appointment(clinic.request(date, hm(10, 0), hm(10, 30)))
        .await
        .unwrap();
    let movable = clinic
        .booking
        .book_appointment(clinic.request(date, hm(9, 0), hm(9, 30)))
        .await
        .unwrap();

    let result = clinic
        .booking
        .update_appointment(
            movable.id,
            UpdateAppointmentRequest {
                start_time: Some(hm(10, 0)),
                end_time: Some(hm(10, 30)),
                ..Default::default()
            },
        )
        .await;
    assert_matches!(result, Err(SchedulingError::Conflict));
}

#[tokio::test]
async fn test_cannot_complete_before_the_scheduled_time() {
    let clinic = TestClinic::new().await;

    let appointment = clinic
        .booking
        .book_appointment(clinic.request(tomorrow(), hm(9, 0), hm(9, 30)))
        .await
        .unwrap();

    let result = clinic
        .booking
        .transition_status(appointment.id, AppointmentStatus::Completed)
        .await;
    assert_matches!(result, Err(SchedulingError::InvalidInput(_)));
}

#[tokio::test]
async fn test_transition_to_rescheduled_requires_the_reschedule_path() {
    let clinic = TestClinic::new().await;

    let appointment = clinic
        .booking
        .book_appointment(clinic.request(tomorrow(), hm(9, 0), hm(9, 30)))
        .await
        .unwrap();

    let result = clinic
        .booking
        .transition_status(appointment.id, AppointmentStatus::Rescheduled)
        .await;
    assert_matches!(result, Err(SchedulingError::InvalidInput(_)));
}

#[tokio::test]
async fn test_canceled_appointment_cannot_be_completed() {
    let clinic = TestClinic::new().await;

    let appointment = clinic
        .booking
        .book_appointment(clinic.request(tomorrow(), hm(9, 0), hm(9, 30)))
        .await
        .unwrap();
    clinic.booking.cancel_appointment(appointment.id).await.unwrap();

    let result = clinic
        .booking
        .transition_status(appointment.id, AppointmentStatus::Completed)
        .await;
    assert_matches!(result, Err(SchedulingError::InvalidTransition { .. }));
}

#[tokio::test]
async fn test_non_working_day_has_no_availability() {
    // Default policy: Monday-Friday only
    let clinic = TestClinic::with_policy(WorkingHoursPolicy::default()).await;

    // Find the next Saturday
    let mut date = tomorrow();
    while chrono::Datelike::weekday(&date).num_days_from_monday() != 5 {
        date += Duration::days(1);
    }

    let slots = clinic
        .availability
        .available_slots(clinic.doctor_id, date)
        .await
        .unwrap();
    assert!(slots.is_empty());
}
