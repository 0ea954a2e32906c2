use assert_matches::assert_matches;

use scheduling_cell::models::{AppointmentStatus, SchedulingError};
use scheduling_cell::services::lifecycle::AppointmentLifecycleService;

use AppointmentStatus::{Canceled, Completed, Rescheduled, Upcoming};

#[test]
fn test_upcoming_can_reach_every_other_status() {
    let lifecycle = AppointmentLifecycleService::new();

    for next in [Completed, Canceled, Rescheduled] {
        assert!(lifecycle.validate_transition(Upcoming, next).is_ok());
    }
}

#[test]
fn test_terminal_states_reject_all_transitions() {
    let lifecycle = AppointmentLifecycleService::new();

    for from in [Completed, Canceled, Rescheduled] {
        for to in [Upcoming, Completed, Canceled, Rescheduled] {
            assert_matches!(
                lifecycle.validate_transition(from, to),
                Err(SchedulingError::InvalidTransition { .. }),
                "{} -> {} should be rejected",
                from,
                to
            );
        }
    }
}

#[test]
fn test_self_transition_is_not_in_the_table() {
    let lifecycle = AppointmentLifecycleService::new();

    assert_matches!(
        lifecycle.validate_transition(Upcoming, Upcoming),
        Err(SchedulingError::InvalidTransition { .. })
    );
}

#[test]
fn test_invalid_transition_error_carries_both_states() {
    let lifecycle = AppointmentLifecycleService::new();

    let err = lifecycle.validate_transition(Completed, Canceled).unwrap_err();
    assert_eq!(
        err,
        SchedulingError::InvalidTransition {
            from: Completed,
            to: Canceled,
        }
    );
}

#[test]
fn test_blocking_statuses() {
    assert!(Upcoming.blocks_calendar());
    assert!(Completed.blocks_calendar());
    assert!(!Canceled.blocks_calendar());
    assert!(!Rescheduled.blocks_calendar());
}
