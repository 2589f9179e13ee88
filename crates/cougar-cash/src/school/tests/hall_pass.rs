use super::common::*;

use chrono::NaiveTime;

use crate::school::{HallPassKind, HallPassStatus, SchoolError};

fn clock(raw: &str) -> NaiveTime {
    NaiveTime::parse_from_str(raw, "%H:%M").expect("valid time")
}

#[test]
fn request_and_return_round_trip() {
    let mut state = seeded_state();
    let id = enroll(&mut state, "Ava Cougar");

    let pass = state
        .request_hall_pass(&id, HallPassKind::Library, monday())
        .expect("pass issued")
        .clone();
    assert!(pass.id.starts_with("HP-"));
    assert_eq!(pass.student_name, "Ava Cougar");
    assert_eq!(state.student(&id).expect("student").hall_passes_used, 1);
    assert_eq!(state.active_hall_passes().len(), 1);

    let returned = state
        .return_hall_pass(&pass.id, at("2025-10-06 09:07:00"))
        .expect("pass returned")
        .clone();
    assert_eq!(returned.status, HallPassStatus::Returned);
    assert_eq!(returned.end_time, Some(at("2025-10-06 09:07:00")));
    assert!(state.active_hall_passes().is_empty());

    assert!(matches!(
        state.return_hall_pass(&pass.id, monday()),
        Err(SchoolError::PassAlreadyReturned)
    ));
}

#[test]
fn lockout_window_blocks_requests_inclusively() {
    let mut state = seeded_state();
    let id = enroll(&mut state, "Ava Cougar");
    state
        .add_lockout(ADMIN, "Lunch", clock("11:30"), clock("12:00"))
        .expect("lockout added");

    match state.request_hall_pass(&id, HallPassKind::Restroom, at("2025-10-06 12:00:30")) {
        Err(err) => assert_eq!(
            err.to_string(),
            "Hall passes are currently restricted: Lunch. They will be available after 12:00."
        ),
        Ok(pass) => panic!("expected lockout, got {pass:?}"),
    }

    state
        .request_hall_pass(&id, HallPassKind::Restroom, at("2025-10-06 12:01:00"))
        .expect("lockout over");
}

#[test]
fn buddy_conflict_blocks_while_partner_is_out() {
    let mut state = seeded_state();
    let ava = enroll(&mut state, "Ava Cougar");
    let ben = enroll(&mut state, "Ben Prowl");
    let conflict = state
        .add_buddy_conflict(ADMIN, &ava, &ben, None)
        .expect("conflict added")
        .clone();
    assert_eq!(conflict.reason, "Restricted Buddy Group");

    let pass_id = state
        .request_hall_pass(&ava, HallPassKind::Nurse, monday())
        .expect("ava leaves")
        .id
        .clone();
    assert!(matches!(
        state.request_hall_pass(&ben, HallPassKind::Office, monday()),
        Err(SchoolError::BuddyConflict)
    ));

    state
        .return_hall_pass(&pass_id, at("2025-10-06 09:10:00"))
        .expect("ava back");
    state
        .request_hall_pass(&ben, HallPassKind::Office, at("2025-10-06 09:11:00"))
        .expect("ben may go now");

    assert!(state
        .remove_buddy_conflict(ADMIN, &conflict.id)
        .expect("removed"));
    assert!(!state
        .remove_buddy_conflict(ADMIN, &conflict.id)
        .expect("already gone"));
}

#[test]
fn pass_limit_is_enforced() {
    let mut state = seeded_state();
    let id = enroll(&mut state, "Ava Cougar");
    state
        .students
        .iter_mut()
        .find(|student| student.id == id)
        .expect("student")
        .hall_pass_limit = 1;

    let first = state
        .request_hall_pass(&id, HallPassKind::Restroom, monday())
        .expect("first pass")
        .id
        .clone();
    state.return_hall_pass(&first, monday()).expect("returned");

    match state.request_hall_pass(&id, HallPassKind::Restroom, monday()) {
        Err(SchoolError::HallPassLimitReached) => {}
        other => panic!("expected limit reached, got {other:?}"),
    }
}

#[test]
fn conflict_and_lockout_management_is_validated() {
    let mut state = seeded_state();
    let ava = enroll(&mut state, "Ava Cougar");
    let desk = restricted_admin(&mut state);

    assert!(matches!(
        state.add_buddy_conflict(ADMIN, &ava, &ava, None),
        Err(SchoolError::InvalidConflict)
    ));
    assert!(matches!(
        state.add_lockout(ADMIN, "  ", clock("08:00"), clock("08:15")),
        Err(SchoolError::InvalidLockout)
    ));
    assert!(matches!(
        state.add_lockout(&desk, "Assembly", clock("08:00"), clock("08:15")),
        Err(SchoolError::PermissionDenied(_))
    ));

    let lockout_id = state
        .add_lockout(ADMIN, "Assembly", clock("08:00"), clock("08:15"))
        .expect("lockout added")
        .id
        .clone();
    assert!(state.remove_lockout(ADMIN, &lockout_id).expect("removed"));
    assert!(state.hall_pass_lockouts.is_empty());
}

#[test]
fn scanning_an_active_pass_returns_it() {
    let mut state = seeded_state();
    let id = enroll(&mut state, "Ava Cougar");
    let pass_id = state
        .request_hall_pass(&id, HallPassKind::Library, monday())
        .expect("pass issued")
        .id
        .clone();

    let report = state.scan_code(&pass_id, at("2025-10-06 09:20:00"));

    assert!(report.result.success);
    assert_eq!(report.result.message, "Returned Ava Cougar from Library.");
    assert_eq!(report.returned_pass.as_deref(), Some(pass_id.as_str()));
    assert!(state.active_hall_passes().is_empty());

    let again = state.scan_code(&pass_id, at("2025-10-06 09:21:00"));
    assert!(!again.result.success);
    assert_eq!(again.result.message, "Code not found.");
}
