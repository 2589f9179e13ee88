use super::common::*;

use crate::rewards::ledger::YearMonth;
use crate::school::{AdjustmentMode, AdminPermission, SchoolError};

#[test]
fn award_debits_the_budget_and_credits_the_student() {
    let mut state = seeded_state();
    let id = enroll(&mut state, "Ava Cougar");

    let message = state
        .award_points(ADMIN, &id, 150, Some("Science fair"), monday())
        .expect("award allowed");

    assert_eq!(message, "Awarded $15.00 to Ava Cougar.");
    let student = state.student(&id).expect("student");
    assert_eq!(student.total_points, 150);
    let line = student.attendance_history.last().expect("ledger line");
    assert_eq!(line.points_awarded, 150);
    assert_eq!(line.reason.as_deref(), Some("Science fair"));
    assert_eq!(line.awarded_by.as_deref(), Some(ADMIN));
    assert_eq!(student.notifications[0].title, "Cougar Bucks Received!");

    let budget = &state.admin(ADMIN).expect("admin").budget;
    assert_eq!(budget.points_awarded_this_month, 150);
    assert_eq!(budget.remaining(YearMonth::of(monday().date())), 850);
}

#[test]
fn award_over_budget_is_denied_without_side_effects() {
    let mut state = seeded_state();
    let id = enroll(&mut state, "Ava Cougar");
    state
        .award_points(ADMIN, &id, 900, None, monday())
        .expect("first award");

    let before = state.clone();
    match state.award_points(ADMIN, &id, 200, None, monday()) {
        Err(err @ SchoolError::BudgetExceeded { remaining_points: 100 }) => {
            assert_eq!(
                err.to_string(),
                "Monthly budget exceeded. You have $10.00 remaining."
            );
        }
        other => panic!("expected budget exceeded, got {other:?}"),
    }
    assert_eq!(state, before);
}

#[test]
fn huge_award_cannot_wrap_past_the_budget() {
    let mut state = seeded_state();
    let id = enroll(&mut state, "Ava Cougar");
    state
        .award_points(ADMIN, &id, 950, None, monday())
        .expect("first award");

    let before = state.clone();
    match state.award_points(ADMIN, &id, i64::MAX, None, monday()) {
        Err(SchoolError::BudgetExceeded { remaining_points: 50 }) => {}
        other => panic!("expected budget exceeded, got {other:?}"),
    }
    assert_eq!(state, before);
    assert_eq!(
        state.admin(ADMIN).expect("admin").budget.points_awarded_this_month,
        950
    );
}

#[test]
fn extreme_bulk_adjustments_saturate_instead_of_panicking() {
    let mut state = seeded_state();
    let id = enroll(&mut state, "Ava Cougar");
    fund(&mut state, &id, 100);

    let message = state
        .bulk_adjust(ADMIN, &[id.clone()], i64::MIN, None, monday())
        .expect("bulk adjustment");
    assert!(message.starts_with("Successfully adjusted $922337203685477580.70"));
    assert_eq!(state.student(&id).expect("student").total_points, 0);

    state
        .bulk_adjust(ADMIN, &[id.clone()], i64::MAX, None, monday())
        .expect("bulk adjustment");
    state
        .bulk_adjust(ADMIN, &[id.clone()], i64::MAX, None, monday())
        .expect("bulk adjustment");
    assert_eq!(state.student(&id).expect("student").total_points, i64::MAX);
}

#[test]
fn budget_resets_lazily_in_a_new_month() {
    let mut state = seeded_state();
    let id = enroll(&mut state, "Ava Cougar");
    state
        .award_points(ADMIN, &id, 1000, None, monday())
        .expect("spend the whole budget");

    let november = at("2025-11-03 09:00:00");
    state
        .award_points(ADMIN, &id, 400, None, november)
        .expect("fresh month");

    let budget = &state.admin(ADMIN).expect("admin").budget;
    assert_eq!(budget.points_awarded_this_month, 400);
    assert_eq!(budget.last_reset_month, YearMonth::of(november.date()));
}

#[test]
fn award_requires_permission_and_positive_amount() {
    let mut state = seeded_state();
    let id = enroll(&mut state, "Ava Cougar");
    let desk = restricted_admin(&mut state);

    match state.award_points(&desk, &id, 10, None, monday()) {
        Err(SchoolError::PermissionDenied(AdminPermission::AwardPoints)) => {}
        other => panic!("expected permission denied, got {other:?}"),
    }
    assert!(matches!(
        state.award_points(ADMIN, &id, 0, None, monday()),
        Err(SchoolError::InvalidAmount)
    ));
    assert!(matches!(
        state.award_points(ADMIN, "stu-missing", 10, None, monday()),
        Err(SchoolError::StudentNotFound)
    ));
}

#[test]
fn manual_deduction_clamps_at_zero() {
    let mut state = seeded_state();
    let id = enroll(&mut state, "Ava Cougar");
    fund(&mut state, &id, 30);

    let message = state
        .adjust_points(ADMIN, &id, AdjustmentMode::Deduct, 50, "Lost library book", monday())
        .expect("deduction applied");

    assert_eq!(message, "Successfully deducted $5.00 from Ava Cougar's account.");
    let student = state.student(&id).expect("student");
    assert_eq!(student.total_points, 0);
    assert_eq!(student.notifications[0].title, "Account Adjusted");
}

#[test]
fn bulk_adjust_validates_every_student_first() {
    let mut state = seeded_state();
    let ava = enroll(&mut state, "Ava Cougar");
    let ben = enroll(&mut state, "Ben Prowl");

    let before = state.clone();
    let ids = vec![ava.clone(), "stu-missing".to_string()];
    assert!(matches!(
        state.bulk_adjust(ADMIN, &ids, 20, None, monday()),
        Err(SchoolError::StudentNotFound)
    ));
    assert_eq!(state, before);

    let ids = vec![ava.clone(), ben.clone()];
    let message = state
        .bulk_adjust(ADMIN, &ids, 20, Some("Clean classroom"), monday())
        .expect("bulk applied");
    assert_eq!(message, "Successfully adjusted $2.00 for 2 students.");
    assert_eq!(state.student(&ava).expect("ava").total_points, 20);
    assert_eq!(state.student(&ben).expect("ben").total_points, 20);
}

#[test]
fn point_checkout_reports_the_balance_when_short() {
    let mut state = seeded_state();
    let id = enroll(&mut state, "Ava Cougar");
    fund(&mut state, &id, 35);

    match state.point_checkout(ADMIN, &id, 40, None, monday()) {
        Err(err) => assert_eq!(err.to_string(), "Insufficient Funds. Student has $3.50"),
        Ok(message) => panic!("expected insufficient funds, got {message}"),
    }

    let message = state
        .point_checkout(ADMIN, &id, 30, Some("Snack"), monday())
        .expect("checkout");
    assert_eq!(message, "Successfully deducted $3.00 from Ava Cougar.");
    assert_eq!(state.student(&id).expect("student").total_points, 5);
}

#[test]
fn event_check_in_rewards_each_student_once() {
    let mut state = seeded_state();
    let id = enroll(&mut state, "Ava Cougar");
    let event_id = state
        .open_event(ADMIN, Some("Homecoming Game"), 50)
        .expect("event opened")
        .id
        .clone();

    let message = state
        .event_check_in(&event_id, &id, monday())
        .expect("first check-in");
    assert_eq!(message, "Checked in Ava Cougar (+$5.00)");

    match state.event_check_in(&event_id, &id, monday()) {
        Err(err) => assert_eq!(err.to_string(), "Ava Cougar is already checked in."),
        Ok(message) => panic!("expected duplicate check-in, got {message}"),
    }
    assert!(matches!(
        state.event_check_in(&event_id, "stu-unknown", monday()),
        Err(SchoolError::CardNotRecognized)
    ));
    assert_eq!(state.student(&id).expect("student").total_points, 50);
}

#[test]
fn attendance_uses_calendar_points_and_skips_recorded_students() {
    let mut state = seeded_state();
    let ava = enroll(&mut state, "Ava Cougar");
    let ben = enroll(&mut state, "Ben Prowl");
    let friday = date("2025-10-10");

    let summary = state
        .mark_attendance(ADMIN, friday, &[ava.clone()], monday())
        .expect("attendance recorded");

    assert_eq!(summary.points_per_student, 5);
    assert_eq!(summary.reason, "Focus Friday");
    assert_eq!((summary.present, summary.absent, summary.skipped), (1, 1, 0));
    assert_eq!(
        summary.message(),
        "Processed 2 students for 2025-10-10. (1 Present, 1 Absent)"
    );
    assert_eq!(state.student(&ava).expect("ava").total_points, 5);
    let ben_line = state
        .student(&ben)
        .expect("ben")
        .attendance_history
        .last()
        .expect("absence recorded")
        .clone();
    assert!(!ben_line.present);
    assert_eq!(ben_line.reason.as_deref(), Some("Absent"));

    let rerun = state
        .mark_attendance(ADMIN, friday, &[ava.clone(), ben.clone()], monday())
        .expect("second run");
    assert_eq!(rerun.skipped, 2);
    assert!(rerun.message().starts_with("Report processed but no new data"));
    assert_eq!(state.student(&ben).expect("ben").total_points, 0);
}

#[test]
fn halloween_attendance_pays_the_seeded_bonus() {
    let mut state = seeded_state();
    let id = enroll(&mut state, "Ava Cougar");

    let summary = state
        .mark_attendance(ADMIN, date("2025-10-31"), &[id.clone()], monday())
        .expect("attendance recorded");

    assert_eq!(summary.points_per_student, 15);
    assert_eq!(summary.reason, "Special Event: Halloween Costume Day");
}
