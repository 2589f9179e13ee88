//! Staff point operations: budgeted awards, manual and bulk adjustments,
//! store counter checkout, event gate check-in and daily attendance.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::domain::{
    AdminPermission, AttendanceRecord, EventSession, Notification, NotificationKind, Student,
};
use super::state::{record_id, SchoolError, SchoolState};
use crate::rewards::currency::format_dollars;
use crate::rewards::ledger::{AwardDecision, YearMonth};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdjustmentMode {
    Add,
    Deduct,
}

/// Per-date attendance run result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttendanceSummary {
    pub date: NaiveDate,
    pub points_per_student: i64,
    pub reason: String,
    pub present: usize,
    pub absent: usize,
    pub skipped: usize,
}

impl AttendanceSummary {
    pub fn message(&self) -> String {
        let processed = self.present + self.absent;
        if processed == 0 {
            return format!(
                "Report processed but no new data added for {}. (Records may already exist)",
                self.date
            );
        }
        format!(
            "Processed {processed} students for {}. ({} Present, {} Absent)",
            self.date, self.present, self.absent
        )
    }
}

fn notification(
    title: &str,
    message: String,
    kind: NotificationKind,
    now: NaiveDateTime,
) -> Notification {
    Notification {
        id: record_id("notif"),
        title: title.to_string(),
        message,
        date: now,
        read: false,
        kind,
    }
}

fn credit(
    student: &mut Student,
    points: i64,
    reason: &str,
    awarded_by: Option<&str>,
    now: NaiveDateTime,
) {
    student.total_points = student.total_points.saturating_add(points).max(0);
    student.attendance_history.push(AttendanceRecord {
        date: now.date(),
        present: true,
        points_awarded: points,
        reason: Some(reason.to_string()),
        awarded_by: awarded_by.map(str::to_string),
    });
}

fn reason_or<'a>(reason: Option<&'a str>, fallback: &'a str) -> &'a str {
    match reason.map(str::trim) {
        Some(reason) if !reason.is_empty() => reason,
        _ => fallback,
    }
}

impl SchoolState {
    /// Awards points against the admin's monthly budget.
    pub fn award_points(
        &mut self,
        admin_id: &str,
        student_id: &str,
        points: i64,
        reason: Option<&str>,
        now: NaiveDateTime,
    ) -> Result<String, SchoolError> {
        if points <= 0 {
            return Err(SchoolError::InvalidAmount);
        }
        let admin = self.authorized(admin_id, AdminPermission::AwardPoints)?;
        let admin_name = admin.name.clone();
        let student_name = self.student(student_id)?.name.clone();

        let updated = match admin.budget.check_award(points, YearMonth::of(now.date())) {
            AwardDecision::Allowed { updated } => updated,
            AwardDecision::Denied { remaining_points } => {
                return Err(SchoolError::BudgetExceeded { remaining_points });
            }
        };

        self.admin_mut(admin_id)?.budget = updated;

        let amount = format_dollars(points);
        let student = self.student_mut(student_id)?;
        credit(
            student,
            points,
            reason_or(reason, "Teacher Award"),
            Some(admin_id),
            now,
        );
        student.notify(notification(
            "Cougar Bucks Received!",
            format!(
                "You received {amount} from {admin_name}. Reason: {}.",
                reason_or(reason, "General Award")
            ),
            NotificationKind::General,
            now,
        ));

        Ok(format!("Awarded {amount} to {student_name}."))
    }

    /// Manual add/deduct from the student directory; balances never go negative.
    pub fn adjust_points(
        &mut self,
        admin_id: &str,
        student_id: &str,
        mode: AdjustmentMode,
        points: i64,
        reason: &str,
        now: NaiveDateTime,
    ) -> Result<String, SchoolError> {
        if points <= 0 {
            return Err(SchoolError::InvalidAmount);
        }
        self.authorized(admin_id, AdminPermission::StudentDirectory)?;

        let amount = format_dollars(points);
        let reason = reason_or(Some(reason), "Manual Adjustment");
        let (signed, title, kind, verb) = match mode {
            AdjustmentMode::Add => (
                points,
                "Cougar Bucks Received!",
                NotificationKind::General,
                "Received",
            ),
            AdjustmentMode::Deduct => (
                -points,
                "Account Adjusted",
                NotificationKind::Purchase,
                "Deducted",
            ),
        };

        let student = self.student_mut(student_id)?;
        credit(student, signed, reason, Some(admin_id), now);
        student.notify(notification(
            title,
            format!("{verb} {amount}: {reason}"),
            kind,
            now,
        ));

        let name = &student.name;
        Ok(match mode {
            AdjustmentMode::Add => format!("Successfully added {amount} to {name}'s account."),
            AdjustmentMode::Deduct => {
                format!("Successfully deducted {amount} from {name}'s account.")
            }
        })
    }

    /// Applies the same signed adjustment to every listed student.
    pub fn bulk_adjust(
        &mut self,
        admin_id: &str,
        student_ids: &[String],
        points: i64,
        reason: Option<&str>,
        now: NaiveDateTime,
    ) -> Result<String, SchoolError> {
        if points == 0 {
            return Err(SchoolError::InvalidAmount);
        }
        self.authorized(admin_id, AdminPermission::StudentDirectory)?;
        for id in student_ids {
            self.student(id)?;
        }

        let reason = reason_or(reason, "Bulk Adjustment");
        let amount = format_dollars(points.saturating_abs());
        let (title, verb) = if points > 0 {
            ("Cougar Bucks Earned!", "received")
        } else {
            ("Adjustment", "lost")
        };

        for student in self
            .students
            .iter_mut()
            .filter(|student| student_ids.contains(&student.id))
        {
            credit(student, points, reason, Some(admin_id), now);
            student.notify(notification(
                title,
                format!("You {verb} {amount}. Reason: {reason}."),
                NotificationKind::General,
                now,
            ));
        }

        Ok(format!(
            "Successfully adjusted {amount} for {} students.",
            student_ids.len()
        ))
    }

    /// Spends points at the school store counter.
    pub fn point_checkout(
        &mut self,
        admin_id: &str,
        student_id: &str,
        points: i64,
        reason: Option<&str>,
        now: NaiveDateTime,
    ) -> Result<String, SchoolError> {
        if points <= 0 {
            return Err(SchoolError::InvalidAmount);
        }
        self.authorized(admin_id, AdminPermission::PointCheckout)?;

        let student = self.student_mut(student_id)?;
        if student.total_points < points {
            return Err(SchoolError::InsufficientFunds {
                balance: student.total_points,
            });
        }

        let amount = format_dollars(points);
        let reason = reason_or(reason, "School Store Purchase");
        credit(student, -points, reason, None, now);
        student.notify(notification(
            "Cougar Bucks Spent",
            format!("Deducted {amount} from your balance for: {reason}."),
            NotificationKind::Purchase,
            now,
        ));

        Ok(format!("Successfully deducted {amount} from {}.", student.name))
    }

    pub fn open_event(
        &mut self,
        admin_id: &str,
        name: Option<&str>,
        reward_points: i64,
    ) -> Result<&EventSession, SchoolError> {
        if reward_points <= 0 {
            return Err(SchoolError::InvalidAmount);
        }
        self.authorized(admin_id, AdminPermission::EventCheckin)?;

        self.events.push(EventSession {
            id: record_id("evt"),
            name: reason_or(name, "School Event").to_string(),
            reward_points,
            opened_by: admin_id.to_string(),
            checked_in: Vec::new(),
        });
        self.events.last().ok_or(SchoolError::EventNotFound)
    }

    /// Scans a student card at the event gate; each student is rewarded once per session.
    pub fn event_check_in(
        &mut self,
        event_id: &str,
        student_id: &str,
        now: NaiveDateTime,
    ) -> Result<String, SchoolError> {
        let event = self
            .events
            .iter()
            .find(|event| event.id == event_id)
            .ok_or(SchoolError::EventNotFound)?
            .clone();
        let student = self
            .students
            .iter_mut()
            .find(|student| student.id == student_id)
            .ok_or(SchoolError::CardNotRecognized)?;
        if event.checked_in.iter().any(|id| id == student_id) {
            return Err(SchoolError::AlreadyCheckedIn {
                name: student.name.clone(),
            });
        }

        let amount = format_dollars(event.reward_points);
        credit(
            student,
            event.reward_points,
            &event.name,
            Some(&event.opened_by),
            now,
        );
        student.notify(notification(
            "Event Reward!",
            format!("You earned {amount} for attending: {}.", event.name),
            NotificationKind::General,
            now,
        ));
        let message = format!("Checked in {} (+{amount})", student.name);

        if let Some(session) = self.events.iter_mut().find(|e| e.id == event_id) {
            session.checked_in.push(student_id.to_string());
        }
        Ok(message)
    }

    /// Records a day's attendance; students already recorded for `date` are left alone.
    pub fn mark_attendance(
        &mut self,
        admin_id: &str,
        date: NaiveDate,
        present_ids: &[String],
        now: NaiveDateTime,
    ) -> Result<AttendanceSummary, SchoolError> {
        self.authorized(admin_id, AdminPermission::Attendance)?;
        for id in present_ids {
            self.student(id)?;
        }

        let day = self.calendar.day_points(date);
        let mut summary = AttendanceSummary {
            date,
            points_per_student: day.points,
            reason: day.reason.clone(),
            present: 0,
            absent: 0,
            skipped: 0,
        };

        for student in &mut self.students {
            if student.has_attendance_on(date) {
                summary.skipped += 1;
                continue;
            }

            let present = present_ids.contains(&student.id);
            let points = if present { day.points } else { 0 };
            student.total_points = student.total_points.saturating_add(points);
            student.attendance_history.push(AttendanceRecord {
                date,
                present,
                points_awarded: points,
                reason: Some(if present { day.reason.clone() } else { "Absent".to_string() }),
                awarded_by: None,
            });

            if present {
                summary.present += 1;
                if points > 0 {
                    student.notify(notification(
                        "Cougar Bucks Earned!",
                        format!(
                            "You earned {} for attendance on {date}.",
                            format_dollars(points)
                        ),
                        NotificationKind::General,
                        now,
                    ));
                }
            } else {
                summary.absent += 1;
            }
        }

        Ok(summary)
    }
}
