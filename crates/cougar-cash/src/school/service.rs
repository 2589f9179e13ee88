use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;
use tracing::{debug, info, warn};

use super::admins::AdminDraft;
use super::awards::{AdjustmentMode, AttendanceSummary};
use super::catalog::StoreItemDraft;
use super::domain::{
    Admin, AdminPermission, Announcement, BuddyConflict, EventSession, HallPassKind,
    HallPassRecord, Notification, Poll, StoreItem, Student, StudentGroup, TimeLockout,
};
use super::groups::GroupDraft;
use super::orders::PendingOrder;
use super::roster::RosterImport;
use super::scanner::ScanReport;
use super::snapshot::{SnapshotError, SnapshotStore};
use super::state::{SchoolError, SchoolState};
use super::store::PurchaseReceipt;
use crate::config::RewardsConfig;
use crate::rewards::calendar::{DayEdit, DayPoints};
use crate::rewards::currency::format_dollars;
use crate::rewards::ledger::YearMonth;
use crate::rewards::redemption::PurchaseId;

/// Longest inclusive span `calendar_range` will build.
pub const MAX_CALENDAR_RANGE_DAYS: i64 = 366;

/// Controller owning the school state: every mutation runs on a working copy
/// under one lock, is saved, and only then replaces the live state.
pub struct SchoolService<S> {
    state: Mutex<SchoolState>,
    store: Arc<S>,
    rewards: RewardsConfig,
}

/// Admin budget as shown on the award screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BudgetView {
    pub admin_id: String,
    pub month: YearMonth,
    pub monthly_award_limit: i64,
    pub used_points: i64,
    pub remaining_points: i64,
    pub remaining_display: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CalendarDay {
    pub date: NaiveDate,
    #[serde(flatten)]
    pub points: DayPoints,
}

impl<S> SchoolService<S>
where
    S: SnapshotStore + 'static,
{
    /// Loads the saved snapshot, or seeds and saves a fresh school.
    pub fn open(
        store: Arc<S>,
        rewards: RewardsConfig,
        now: NaiveDateTime,
    ) -> Result<Self, SnapshotError> {
        let state = match store.load()? {
            Some(state) => {
                info!(students = state.students.len(), "school snapshot loaded");
                state
            }
            None => {
                let state = SchoolState::seeded(&rewards, now);
                store.save(&state)?;
                info!("seeded new school snapshot");
                state
            }
        };

        Ok(Self::with_state(store, state, rewards))
    }

    pub fn with_state(store: Arc<S>, state: SchoolState, rewards: RewardsConfig) -> Self {
        Self {
            state: Mutex::new(state),
            store,
            rewards,
        }
    }

    pub fn rewards(&self) -> RewardsConfig {
        self.rewards
    }

    /// Copy of the live state.
    pub fn snapshot(&self) -> SchoolState {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, SchoolState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn read<T>(
        &self,
        op: impl FnOnce(&SchoolState) -> Result<T, SchoolError>,
    ) -> Result<T, SchoolServiceError> {
        let guard = self.lock();
        Ok(op(&*guard)?)
    }

    fn mutate<T>(
        &self,
        operation: &'static str,
        op: impl FnOnce(&mut SchoolState) -> Result<T, SchoolError>,
    ) -> Result<T, SchoolServiceError> {
        let mut guard = self.lock();
        let mut working = guard.clone();
        let value = match op(&mut working) {
            Ok(value) => value,
            Err(err) => {
                debug!(operation, error = %err, "school operation rejected");
                return Err(err.into());
            }
        };

        if let Err(err) = self.store.save(&working) {
            warn!(operation, error = %err, "snapshot save failed; change discarded");
            return Err(err.into());
        }

        *guard = working;
        Ok(value)
    }

    pub fn day_points(&self, date: NaiveDate) -> DayPoints {
        self.lock().calendar.day_points(date)
    }

    /// Inclusive range; empty when `end` precedes `start`.
    pub fn calendar_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<CalendarDay>, SchoolServiceError> {
        if (end - start).num_days() >= MAX_CALENDAR_RANGE_DAYS {
            return Err(SchoolError::CalendarRangeTooLong {
                max_days: MAX_CALENDAR_RANGE_DAYS,
            }
            .into());
        }

        let guard = self.lock();
        Ok(start
            .iter_days()
            .take_while(|date| *date <= end)
            .map(|date| CalendarDay {
                date,
                points: guard.calendar.day_points(date),
            })
            .collect())
    }

    pub fn edit_calendar(
        &self,
        admin_id: &str,
        dates: &[NaiveDate],
        edit: &DayEdit,
    ) -> Result<Vec<CalendarDay>, SchoolServiceError> {
        let days = self.mutate("edit_calendar", |state| {
            state.authorized(admin_id, AdminPermission::Calendar)?;
            state.calendar.apply_edit(dates, edit);
            Ok(dates
                .iter()
                .map(|date| CalendarDay {
                    date: *date,
                    points: state.calendar.day_points(*date),
                })
                .collect::<Vec<_>>())
        })?;
        info!(admin_id, dates = dates.len(), "calendar updated");
        Ok(days)
    }

    /// Staff scanner entry point; persists any mutation the verdict carries.
    pub fn scan(&self, code: &str, now: NaiveDateTime) -> Result<ScanReport, SchoolServiceError> {
        let report = self.mutate("scan", |state| Ok(state.scan_code(code, now)))?;
        info!(
            code,
            success = report.result.success,
            verdict = ?report.redemption.verdict,
            "code scanned"
        );
        Ok(report)
    }

    pub fn budget(
        &self,
        admin_id: &str,
        now: NaiveDateTime,
    ) -> Result<BudgetView, SchoolServiceError> {
        self.read(|state| {
            let admin = state.admin(admin_id)?;
            let month = YearMonth::of(now.date());
            let remaining = admin.budget.remaining(month);
            Ok(BudgetView {
                admin_id: admin.id.clone(),
                month,
                monthly_award_limit: admin.budget.monthly_award_limit,
                used_points: admin.budget.effective_used(month),
                remaining_points: remaining,
                remaining_display: format_dollars(remaining),
            })
        })
    }

    pub fn award(
        &self,
        admin_id: &str,
        student_id: &str,
        points: i64,
        reason: Option<&str>,
        now: NaiveDateTime,
    ) -> Result<String, SchoolServiceError> {
        let message = self.mutate("award", |state| {
            state.award_points(admin_id, student_id, points, reason, now)
        })?;
        info!(admin_id, student_id, points, "points awarded");
        Ok(message)
    }

    pub fn adjust(
        &self,
        admin_id: &str,
        student_id: &str,
        mode: AdjustmentMode,
        points: i64,
        reason: &str,
        now: NaiveDateTime,
    ) -> Result<String, SchoolServiceError> {
        let message = self.mutate("adjust", |state| {
            state.adjust_points(admin_id, student_id, mode, points, reason, now)
        })?;
        info!(admin_id, student_id, points, ?mode, "points adjusted");
        Ok(message)
    }

    pub fn bulk_adjust(
        &self,
        admin_id: &str,
        student_ids: &[String],
        points: i64,
        reason: Option<&str>,
        now: NaiveDateTime,
    ) -> Result<String, SchoolServiceError> {
        let message = self.mutate("bulk_adjust", |state| {
            state.bulk_adjust(admin_id, student_ids, points, reason, now)
        })?;
        info!(admin_id, students = student_ids.len(), points, "bulk adjustment applied");
        Ok(message)
    }

    pub fn point_checkout(
        &self,
        admin_id: &str,
        student_id: &str,
        points: i64,
        reason: Option<&str>,
        now: NaiveDateTime,
    ) -> Result<String, SchoolServiceError> {
        let message = self.mutate("point_checkout", |state| {
            state.point_checkout(admin_id, student_id, points, reason, now)
        })?;
        info!(admin_id, student_id, points, "points spent at checkout");
        Ok(message)
    }

    pub fn open_event(
        &self,
        admin_id: &str,
        name: Option<&str>,
        reward_points: i64,
    ) -> Result<EventSession, SchoolServiceError> {
        self.mutate("open_event", |state| {
            state
                .open_event(admin_id, name, reward_points)
                .map(EventSession::clone)
        })
    }

    pub fn event_check_in(
        &self,
        event_id: &str,
        student_id: &str,
        now: NaiveDateTime,
    ) -> Result<String, SchoolServiceError> {
        self.mutate("event_check_in", |state| {
            state.event_check_in(event_id, student_id, now)
        })
    }

    pub fn mark_attendance(
        &self,
        admin_id: &str,
        date: NaiveDate,
        present_ids: &[String],
        now: NaiveDateTime,
    ) -> Result<AttendanceSummary, SchoolServiceError> {
        let summary = self.mutate("mark_attendance", |state| {
            state.mark_attendance(admin_id, date, present_ids, now)
        })?;
        info!(
            %date,
            present = summary.present,
            absent = summary.absent,
            skipped = summary.skipped,
            "attendance recorded"
        );
        Ok(summary)
    }

    pub fn student(&self, student_id: &str) -> Result<Student, SchoolServiceError> {
        self.read(|state| state.student(student_id).cloned())
    }

    pub fn add_student(
        &self,
        name: &str,
        email: &str,
        now: NaiveDateTime,
    ) -> Result<Student, SchoolServiceError> {
        let limit = self.rewards.hall_pass_limit;
        let student = self.mutate("add_student", |state| {
            state.add_student(name, email, limit, now).cloned()
        })?;
        info!(student_id = %student.id, "student enrolled");
        Ok(student)
    }

    pub fn import_roster(
        &self,
        csv: &str,
        now: NaiveDateTime,
    ) -> Result<RosterImport, SchoolServiceError> {
        let limit = self.rewards.hall_pass_limit;
        let summary = self.mutate("import_roster", |state| {
            state.import_roster(csv.as_bytes(), limit, now)
        })?;
        info!(
            added = summary.added.len(),
            duplicates = summary.duplicates,
            "roster imported"
        );
        Ok(summary)
    }

    pub fn delete_students(
        &self,
        admin_id: &str,
        student_ids: &[String],
    ) -> Result<usize, SchoolServiceError> {
        let removed = self.mutate("delete_students", |state| {
            state.delete_students(admin_id, student_ids)
        })?;
        info!(admin_id, removed, "students deleted");
        Ok(removed)
    }

    pub fn restore_student(
        &self,
        admin_id: &str,
        student_id: &str,
    ) -> Result<Student, SchoolServiceError> {
        let student = self.mutate("restore_student", |state| {
            state.restore_student(admin_id, student_id).cloned()
        })?;
        info!(admin_id, student_id, "student restored");
        Ok(student)
    }

    pub fn deleted_students(&self) -> Vec<Student> {
        self.lock().deleted_students.clone()
    }

    pub fn groups(&self) -> Vec<StudentGroup> {
        self.lock().groups.clone()
    }

    pub fn save_group(
        &self,
        admin_id: &str,
        group_id: Option<&str>,
        draft: &GroupDraft,
    ) -> Result<StudentGroup, SchoolServiceError> {
        let group = self.mutate("save_group", |state| {
            state.save_group(admin_id, group_id, draft).cloned()
        })?;
        info!(admin_id, group_id = %group.id, members = group.student_ids.len(), "group saved");
        Ok(group)
    }

    pub fn delete_group(&self, admin_id: &str, group_id: &str) -> Result<(), SchoolServiceError> {
        self.mutate("delete_group", |state| state.delete_group(admin_id, group_id))
    }

    pub fn store_items(&self) -> Vec<StoreItem> {
        self.lock().store_items.clone()
    }

    pub fn create_store_item(
        &self,
        admin_id: &str,
        draft: StoreItemDraft,
    ) -> Result<StoreItem, SchoolServiceError> {
        let item = self.mutate("create_store_item", |state| {
            state.create_store_item(admin_id, draft).cloned()
        })?;
        info!(admin_id, item_id = %item.id, cost = item.cost, "store item created");
        Ok(item)
    }

    pub fn update_store_item(
        &self,
        admin_id: &str,
        item_id: &str,
        draft: StoreItemDraft,
    ) -> Result<StoreItem, SchoolServiceError> {
        let item = self.mutate("update_store_item", |state| {
            state.update_store_item(admin_id, item_id, draft).cloned()
        })?;
        info!(admin_id, item_id, cost = item.cost, "store item updated");
        Ok(item)
    }

    pub fn delete_store_item(
        &self,
        admin_id: &str,
        item_id: &str,
    ) -> Result<(), SchoolServiceError> {
        self.mutate("delete_store_item", |state| {
            state.delete_store_item(admin_id, item_id)
        })?;
        info!(admin_id, item_id, "store item deleted");
        Ok(())
    }

    /// New admins without an explicit limit get the configured monthly limit.
    pub fn create_admin(
        &self,
        actor_id: &str,
        draft: &AdminDraft,
        now: NaiveDateTime,
    ) -> Result<Admin, SchoolServiceError> {
        let default_limit = self.rewards.monthly_award_limit;
        let admin = self.mutate("create_admin", |state| {
            state.create_admin(actor_id, draft, default_limit, now).cloned()
        })?;
        info!(actor_id, admin_id = %admin.id, "admin created");
        Ok(admin)
    }

    pub fn update_admin(
        &self,
        actor_id: &str,
        admin_id: &str,
        draft: &AdminDraft,
    ) -> Result<Admin, SchoolServiceError> {
        let admin = self.mutate("update_admin", |state| {
            state.update_admin(actor_id, admin_id, draft).cloned()
        })?;
        info!(actor_id, admin_id, "admin updated");
        Ok(admin)
    }

    pub fn delete_admin(&self, actor_id: &str, admin_id: &str) -> Result<(), SchoolServiceError> {
        self.mutate("delete_admin", |state| state.delete_admin(actor_id, admin_id))?;
        info!(actor_id, admin_id, "admin deleted");
        Ok(())
    }

    pub fn login_student(&self, code: &str) -> Result<Student, SchoolServiceError> {
        self.read(|state| state.login_student(code).cloned())
    }

    pub fn login_admin(&self, code: &str) -> Result<Admin, SchoolServiceError> {
        self.read(|state| state.login_admin(code).cloned())
    }

    pub fn toggle_favorite(
        &self,
        student_id: &str,
        item_id: &str,
    ) -> Result<bool, SchoolServiceError> {
        self.mutate("toggle_favorite", |state| {
            state.toggle_favorite(student_id, item_id)
        })
    }

    pub fn add_to_cart(&self, student_id: &str, item_id: &str) -> Result<(), SchoolServiceError> {
        self.mutate("add_to_cart", |state| state.add_to_cart(student_id, item_id))
    }

    pub fn remove_from_cart(
        &self,
        student_id: &str,
        item_id: &str,
    ) -> Result<(), SchoolServiceError> {
        self.mutate("remove_from_cart", |state| {
            state.remove_from_cart(student_id, item_id)
        })
    }

    pub fn buy_now(
        &self,
        student_id: &str,
        item_id: &str,
        now: NaiveDateTime,
    ) -> Result<PurchaseReceipt, SchoolServiceError> {
        let receipt = self.mutate("buy_now", |state| state.buy_now(student_id, item_id, now))?;
        info!(student_id, item_id, cost = receipt.total_cost, "item purchased");
        Ok(receipt)
    }

    pub fn checkout_cart(
        &self,
        student_id: &str,
        now: NaiveDateTime,
    ) -> Result<PurchaseReceipt, SchoolServiceError> {
        let receipt = self.mutate("checkout_cart", |state| state.checkout_cart(student_id, now))?;
        info!(
            student_id,
            items = receipt.codes.len(),
            cost = receipt.total_cost,
            "cart checked out"
        );
        Ok(receipt)
    }

    pub fn pending_orders(&self) -> Vec<PendingOrder> {
        self.lock().pending_orders()
    }

    pub fn mark_order_ready(
        &self,
        admin_id: &str,
        student_id: &str,
        order_id: &PurchaseId,
        now: NaiveDateTime,
    ) -> Result<String, SchoolServiceError> {
        let message = self.mutate("mark_order_ready", |state| {
            state.mark_order_ready(admin_id, student_id, order_id, now)
        })?;
        info!(student_id, order_id = %order_id, "order ready for pickup");
        Ok(message)
    }

    pub fn request_hall_pass(
        &self,
        student_id: &str,
        kind: HallPassKind,
        now: NaiveDateTime,
    ) -> Result<HallPassRecord, SchoolServiceError> {
        let pass = self.mutate("request_hall_pass", |state| {
            state.request_hall_pass(student_id, kind, now).cloned()
        })?;
        info!(student_id, pass_id = %pass.id, kind = kind.label(), "hall pass issued");
        Ok(pass)
    }

    pub fn return_hall_pass(
        &self,
        pass_id: &str,
        now: NaiveDateTime,
    ) -> Result<HallPassRecord, SchoolServiceError> {
        self.mutate("return_hall_pass", |state| {
            state.return_hall_pass(pass_id, now).cloned()
        })
    }

    pub fn active_hall_passes(&self) -> Vec<HallPassRecord> {
        self.lock()
            .active_hall_passes()
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn add_lockout(
        &self,
        admin_id: &str,
        label: &str,
        start_time: NaiveTime,
        end_time: NaiveTime,
    ) -> Result<TimeLockout, SchoolServiceError> {
        self.mutate("add_lockout", |state| {
            state
                .add_lockout(admin_id, label, start_time, end_time)
                .cloned()
        })
    }

    pub fn remove_lockout(
        &self,
        admin_id: &str,
        lockout_id: &str,
    ) -> Result<bool, SchoolServiceError> {
        self.mutate("remove_lockout", |state| {
            state.remove_lockout(admin_id, lockout_id)
        })
    }

    pub fn add_buddy_conflict(
        &self,
        admin_id: &str,
        first: &str,
        second: &str,
        reason: Option<&str>,
    ) -> Result<BuddyConflict, SchoolServiceError> {
        self.mutate("add_buddy_conflict", |state| {
            state
                .add_buddy_conflict(admin_id, first, second, reason)
                .cloned()
        })
    }

    pub fn remove_buddy_conflict(
        &self,
        admin_id: &str,
        conflict_id: &str,
    ) -> Result<bool, SchoolServiceError> {
        self.mutate("remove_buddy_conflict", |state| {
            state.remove_buddy_conflict(admin_id, conflict_id)
        })
    }

    pub fn create_poll(
        &self,
        admin_id: &str,
        question: &str,
        options: &[String],
        expires_at: Option<NaiveDateTime>,
        now: NaiveDateTime,
    ) -> Result<Poll, SchoolServiceError> {
        self.mutate("create_poll", |state| {
            state
                .create_poll(admin_id, question, options, expires_at, now)
                .cloned()
        })
    }

    pub fn vote(
        &self,
        student_id: &str,
        poll_id: &str,
        option_id: &str,
        now: NaiveDateTime,
    ) -> Result<Poll, SchoolServiceError> {
        self.mutate("vote", |state| {
            state.vote(student_id, poll_id, option_id, now).cloned()
        })
    }

    pub fn active_polls(&self, now: NaiveDateTime) -> Vec<Poll> {
        self.lock().active_polls(now).into_iter().cloned().collect()
    }

    pub fn delete_poll(&self, admin_id: &str, poll_id: &str) -> Result<(), SchoolServiceError> {
        self.mutate("delete_poll", |state| state.delete_poll(admin_id, poll_id))
    }

    pub fn post_announcement(
        &self,
        admin_id: &str,
        title: &str,
        content: &str,
        expires_at: Option<NaiveDateTime>,
        now: NaiveDateTime,
    ) -> Result<Announcement, SchoolServiceError> {
        self.mutate("post_announcement", |state| {
            state
                .post_announcement(admin_id, title, content, expires_at, now)
                .cloned()
        })
    }

    pub fn active_announcements(&self, now: NaiveDateTime) -> Vec<Announcement> {
        self.lock()
            .active_announcements(now)
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn delete_announcement(
        &self,
        admin_id: &str,
        announcement_id: &str,
    ) -> Result<(), SchoolServiceError> {
        self.mutate("delete_announcement", |state| {
            state.delete_announcement(admin_id, announcement_id)
        })
    }

    pub fn notifications(
        &self,
        student_id: &str,
    ) -> Result<Vec<Notification>, SchoolServiceError> {
        self.read(|state| state.notifications(student_id).map(<[Notification]>::to_vec))
    }

    pub fn mark_notifications_read(&self, student_id: &str) -> Result<usize, SchoolServiceError> {
        self.mutate("mark_notifications_read", |state| {
            state.mark_notifications_read(student_id)
        })
    }
}

/// Error raised by the school service.
#[derive(Debug, thiserror::Error)]
pub enum SchoolServiceError {
    #[error(transparent)]
    School(#[from] SchoolError),
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
}
