use chrono::{NaiveDateTime, NaiveTime};

use super::domain::{
    AdminPermission, BuddyConflict, HallPassKind, HallPassRecord, HallPassStatus, TimeLockout,
};
use super::state::{record_id, SchoolError, SchoolState};

impl SchoolState {
    /// Issues a pass after the lockout, buddy-conflict and weekly-limit checks, in that order.
    pub fn request_hall_pass(
        &mut self,
        student_id: &str,
        kind: HallPassKind,
        now: NaiveDateTime,
    ) -> Result<&HallPassRecord, SchoolError> {
        let student = self.student(student_id)?;

        if let Some(lockout) = self
            .hall_pass_lockouts
            .iter()
            .find(|lockout| lockout.covers(now.time()))
        {
            return Err(SchoolError::HallPassLockout {
                label: lockout.label.clone(),
                until: lockout.end_time.format("%H:%M").to_string(),
            });
        }

        let partner_out = self
            .hall_pass_conflicts
            .iter()
            .filter_map(|conflict| conflict.partner_of(student_id))
            .any(|partner| {
                self.hall_passes
                    .iter()
                    .any(|pass| pass.student_id == partner && pass.is_active())
            });
        if partner_out {
            return Err(SchoolError::BuddyConflict);
        }

        if student.hall_passes_used >= student.hall_pass_limit {
            return Err(SchoolError::HallPassLimitReached);
        }

        let pass = HallPassRecord {
            id: record_id("HP"),
            student_id: student.id.clone(),
            student_name: student.name.clone(),
            timestamp: now,
            end_time: None,
            kind,
            status: HallPassStatus::Active,
        };
        self.student_mut(student_id)?.hall_passes_used += 1;
        self.hall_passes.push(pass);
        self.hall_passes.last().ok_or(SchoolError::PassNotFound)
    }

    pub fn return_hall_pass(
        &mut self,
        pass_id: &str,
        now: NaiveDateTime,
    ) -> Result<&HallPassRecord, SchoolError> {
        let pass = self
            .hall_passes
            .iter_mut()
            .find(|pass| pass.id == pass_id)
            .ok_or(SchoolError::PassNotFound)?;
        if !pass.is_active() {
            return Err(SchoolError::PassAlreadyReturned);
        }

        pass.status = HallPassStatus::Returned;
        pass.end_time = Some(now);
        Ok(pass)
    }

    pub fn active_hall_passes(&self) -> Vec<&HallPassRecord> {
        self.hall_passes
            .iter()
            .filter(|pass| pass.is_active())
            .collect()
    }

    pub fn add_lockout(
        &mut self,
        admin_id: &str,
        label: &str,
        start_time: NaiveTime,
        end_time: NaiveTime,
    ) -> Result<&TimeLockout, SchoolError> {
        self.authorized(admin_id, AdminPermission::HallPassMonitor)?;
        if label.trim().is_empty() {
            return Err(SchoolError::InvalidLockout);
        }

        self.hall_pass_lockouts.push(TimeLockout {
            id: record_id("lock"),
            label: label.trim().to_string(),
            start_time,
            end_time,
        });
        self.hall_pass_lockouts
            .last()
            .ok_or(SchoolError::InvalidLockout)
    }

    /// Returns whether a lockout with that id existed.
    pub fn remove_lockout(
        &mut self,
        admin_id: &str,
        lockout_id: &str,
    ) -> Result<bool, SchoolError> {
        self.authorized(admin_id, AdminPermission::HallPassMonitor)?;
        let before = self.hall_pass_lockouts.len();
        self.hall_pass_lockouts
            .retain(|lockout| lockout.id != lockout_id);
        Ok(self.hall_pass_lockouts.len() != before)
    }

    pub fn add_buddy_conflict(
        &mut self,
        admin_id: &str,
        first: &str,
        second: &str,
        reason: Option<&str>,
    ) -> Result<&BuddyConflict, SchoolError> {
        self.authorized(admin_id, AdminPermission::HallPassMonitor)?;
        if first == second {
            return Err(SchoolError::InvalidConflict);
        }
        self.student(first)?;
        self.student(second)?;

        let reason = reason
            .map(str::trim)
            .filter(|reason| !reason.is_empty())
            .unwrap_or("Restricted Buddy Group");
        self.hall_pass_conflicts.push(BuddyConflict {
            id: record_id("conf"),
            student_ids: [first.to_string(), second.to_string()],
            reason: reason.to_string(),
        });
        self.hall_pass_conflicts
            .last()
            .ok_or(SchoolError::InvalidConflict)
    }

    pub fn remove_buddy_conflict(
        &mut self,
        admin_id: &str,
        conflict_id: &str,
    ) -> Result<bool, SchoolError> {
        self.authorized(admin_id, AdminPermission::HallPassMonitor)?;
        let before = self.hall_pass_conflicts.len();
        self.hall_pass_conflicts
            .retain(|conflict| conflict.id != conflict_id);
        Ok(self.hall_pass_conflicts.len() != before)
    }
}
