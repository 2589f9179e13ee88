use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::domain::{Admin, AdminPermission};
use super::state::{record_id, SchoolError, SchoolState};
use crate::rewards::ledger::{AdminBudget, YearMonth};

/// Admin account as entered on the staff management form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminDraft {
    pub name: String,
    pub email: String,
    pub login_code: String,
    #[serde(default)]
    pub permissions: Vec<AdminPermission>,
    /// Points per month; `None` keeps the current limit, or the configured
    /// default for a new admin.
    #[serde(default)]
    pub monthly_award_limit: Option<i64>,
}

impl AdminDraft {
    fn validate(&self) -> Result<(), SchoolError> {
        if [&self.name, &self.email, &self.login_code]
            .iter()
            .any(|field| field.trim().is_empty())
        {
            return Err(SchoolError::MissingAdminDetails);
        }
        if self.monthly_award_limit.is_some_and(|limit| limit < 0) {
            return Err(SchoolError::InvalidAwardLimit);
        }
        Ok(())
    }

    fn permissions(&self) -> Vec<AdminPermission> {
        let mut permissions = Vec::with_capacity(self.permissions.len());
        for permission in &self.permissions {
            if !permissions.contains(permission) {
                permissions.push(*permission);
            }
        }
        permissions
    }
}

impl SchoolState {
    pub fn create_admin(
        &mut self,
        actor_id: &str,
        draft: &AdminDraft,
        default_limit: i64,
        now: NaiveDateTime,
    ) -> Result<&Admin, SchoolError> {
        self.authorized(actor_id, AdminPermission::ManageAdmins)?;
        draft.validate()?;
        let login_code = draft.login_code.trim();
        if self.login_code_taken(login_code, None) {
            return Err(SchoolError::DuplicateLoginCode);
        }

        let limit = draft.monthly_award_limit.unwrap_or(default_limit);
        self.admins.push(Admin {
            id: record_id("adm"),
            name: draft.name.trim().to_string(),
            email: draft.email.trim().to_string(),
            login_code: login_code.to_string(),
            permissions: draft.permissions(),
            budget: AdminBudget::new(limit, YearMonth::of(now.date())),
        });
        self.admins.last().ok_or(SchoolError::AdminNotFound)
    }

    /// Points already awarded this month are kept when the limit changes.
    pub fn update_admin(
        &mut self,
        actor_id: &str,
        admin_id: &str,
        draft: &AdminDraft,
    ) -> Result<&Admin, SchoolError> {
        self.authorized(actor_id, AdminPermission::ManageAdmins)?;
        self.admin(admin_id)?;
        draft.validate()?;
        let login_code = draft.login_code.trim();
        if self.login_code_taken(login_code, Some(admin_id)) {
            return Err(SchoolError::DuplicateLoginCode);
        }

        let permissions = draft.permissions();
        let manager_remains = permissions.contains(&AdminPermission::ManageAdmins)
            || self
                .admins
                .iter()
                .any(|admin| admin.id != admin_id && admin.can(AdminPermission::ManageAdmins));
        if !manager_remains {
            return Err(SchoolError::LastAdminManager);
        }

        let admin = self.admin_mut(admin_id)?;
        admin.name = draft.name.trim().to_string();
        admin.email = draft.email.trim().to_string();
        admin.login_code = login_code.to_string();
        admin.permissions = permissions;
        if let Some(limit) = draft.monthly_award_limit {
            admin.budget.monthly_award_limit = limit;
        }
        Ok(&*admin)
    }

    /// The acting admin holds manage-admins and cannot delete itself, so a
    /// manager always remains.
    pub fn delete_admin(&mut self, actor_id: &str, admin_id: &str) -> Result<(), SchoolError> {
        self.authorized(actor_id, AdminPermission::ManageAdmins)?;
        self.admin(admin_id)?;
        if actor_id == admin_id {
            return Err(SchoolError::CannotDeleteSelf);
        }

        self.admins.retain(|admin| admin.id != admin_id);
        Ok(())
    }
}
