use std::io::Read;

use chrono::NaiveDateTime;
use serde::Serialize;

use super::domain::{Admin, AdminPermission, Student};
use super::state::{login_code, record_id, SchoolError, SchoolState};
use crate::rewards::redemption::{PurchaseId, PurchaseRecord};

/// Outcome of a roster CSV upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RosterImport {
    pub added: Vec<String>,
    pub duplicates: usize,
}

impl RosterImport {
    pub fn message(&self) -> String {
        if self.added.is_empty() {
            return "No new students added. Ensure CSV format is \"Name, Email\".".to_string();
        }

        let mut message = format!("Successfully added {} new students.", self.added.len());
        if self.duplicates > 0 {
            message.push_str(&format!(" Skipped {} duplicates.", self.duplicates));
        }
        message
    }
}

impl SchoolState {
    /// Enrolls a student with a fresh login code and the free athletic pass.
    pub fn add_student(
        &mut self,
        name: &str,
        email: &str,
        hall_pass_limit: u32,
        now: NaiveDateTime,
    ) -> Result<&Student, SchoolError> {
        let (name, email) = (name.trim(), email.trim());
        if name.is_empty() || email.is_empty() {
            return Err(SchoolError::MissingStudentDetails);
        }
        if self.has_email(email) {
            return Err(SchoolError::DuplicateEmail);
        }

        let student = self.new_student(name, email, hall_pass_limit, now);
        self.students.push(student);
        self.students.last().ok_or(SchoolError::StudentNotFound)
    }

    /// Imports `Name,Email` rows; a leading `Name,Email` header is skipped and
    /// addresses already on the roster (case-insensitive) are counted as duplicates.
    pub fn import_roster<R: Read>(
        &mut self,
        reader: R,
        hall_pass_limit: u32,
        now: NaiveDateTime,
    ) -> Result<RosterImport, SchoolError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut rows = Vec::new();
        for (index, record) in csv_reader.records().enumerate() {
            let record = record?;
            let (Some(name), Some(email)) = (record.get(0), record.get(1)) else {
                continue;
            };
            if index == 0
                && name.eq_ignore_ascii_case("name")
                && email.eq_ignore_ascii_case("email")
            {
                continue;
            }
            if !name.is_empty() && !email.is_empty() {
                rows.push((name.to_string(), email.to_string()));
            }
        }

        let mut summary = RosterImport {
            added: Vec::new(),
            duplicates: 0,
        };
        for (name, email) in rows {
            if self.has_email(&email) {
                summary.duplicates += 1;
                continue;
            }
            let student = self.new_student(&name, &email, hall_pass_limit, now);
            summary.added.push(student.id.clone());
            self.students.push(student);
        }

        Ok(summary)
    }

    /// Moves the selected students to the recently deleted list and drops them
    /// from groups and buddy conflicts. One unknown id rejects the whole batch.
    pub fn delete_students(
        &mut self,
        admin_id: &str,
        student_ids: &[String],
    ) -> Result<usize, SchoolError> {
        self.authorized(admin_id, AdminPermission::StudentDirectory)?;
        if student_ids.is_empty() {
            return Err(SchoolError::NoStudentsSelected);
        }
        for id in student_ids {
            self.student(id)?;
        }

        let selected = |id: &String| student_ids.contains(id);
        let (removed, kept): (Vec<Student>, Vec<Student>) = std::mem::take(&mut self.students)
            .into_iter()
            .partition(|student| selected(&student.id));
        self.students = kept;

        for group in &mut self.groups {
            group.student_ids.retain(|id| !selected(id));
        }
        self.hall_pass_conflicts
            .retain(|conflict| !conflict.student_ids.iter().any(selected));

        let count = removed.len();
        let older = std::mem::replace(&mut self.deleted_students, removed);
        self.deleted_students.extend(older);
        Ok(count)
    }

    /// Brings a deleted student back; a login code reused since then is replaced.
    pub fn restore_student(
        &mut self,
        admin_id: &str,
        student_id: &str,
    ) -> Result<&Student, SchoolError> {
        self.authorized(admin_id, AdminPermission::StudentDirectory)?;
        let index = self
            .deleted_students
            .iter()
            .position(|student| student.id == student_id)
            .ok_or(SchoolError::StudentNotFound)?;
        if self.has_email(&self.deleted_students[index].email) {
            return Err(SchoolError::DuplicateEmail);
        }

        let mut student = self.deleted_students.remove(index);
        if self.login_code_taken(&student.login_code, None) {
            student.login_code = self.unused_login_code();
        }
        self.students.push(student);
        self.students.last().ok_or(SchoolError::StudentNotFound)
    }

    pub fn login_student(&self, code: &str) -> Result<&Student, SchoolError> {
        self.students
            .iter()
            .find(|student| student.login_code == code.trim())
            .ok_or(SchoolError::InvalidAccessCode)
    }

    pub fn login_admin(&self, code: &str) -> Result<&Admin, SchoolError> {
        self.admins
            .iter()
            .find(|admin| admin.login_code == code.trim())
            .ok_or(SchoolError::InvalidAdminCode)
    }

    fn has_email(&self, email: &str) -> bool {
        let email = email.to_lowercase();
        self.students
            .iter()
            .any(|student| student.email.to_lowercase() == email)
    }

    fn new_student(
        &self,
        name: &str,
        email: &str,
        hall_pass_limit: u32,
        now: NaiveDateTime,
    ) -> Student {
        let athletic_pass = PurchaseRecord::athletic_pass(PurchaseId(record_id("ATH")), now);

        Student {
            id: record_id("stu"),
            login_code: self.unused_login_code(),
            name: name.to_string(),
            email: email.to_string(),
            total_points: 0,
            attendance_history: Vec::new(),
            purchase_history: vec![athletic_pass],
            cart: Vec::new(),
            favorites: Vec::new(),
            notifications: Vec::new(),
            hall_pass_limit,
            hall_passes_used: 0,
        }
    }

    fn unused_login_code(&self) -> String {
        loop {
            let code = login_code();
            if !self.login_code_taken(&code, None) {
                return code;
            }
        }
    }
}
