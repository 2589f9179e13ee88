use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::rewards::ledger::AdminBudget;
use crate::rewards::redemption::{PurchaseHolder, PurchaseId, PurchaseRecord, ValidityRegime};

/// Ledger line on a student's account: attendance, awards, deductions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub date: NaiveDate,
    pub present: bool,
    pub points_awarded: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub awarded_by: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    OrderReady,
    General,
    Purchase,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    pub title: String,
    pub message: String,
    pub date: NaiveDateTime,
    #[serde(default)]
    pub read: bool,
    pub kind: NotificationKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub id: String,
    pub login_code: String,
    pub name: String,
    pub email: String,
    pub total_points: i64,
    #[serde(default)]
    pub attendance_history: Vec<AttendanceRecord>,
    #[serde(default)]
    pub purchase_history: Vec<PurchaseRecord>,
    /// Store item ids; an item may appear more than once.
    #[serde(default)]
    pub cart: Vec<String>,
    #[serde(default)]
    pub favorites: Vec<String>,
    /// Newest first.
    #[serde(default)]
    pub notifications: Vec<Notification>,
    pub hall_pass_limit: u32,
    #[serde(default)]
    pub hall_passes_used: u32,
}

impl Student {
    pub fn purchase_mut(&mut self, id: &PurchaseId) -> Option<&mut PurchaseRecord> {
        self.purchase_history
            .iter_mut()
            .find(|record| &record.id == id)
    }

    pub fn has_attendance_on(&self, date: NaiveDate) -> bool {
        self.attendance_history
            .iter()
            .any(|record| record.date == date)
    }

    pub fn unread_notifications(&self) -> usize {
        self.notifications.iter().filter(|n| !n.read).count()
    }

    pub(crate) fn notify(&mut self, notification: Notification) {
        self.notifications.insert(0, notification);
    }
}

impl PurchaseHolder for Student {
    fn holder_id(&self) -> &str {
        &self.id
    }

    fn purchases(&self) -> &[PurchaseRecord] {
        &self.purchase_history
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AdminPermission {
    Attendance,
    Calendar,
    Store,
    Scanner,
    StudentDirectory,
    Orders,
    ManageAdmins,
    PointCheckout,
    HallPassMonitor,
    AwardPoints,
    PollsAnnouncements,
    EventCheckin,
}

impl AdminPermission {
    pub const ALL: [AdminPermission; 12] = [
        AdminPermission::Attendance,
        AdminPermission::Calendar,
        AdminPermission::Store,
        AdminPermission::Scanner,
        AdminPermission::StudentDirectory,
        AdminPermission::Orders,
        AdminPermission::ManageAdmins,
        AdminPermission::PointCheckout,
        AdminPermission::HallPassMonitor,
        AdminPermission::AwardPoints,
        AdminPermission::PollsAnnouncements,
        AdminPermission::EventCheckin,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            AdminPermission::Attendance => "attendance",
            AdminPermission::Calendar => "calendar",
            AdminPermission::Store => "store",
            AdminPermission::Scanner => "scanner",
            AdminPermission::StudentDirectory => "student-directory",
            AdminPermission::Orders => "orders",
            AdminPermission::ManageAdmins => "manage-admins",
            AdminPermission::PointCheckout => "point-checkout",
            AdminPermission::HallPassMonitor => "hall-pass-monitor",
            AdminPermission::AwardPoints => "award-points",
            AdminPermission::PollsAnnouncements => "polls-announcements",
            AdminPermission::EventCheckin => "event-checkin",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Admin {
    pub id: String,
    pub name: String,
    pub email: String,
    pub login_code: String,
    pub permissions: Vec<AdminPermission>,
    #[serde(flatten)]
    pub budget: AdminBudget,
}

impl Admin {
    pub fn can(&self, permission: AdminPermission) -> bool {
        self.permissions.contains(&permission)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreItem {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub cost: i64,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_days: Option<u32>,
    #[serde(default)]
    pub requires_fulfillment: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_barcode: Option<String>,
    #[serde(default)]
    pub hall_pass_increase: u32,
}

impl StoreItem {
    pub fn regime(&self) -> ValidityRegime {
        ValidityRegime::for_item(
            &self.category,
            self.duration_days,
            self.start_date,
            self.end_date,
            self.expiration_date,
        )
    }

    /// Record handed to the buyer; the regime is frozen from the item here.
    pub fn issue(&self, id: PurchaseId, now: NaiveDateTime) -> PurchaseRecord {
        PurchaseRecord {
            id,
            date: now,
            item_name: self.name.clone(),
            cost: self.cost,
            category: self.category.clone(),
            image: self.image.clone(),
            redeemed: false,
            regime: self.regime(),
            fulfillment: self
                .requires_fulfillment
                .then_some(crate::rewards::redemption::FulfillmentStatus::Pending),
            external_barcode: self.external_barcode.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HallPassKind {
    Restroom,
    Library,
    Nurse,
    Office,
    Other,
}

impl HallPassKind {
    pub const fn label(self) -> &'static str {
        match self {
            HallPassKind::Restroom => "Restroom",
            HallPassKind::Library => "Library",
            HallPassKind::Nurse => "Nurse",
            HallPassKind::Office => "Office",
            HallPassKind::Other => "Other",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HallPassStatus {
    Active,
    Returned,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HallPassRecord {
    pub id: String,
    pub student_id: String,
    pub student_name: String,
    pub timestamp: NaiveDateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<NaiveDateTime>,
    pub kind: HallPassKind,
    pub status: HallPassStatus,
}

impl HallPassRecord {
    pub fn is_active(&self) -> bool {
        self.status == HallPassStatus::Active
    }
}

/// Daily window during which students cannot request hall passes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeLockout {
    pub id: String,
    pub label: String,
    #[serde(with = "clock")]
    pub start_time: NaiveTime,
    #[serde(with = "clock")]
    pub end_time: NaiveTime,
}

impl TimeLockout {
    /// Compared at minute precision, both ends inclusive.
    pub fn covers(&self, at: NaiveTime) -> bool {
        let minute = NaiveTime::from_hms_opt(at.hour(), at.minute(), 0).unwrap_or(at);
        self.start_time <= minute && minute <= self.end_time
    }
}

/// Two students who may not be out of class at the same time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuddyConflict {
    pub id: String,
    pub student_ids: [String; 2],
    pub reason: String,
}

impl BuddyConflict {
    pub fn partner_of(&self, student_id: &str) -> Option<&str> {
        match &self.student_ids {
            [a, b] if a == student_id => Some(b.as_str()),
            [a, b] if b == student_id => Some(a.as_str()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollOption {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub votes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Poll {
    pub id: String,
    pub question: String,
    pub options: Vec<PollOption>,
    pub created_at: NaiveDateTime,
    pub expires_at: NaiveDateTime,
    pub active: bool,
    pub created_by: String,
}

impl Poll {
    pub fn has_voted(&self, student_id: &str) -> bool {
        self.options
            .iter()
            .any(|option| option.votes.iter().any(|voter| voter == student_id))
    }

    pub fn is_open(&self, now: NaiveDateTime) -> bool {
        self.active && now < self.expires_at
    }

    pub fn total_votes(&self) -> usize {
        self.options.iter().map(|option| option.votes.len()).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Announcement {
    pub id: String,
    pub title: String,
    pub content: String,
    pub created_at: NaiveDateTime,
    pub expires_at: NaiveDateTime,
    pub active: bool,
    pub created_by: String,
}

impl Announcement {
    pub fn is_visible(&self, now: NaiveDateTime) -> bool {
        self.active && now < self.expires_at
    }
}

/// Gate check-in session for a school event; each student is rewarded once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventSession {
    pub id: String,
    pub name: String,
    pub reward_points: i64,
    pub opened_by: String,
    #[serde(default)]
    pub checked_in: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupKind {
    #[default]
    Class,
    Team,
    Club,
    Other,
}

/// Named set of students staff can select together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentGroup {
    pub id: String,
    pub name: String,
    pub kind: GroupKind,
    #[serde(default)]
    pub student_ids: Vec<String>,
}

mod clock {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%H:%M";

    pub(super) fn serialize<S>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(&time.format(FORMAT))
    }

    pub(super) fn deserialize<'de, D>(deserializer: D) -> Result<NaiveTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(raw.trim(), FORMAT).map_err(serde::de::Error::custom)
    }
}
